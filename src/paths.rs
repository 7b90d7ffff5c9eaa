//! Canonical path handling: normalization, relative-import resolution, and
//! fuzzy file matching.
//!
//! Every graph key in this crate is a canonical path: workspace-relative,
//! forward slashes, no leading slash, `.`/`..` segments collapsed. The
//! normalizer memoizes per input string because traversal normalizes the same
//! handful of paths over and over.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Extensions the engine recognizes as code files. Used both to tell file
/// roots from directory roots and to strip extensions for fuzzy matching.
const CODE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "rs", "py", "pyi", "go", "java", "kt", "c", "h",
    "cpp", "cc", "hpp", "cs", "rb", "php", "swift", "scala", "vue", "svelte",
];

/// Directory segments that mark a path as test code.
const TEST_DIR_SEGMENTS: &[&str] = &[
    "test",
    "tests",
    "__tests__",
    "spec",
    "specs",
    "fixtures",
    "testdata",
];

// ========== Normalizer ==========

/// Workspace-scoped path normalizer with a per-run memo table.
///
/// Construct one per analysis run and pass it by reference to every component
/// that touches paths; there is no process-global instance.
pub struct PathNormalizer {
    workspace_root: String,
    memo: RwLock<HashMap<String, String>>,
}

impl PathNormalizer {
    pub fn new(workspace_root: &str) -> Self {
        let workspace_root = workspace_root
            .replace('\\', "/")
            .trim_end_matches('/')
            .to_string();
        Self {
            workspace_root,
            memo: RwLock::new(HashMap::new()),
        }
    }

    /// Canonicalize a raw path: forward slashes, workspace prefix stripped,
    /// `.`/`..` collapsed, no leading slash. Deterministic and memoized.
    pub fn normalize(&self, path: &str) -> String {
        if let Some(hit) = self.memo.read().get(path) {
            return hit.clone();
        }
        let canonical = canonicalize(path, &self.workspace_root);
        self.memo
            .write()
            .insert(path.to_string(), canonical.clone());
        canonical
    }

    /// Resolve a `./` or `../` import against the importing file's directory.
    ///
    /// Returns `None` for anything else (bare package names, root-relative or
    /// absolute specifiers): those are external references, excluded from the
    /// graph without error.
    pub fn resolve_relative_import(&self, raw_import: &str, source_file: &str) -> Option<String> {
        let raw = raw_import.replace('\\', "/");
        if !raw.starts_with("./") && !raw.starts_with("../") {
            return None;
        }
        let source = self.normalize(source_file);
        let dir = parent_dir(&source);
        let joined = if dir.is_empty() {
            raw
        } else {
            format!("{}/{}", dir, raw)
        };
        Some(collapse_segments(&joined))
    }
}

fn canonicalize(path: &str, workspace_root: &str) -> String {
    let mut p = path.replace('\\', "/");
    if !workspace_root.is_empty() {
        if p == workspace_root {
            p.clear();
        } else if let Some(rest) = p.strip_prefix(workspace_root) {
            if let Some(rest) = rest.strip_prefix('/') {
                p = rest.to_string();
            }
        }
    }
    collapse_segments(&p)
}

/// Lexical `.`/`..` collapse. A `..` that would escape the workspace root is
/// dropped rather than preserved.
fn collapse_segments(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            seg => out.push(seg),
        }
    }
    out.join("/")
}

/// Containing directory of a canonical path ("" for root-level files).
pub fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

// ========== Fuzzy matching ==========

/// Fuzzy path equivalence: exact, or one side is a whole-segment suffix of
/// the other once code extensions and a trailing `/index` segment are
/// stripped. Tolerates extension-less imports and index-file conventions.
pub fn matches_file(candidate: &str, target: &str) -> bool {
    if candidate == target {
        return true;
    }
    let a = strip_for_match(candidate);
    let b = strip_for_match(target);
    if a == b {
        return true;
    }
    is_segment_suffix(a, b) || is_segment_suffix(b, a)
}

/// True when `shorter` matches the tail of `longer` at a `/` boundary.
fn is_segment_suffix(longer: &str, shorter: &str) -> bool {
    if shorter.is_empty() || longer.len() <= shorter.len() || !longer.ends_with(shorter) {
        return false;
    }
    longer.as_bytes()[longer.len() - shorter.len() - 1] == b'/'
}

fn strip_for_match(path: &str) -> &str {
    let stem = strip_code_extension(path);
    stem.strip_suffix("/index").unwrap_or(stem)
}

fn strip_code_extension(path: &str) -> &str {
    if let Some((stem, ext)) = path.rsplit_once('.') {
        if !ext.contains('/') && CODE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)) {
            return stem;
        }
    }
    path
}

// ========== Classification ==========

/// Whether the path ends in a recognized code-file extension. Roots without
/// one are treated as directories and expanded before traversal.
pub fn has_code_extension(path: &str) -> bool {
    match path.rsplit_once('.') {
        Some((_, ext)) if !ext.contains('/') => {
            CODE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e))
        }
        _ => false,
    }
}

/// Test-file heuristic shared by traversal, dependent counting, and the
/// test-association listing. Checks directory segments first, then file name
/// conventions (`.test.` / `.spec.` infixes, `test_` prefix, `_test` stem
/// suffix, `conftest`).
pub fn is_test_file(path: &str) -> bool {
    let lower = path.replace('\\', "/").to_ascii_lowercase();
    let mut segments = lower.split('/').peekable();
    let mut file_name = "";
    while let Some(seg) = segments.next() {
        if segments.peek().is_none() {
            file_name = seg;
        } else if TEST_DIR_SEGMENTS.contains(&seg) {
            return true;
        }
    }
    if file_name.contains(".test.") || file_name.contains(".spec.") {
        return true;
    }
    if file_name.starts_with("test_") {
        return true;
    }
    let stem = strip_code_extension(file_name);
    stem.ends_with("_test") || stem == "conftest"
}
