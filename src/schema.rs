//! Fragment data model shared by the index, graph, and complexity engines.
//!
//! Fragments arrive from an external scanner as duck-typed records (optional
//! fields, placeholder empty-array encodings, occasionally inverted line
//! ranges depending on the backend). Everything is normalized once at the
//! storage boundary via [`CodeFragment::normalized`] so the core can rely on
//! clean collections.

use serde::{Deserialize, Serialize};

/// Schema version for snapshot compatibility checks.
pub const SCHEMA_VERSION: &str = "1";

// ========== Fragment Kinds ==========

/// Symbol kind attached to a fragment by the scanner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    Function,
    Method,
    Class,
    Interface,
    /// Catch-all for top-level statements and unrecognized shapes.
    #[default]
    Block,
}

impl FragmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::Function => "function",
            FragmentKind::Method => "method",
            FragmentKind::Class => "class",
            FragmentKind::Interface => "interface",
            FragmentKind::Block => "block",
        }
    }

    /// Kinds that carry per-symbol complexity worth checking.
    pub fn is_callable(&self) -> bool {
        matches!(self, FragmentKind::Function | FragmentKind::Method)
    }
}

// ========== Complexity Numbers ==========

/// Halstead measures as produced by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HalsteadMetrics {
    pub volume: f64,
    pub difficulty: f64,
    /// Raw effort (E = D × V); divide by 1080 for minutes.
    pub effort: f64,
    /// Estimated delivered bugs (B = V / 3000).
    pub bugs: f64,
}

/// Per-fragment complexity numbers. All optional: scanners differ in what
/// they compute, and block fragments usually carry nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexityNumbers {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cyclomatic: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cognitive: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub halstead: Option<HalsteadMetrics>,
}

// ========== Code Fragment ==========

/// One indexed unit of code ("chunk") with location and metadata.
///
/// Immutable once loaded; an analysis run operates on a fixed snapshot of
/// these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeFragment {
    /// File path as recorded by the scanner (canonicalized lazily by the
    /// path normalizer, not here).
    pub file_path: String,

    /// 1-based inclusive start line.
    pub start_line: u32,

    /// 1-based inclusive end line.
    pub end_line: u32,

    /// Symbol name, when the fragment maps to a named declaration.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub symbol: Option<String>,

    /// Symbol kind; defaults to `block` for unrecognized records.
    #[serde(default)]
    pub kind: FragmentKind,

    /// Source language name, when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub language: Option<String>,

    /// Raw import references exactly as written in source, unresolved.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub imports: Vec<String>,

    /// Exported symbol names.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub exports: Vec<String>,

    /// Complexity numbers, when the scanner computed them.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub complexity: Option<ComplexityNumbers>,

    /// Repository tag for multi-repository snapshots.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub repo: Option<String>,
}

impl CodeFragment {
    pub fn new(file_path: &str, start_line: u32, end_line: u32, kind: FragmentKind) -> Self {
        Self {
            file_path: file_path.to_string(),
            start_line,
            end_line,
            symbol: None,
            kind,
            language: None,
            imports: Vec::new(),
            exports: Vec::new(),
            complexity: None,
            repo: None,
        }
    }

    pub fn with_symbol(mut self, symbol: &str) -> Self {
        self.symbol = Some(symbol.to_string());
        self
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    pub fn with_imports(mut self, imports: &[&str]) -> Self {
        self.imports = imports.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_exports(mut self, exports: &[&str]) -> Self {
        self.exports = exports.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_cyclomatic(mut self, cyclomatic: u32) -> Self {
        self.complexity.get_or_insert_with(Default::default).cyclomatic = Some(cyclomatic);
        self
    }

    pub fn with_cognitive(mut self, cognitive: u32) -> Self {
        self.complexity.get_or_insert_with(Default::default).cognitive = Some(cognitive);
        self
    }

    pub fn with_halstead(mut self, halstead: HalsteadMetrics) -> Self {
        self.complexity.get_or_insert_with(Default::default).halstead = Some(halstead);
        self
    }

    pub fn with_repo(mut self, repo: &str) -> Self {
        self.repo = Some(repo.to_string());
        self
    }

    /// Synthetic identity: two index hits with the same file and line range
    /// are the same fragment regardless of which lookup path found them.
    pub fn synthetic_id(&self) -> String {
        format!("{}:{}-{}", self.file_path, self.start_line, self.end_line)
    }

    /// Dedupe key for complexity checks; includes the repo tag so identical
    /// paths in different repositories stay distinct.
    pub fn dedupe_key(&self) -> String {
        format!(
            "{}|{}:{}-{}",
            self.repo.as_deref().unwrap_or(""),
            self.file_path,
            self.start_line,
            self.end_line
        )
    }

    /// Line range in display form ("12-48").
    pub fn line_range(&self) -> String {
        format!("{}-{}", self.start_line, self.end_line)
    }

    /// Cyclomatic complexity, when present.
    pub fn cyclomatic(&self) -> Option<u32> {
        self.complexity.and_then(|c| c.cyclomatic)
    }

    /// Storage-boundary cleanup: drop placeholder empty-string entries that
    /// some backends emit for "no imports", and repair inverted line ranges.
    pub fn normalized(mut self) -> Self {
        self.imports.retain(|i| !i.trim().is_empty());
        self.exports.retain(|e| !e.trim().is_empty());
        if self.end_line < self.start_line {
            std::mem::swap(&mut self.start_line, &mut self.end_line);
        }
        if let Some(s) = &self.symbol {
            if s.trim().is_empty() {
                self.symbol = None;
            }
        }
        self
    }
}

// ========== Hashing ==========

/// FNV-1a hash for stable, dependency-free id derivation.
pub fn fnv1a_hash(data: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    let mut hash = FNV_OFFSET;
    for byte in data.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
