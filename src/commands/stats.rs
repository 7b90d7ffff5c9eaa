//! Stats command handler - snapshot overview for index sanity checks

use std::collections::{BTreeMap, BTreeSet};

use serde_json::json;

use crate::commands::CommandContext;
use crate::error::Result;
use crate::paths::{is_test_file, PathNormalizer};

/// Run the stats command: counts by file, language, kind, and repo.
pub fn run_stats(ctx: &CommandContext) -> Result<String> {
    let snapshot = ctx.load_snapshot()?;
    let normalizer = PathNormalizer::new(&ctx.workspace_root);

    let mut files: BTreeSet<String> = BTreeSet::new();
    let mut test_files: BTreeSet<String> = BTreeSet::new();
    let mut by_language: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
    let mut repos: BTreeSet<String> = BTreeSet::new();
    let mut import_references = 0usize;

    for fragment in &snapshot.fragments {
        let canonical = normalizer.normalize(&fragment.file_path);
        if is_test_file(&canonical) {
            test_files.insert(canonical.clone());
        }
        files.insert(canonical);

        let language = fragment
            .language
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        *by_language.entry(language).or_insert(0) += 1;
        *by_kind.entry(fragment.kind.as_str().to_string()).or_insert(0) += 1;
        if let Some(repo) = &fragment.repo {
            repos.insert(repo.clone());
        }
        import_references += fragment.imports.len();
    }

    let report = json!({
        "fragments": snapshot.fragments.len(),
        "files": files.len(),
        "test_files": test_files.len(),
        "import_references": import_references,
        "by_language": by_language,
        "by_kind": by_kind,
        "repos": repos,
        "truncated": snapshot.truncated,
        "skipped_records": snapshot.skipped,
    });

    ctx.render(&report, &snapshot)
}
