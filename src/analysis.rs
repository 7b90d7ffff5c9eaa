//! Complexity report assembly.
//!
//! One pass detects violations over the (optionally filtered) fragment set;
//! a second pass enriches only the files that violated with dependency data
//! and produces per-file risk. Enrichment queries are independent of each
//! other and run on the rayon pool over the shared index.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::complexity::{scan_fragments, Severity, Violation};
use crate::dependents::{find_dependents_with, DependentComplexity, DependentsOptions};
use crate::import_index::ImportIndex;
use crate::paths::{matches_file, PathNormalizer};
use crate::risk::RiskLevel;
use crate::schema::CodeFragment;

// ========== Report Types ==========

/// Aggregate numbers for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexitySummary {
    pub files_analyzed: usize,
    pub functions_checked: usize,
    pub total_violations: usize,
    pub warnings: usize,
    pub errors: usize,
    /// Mean cyclomatic complexity over every checked function, not just
    /// the violating ones.
    pub average_complexity: f64,
    pub max_complexity: f64,
    /// RFC 3339 timestamp of the run.
    pub generated_at: String,
}

/// Violations and dependency context for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileComplexityRecord {
    pub file_path: String,
    pub violations: Vec<Violation>,
    /// Production files importing this one, sorted.
    pub dependent_files: Vec<String>,
    pub dependent_count: usize,
    /// Test files importing this one, sorted.
    pub test_files: Vec<String>,
    /// File-local risk boosted by the dependency signals.
    pub risk: RiskLevel,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dependent_complexity: Option<DependentComplexity>,
}

/// Full result of [`analyze_complexity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityReport {
    pub summary: ComplexitySummary,
    /// One record per file with violations, sorted by path.
    pub files: Vec<FileComplexityRecord>,
}

// ========== Assembly ==========

/// Whether a canonical path passes the file filter: exact match, directory
/// prefix, or fuzzy path equivalence.
fn passes_filter(canonical: &str, filter: Option<&str>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    canonical == filter
        || canonical.starts_with(&format!("{}/", filter))
        || matches_file(filter, canonical)
}

/// Analyze complexity against prepared parts. `file_filter` narrows which
/// fragments are checked; dependents still resolve against the whole
/// snapshot behind `index`.
pub fn analyze_complexity_with(
    index: &ImportIndex,
    normalizer: &PathNormalizer,
    fragments: &[CodeFragment],
    file_filter: Option<&str>,
) -> ComplexityReport {
    let filter = file_filter.map(|f| normalizer.normalize(f));
    let filtered: Vec<CodeFragment> = fragments
        .iter()
        .filter(|fragment| {
            passes_filter(&normalizer.normalize(&fragment.file_path), filter.as_deref())
        })
        .cloned()
        .collect();

    let mut analyzed_files: BTreeSet<String> = BTreeSet::new();
    for fragment in &filtered {
        analyzed_files.insert(normalizer.normalize(&fragment.file_path));
    }

    let scan = scan_fragments(&filtered);
    let warnings = scan
        .violations
        .iter()
        .filter(|v| v.severity == Severity::Warning)
        .count();
    let errors = scan.violations.len() - warnings;
    let total_violations = scan.violations.len();

    // Group violations by canonical file.
    let mut by_file: BTreeMap<String, Vec<Violation>> = BTreeMap::new();
    for violation in scan.violations {
        by_file
            .entry(normalizer.normalize(&violation.file_path))
            .or_default()
            .push(violation);
    }

    debug!(
        files = analyzed_files.len(),
        violating = by_file.len(),
        "enriching violating files with dependency data"
    );

    // Only violating files pay for the dependency query.
    let options = DependentsOptions::default();
    let mut files: Vec<FileComplexityRecord> = by_file
        .into_par_iter()
        .map(|(file_path, violations)| {
            let dependents = find_dependents_with(index, normalizer, &file_path, &options);
            let file_errors = violations
                .iter()
                .filter(|v| v.severity == Severity::Error)
                .count();
            let local = RiskLevel::from_violation_counts(violations.len(), file_errors);
            let risk = local.boost(dependents.risk);
            FileComplexityRecord {
                file_path,
                violations,
                dependent_files: dependents.dependent_files,
                dependent_count: dependents.production_count,
                test_files: dependents.test_files,
                risk,
                dependent_complexity: dependents.complexity,
            }
        })
        .collect();
    files.sort_by(|a, b| a.file_path.cmp(&b.file_path));

    ComplexityReport {
        summary: ComplexitySummary {
            files_analyzed: analyzed_files.len(),
            functions_checked: scan.functions_checked,
            total_violations,
            warnings,
            errors,
            average_complexity: scan.average_cyclomatic,
            max_complexity: scan.max_cyclomatic,
            generated_at: Utc::now().to_rfc3339(),
        },
        files,
    }
}

/// One-shot entry: builds the normalizer and index, then runs the analysis.
pub fn analyze_complexity(
    fragments: &[CodeFragment],
    workspace_root: &str,
    file_filter: Option<&str>,
) -> ComplexityReport {
    let normalizer = PathNormalizer::new(workspace_root);
    let index = ImportIndex::build(fragments, &normalizer);
    analyze_complexity_with(&index, &normalizer, fragments, file_filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FragmentKind;

    fn hot_function(file: &str, cyclomatic: u32) -> CodeFragment {
        CodeFragment::new(file, 10, 80, FragmentKind::Function)
            .with_symbol("hot")
            .with_cyclomatic(cyclomatic)
    }

    fn importer(file: &str, import: &str) -> CodeFragment {
        CodeFragment::new(file, 1, 8, FragmentKind::Function)
            .with_symbol("caller")
            .with_imports(&[import])
    }

    #[test]
    fn test_clean_snapshot_produces_empty_file_list() {
        let fragments = vec![hot_function("src/a.ts", 3), hot_function("src/b.ts", 5)];
        let report = analyze_complexity(&fragments, "", None);
        assert!(report.files.is_empty());
        assert_eq!(report.summary.files_analyzed, 2);
        assert_eq!(report.summary.functions_checked, 2);
        assert_eq!(report.summary.total_violations, 0);
        assert_eq!(report.summary.max_complexity, 5.0);
    }

    #[test]
    fn test_violating_file_is_enriched_with_dependents() {
        let fragments = vec![
            hot_function("src/core.ts", 30),
            importer("src/app.ts", "./core"),
            importer("tests/core.test.ts", "../src/core"),
        ];
        let report = analyze_complexity(&fragments, "", None);

        assert_eq!(report.files.len(), 1);
        let record = &report.files[0];
        assert_eq!(record.file_path, "src/core.ts");
        assert_eq!(record.violations.len(), 1);
        assert_eq!(record.dependent_files, vec!["src/app.ts"]);
        assert_eq!(record.dependent_count, 1);
        assert_eq!(record.test_files, vec!["tests/core.test.ts"]);
        // One error-severity violation is high on its own.
        assert_eq!(record.risk, RiskLevel::High);
    }

    #[test]
    fn test_dependent_count_boosts_local_risk() {
        let mut fragments = vec![hot_function("src/core.ts", 15)];
        for i in 0..7 {
            fragments.push(importer(&format!("src/use{}.ts", i), "./core"));
        }
        let report = analyze_complexity(&fragments, "", None);

        let record = &report.files[0];
        // A lone warning is low; seven dependents lift the file to medium.
        assert_eq!(record.violations.len(), 1);
        assert_eq!(record.dependent_count, 7);
        assert_eq!(record.risk, RiskLevel::Medium);
    }

    #[test]
    fn test_boost_never_lowers_local_risk() {
        let fragments = vec![
            hot_function("src/core.ts", 31),
            CodeFragment::new("src/core.ts", 100, 160, FragmentKind::Function)
                .with_symbol("hotter")
                .with_cyclomatic(32),
            CodeFragment::new("src/core.ts", 200, 260, FragmentKind::Function)
                .with_symbol("hottest")
                .with_cyclomatic(33),
        ];
        // Three errors and zero dependents: critical stays critical.
        let report = analyze_complexity(&fragments, "", None);
        let record = &report.files[0];
        assert_eq!(record.violations.len(), 3);
        assert_eq!(record.risk, RiskLevel::Critical);
        assert!(record.dependent_files.is_empty());
    }

    #[test]
    fn test_file_filter_narrows_scan_but_not_dependents() {
        let fragments = vec![
            hot_function("src/core.ts", 30),
            hot_function("src/other.ts", 30),
            importer("src/app.ts", "./core"),
        ];
        let report = analyze_complexity(&fragments, "", Some("src/core.ts"));

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].file_path, "src/core.ts");
        // Dependents come from the whole snapshot even under a filter.
        assert_eq!(report.files[0].dependent_files, vec!["src/app.ts"]);
        assert_eq!(report.summary.files_analyzed, 1);
    }

    #[test]
    fn test_directory_filter() {
        let fragments = vec![
            hot_function("src/inner/core.ts", 30),
            hot_function("lib/other.ts", 30),
        ];
        let report = analyze_complexity(&fragments, "", Some("src"));
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].file_path, "src/inner/core.ts");
    }

    #[test]
    fn test_fuzzy_filter_matches_extensionless_spelling() {
        let fragments = vec![hot_function("src/core.ts", 30)];
        let report = analyze_complexity(&fragments, "", Some("src/core"));
        assert_eq!(report.files.len(), 1);
    }

    #[test]
    fn test_summary_counts_by_severity() {
        let fragments = vec![
            hot_function("src/a.ts", 16),
            hot_function("src/b.ts", 30),
            hot_function("src/c.ts", 2),
        ];
        let report = analyze_complexity(&fragments, "", None);
        assert_eq!(report.summary.warnings, 1);
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.summary.total_violations, 2);
        assert_eq!(report.summary.functions_checked, 3);
        assert!((report.summary.average_complexity - 16.0).abs() < f64::EPSILON);
        assert!(!report.summary.generated_at.is_empty());
    }

    #[test]
    fn test_records_sorted_by_path() {
        let fragments = vec![
            hot_function("src/zeta.ts", 30),
            hot_function("src/alpha.ts", 30),
        ];
        let report = analyze_complexity(&fragments, "", None);
        assert_eq!(report.files[0].file_path, "src/alpha.ts");
        assert_eq!(report.files[1].file_path, "src/zeta.ts");
    }
}
