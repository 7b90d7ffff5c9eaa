//! The "find dependents" primitive: who imports a given file, how much of
//! that is production versus test code, and how risky the blast radius is.
//!
//! One query is one index lookup (exact plus the documented fuzzy fallback),
//! not a traversal, so it needs no visited-set and parallel queries over a
//! shared index are safe.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::import_index::ImportIndex;
use crate::paths::{is_test_file, PathNormalizer};
use crate::risk::RiskLevel;
use crate::schema::{CodeFragment, FragmentKind};

/// Options for a dependents query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentsOptions {
    /// Include test files in the dependent list and counts.
    #[serde(default)]
    pub include_tests: bool,
    /// Look across repository tags in a multi-repo snapshot. Without it the
    /// query is scoped to the target's own repository.
    #[serde(default)]
    pub cross_repo: bool,
}

/// One dependent fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependentInfo {
    pub file_path: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub symbol: Option<String>,
    pub kind: FragmentKind,
    pub lines: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cyclomatic: Option<u32>,
    #[serde(default)]
    pub is_test: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub repo: Option<String>,
}

/// Average and max cyclomatic complexity over the dependent fragments that
/// carry complexity data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DependentComplexity {
    pub average: f64,
    pub max: f64,
}

/// Result of one dependents query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependentsReport {
    /// Canonical target path.
    pub target: String,
    /// Dependent fragments, sorted by (file, start line). Test fragments
    /// appear only when requested.
    pub dependents: Vec<DependentInfo>,
    /// Distinct production files importing the target, sorted.
    pub dependent_files: Vec<String>,
    /// Distinct test files importing the target, sorted.
    pub test_files: Vec<String>,
    pub production_count: usize,
    pub test_count: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub complexity: Option<DependentComplexity>,
    /// Dependency risk from the count and dependent-complexity signals.
    pub risk: RiskLevel,
    /// Soft condition note (cross-repo fallback). Never an error.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
}

/// Run a dependents query against prepared parts.
pub fn find_dependents_with(
    index: &ImportIndex,
    normalizer: &PathNormalizer,
    target_file: &str,
    options: &DependentsOptions,
) -> DependentsReport {
    let target = normalizer.normalize(target_file);

    // Repository scope: without cross_repo, a multi-repo snapshot is
    // narrowed to the target's own repo tag. A single-repo snapshot needs no
    // filter, and an unindexed target has no tag to scope by, so only a
    // known tag in a multi-repo snapshot narrows the query.
    let multi_repo = index_is_multi_repo(index);
    let scope_repo = if options.cross_repo || !multi_repo {
        None
    } else {
        index
            .fragments_in_file(&target)
            .and_then(|frags| frags.first())
            .and_then(|f| f.repo.clone())
    };
    let note = if options.cross_repo && !multi_repo {
        Some(
            "cross-repo scope requested but the snapshot covers a single repository; \
             results are single-repo"
                .to_string(),
        )
    } else {
        None
    };

    let mut seen_fragments: HashSet<String> = HashSet::new();
    let mut hits: Vec<(String, &CodeFragment)> = Vec::new();
    let mut production_files: BTreeSet<String> = BTreeSet::new();
    let mut test_files: BTreeSet<String> = BTreeSet::new();
    let mut cyclomatic_values: Vec<f64> = Vec::new();

    for fragment in index.find_dependents(normalizer, &target) {
        if let Some(scope) = scope_repo.as_deref() {
            if fragment.repo.as_deref() != Some(scope) {
                continue;
            }
        }
        if !seen_fragments.insert(fragment.synthetic_id()) {
            continue;
        }
        let owner = normalizer.normalize(&fragment.file_path);
        if owner == target {
            continue; // self-imports are not dependents
        }
        let is_test = is_test_file(&owner);
        if is_test {
            test_files.insert(owner.clone());
        } else {
            production_files.insert(owner.clone());
        }
        if is_test && !options.include_tests {
            continue;
        }
        if let Some(cyclomatic) = fragment.cyclomatic() {
            cyclomatic_values.push(f64::from(cyclomatic));
        }
        hits.push((owner, fragment));
    }

    // Sort on the numeric start line, not its display form.
    hits.sort_by(|a, b| (a.0.as_str(), a.1.start_line).cmp(&(b.0.as_str(), b.1.start_line)));
    let dependents: Vec<DependentInfo> = hits
        .into_iter()
        .map(|(owner, fragment)| {
            let is_test = is_test_file(&owner);
            DependentInfo {
                file_path: owner,
                symbol: fragment.symbol.clone(),
                kind: fragment.kind,
                lines: fragment.line_range(),
                cyclomatic: fragment.cyclomatic(),
                is_test,
                repo: fragment.repo.clone(),
            }
        })
        .collect();

    let complexity = if cyclomatic_values.is_empty() {
        None
    } else {
        let sum: f64 = cyclomatic_values.iter().sum();
        let max = cyclomatic_values.iter().cloned().fold(0.0f64, f64::max);
        Some(DependentComplexity {
            average: sum / cyclomatic_values.len() as f64,
            max,
        })
    };

    let production_count = production_files.len();
    let test_count = test_files.len();
    let counted = if options.include_tests {
        production_count + test_count
    } else {
        production_count
    };
    let risk = RiskLevel::from_dependency_signals(counted, complexity.map(|c| (c.average, c.max)));

    debug!(
        target = %target,
        production = production_count,
        tests = test_count,
        risk = risk.as_str(),
        "dependents query done"
    );

    DependentsReport {
        target,
        dependents,
        dependent_files: production_files.into_iter().collect(),
        test_files: test_files.into_iter().collect(),
        production_count,
        test_count,
        complexity,
        risk,
        note,
    }
}

/// Convenience entry: builds the normalizer and index for a one-shot query.
pub fn find_dependents(
    fragments: &[CodeFragment],
    workspace_root: &str,
    target_file: &str,
    options: &DependentsOptions,
) -> DependentsReport {
    let normalizer = PathNormalizer::new(workspace_root);
    let index = ImportIndex::build(fragments, &normalizer);
    find_dependents_with(&index, &normalizer, target_file, options)
}

fn index_is_multi_repo(index: &ImportIndex) -> bool {
    let mut first: Option<&str> = None;
    for file in index.known_files() {
        let Some(fragments) = index.fragments_in_file(file) else {
            continue;
        };
        for fragment in fragments {
            let tag = fragment.repo.as_deref().unwrap_or("");
            match first {
                None => first = Some(tag),
                Some(existing) if existing != tag => return true,
                Some(_) => {}
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn importer(file: &str, import: &str) -> CodeFragment {
        CodeFragment::new(file, 1, 20, FragmentKind::Function)
            .with_symbol("caller")
            .with_imports(&[import])
    }

    fn query(fragments: &[CodeFragment], target: &str) -> DependentsReport {
        find_dependents(fragments, "", target, &DependentsOptions::default())
    }

    #[test]
    fn test_counts_partition_production_and_test() {
        let fragments = vec![
            CodeFragment::new("src/core.ts", 1, 10, FragmentKind::Function),
            importer("src/app.ts", "./core"),
            importer("src/web.ts", "./core"),
            importer("tests/core.test.ts", "../src/core"),
        ];
        let report = query(&fragments, "src/core.ts");

        assert_eq!(report.production_count, 2);
        assert_eq!(report.test_count, 1);
        assert_eq!(report.dependent_files, vec!["src/app.ts", "src/web.ts"]);
        assert_eq!(report.test_files, vec!["tests/core.test.ts"]);
        // Test fragments hidden from the list by default.
        assert_eq!(report.dependents.len(), 2);
        assert!(report.dependents.iter().all(|d| !d.is_test));
    }

    #[test]
    fn test_include_tests_exposes_test_fragments() {
        let fragments = vec![
            CodeFragment::new("src/core.ts", 1, 10, FragmentKind::Function),
            importer("src/app.ts", "./core"),
            importer("tests/core.test.ts", "../src/core"),
        ];
        let options = DependentsOptions {
            include_tests: true,
            ..Default::default()
        };
        let report = find_dependents(&fragments, "", "src/core.ts", &options);
        assert_eq!(report.dependents.len(), 2);
        assert!(report.dependents.iter().any(|d| d.is_test));
        assert_eq!(report.test_count, 1);
    }

    #[test]
    fn test_risk_rises_with_dependent_count() {
        let mut fragments = vec![CodeFragment::new("src/core.ts", 1, 5, FragmentKind::Function)];
        for i in 0..6 {
            fragments.push(importer(&format!("src/use{}.ts", i), "./core"));
        }
        let report = query(&fragments, "src/core.ts");
        assert_eq!(report.production_count, 6);
        assert_eq!(report.risk, RiskLevel::Medium);
    }

    #[test]
    fn test_complexity_of_dependents_boosts_risk() {
        let fragments = vec![
            CodeFragment::new("src/core.ts", 1, 5, FragmentKind::Function),
            importer("src/a.ts", "./core").with_cyclomatic(10),
            importer("src/b.ts", "./core").with_cyclomatic(20),
        ];
        let report = query(&fragments, "src/core.ts");

        let complexity = report.complexity.unwrap();
        assert!((complexity.average - 15.0).abs() < f64::EPSILON);
        assert_eq!(complexity.max, 20.0);
        // Two dependents is a low count, but average 15 > 10 lifts to high.
        assert_eq!(report.risk, RiskLevel::High);
    }

    #[test]
    fn test_unindexed_target_still_has_dependents() {
        let fragments = vec![importer("src/app.ts", "./lib/missing")];
        let report = query(&fragments, "src/lib/missing.ts");
        assert_eq!(report.production_count, 1);
        assert_eq!(report.dependent_files, vec!["src/app.ts"]);
    }

    #[test]
    fn test_unindexed_target_in_tagged_snapshot_keeps_dependents() {
        // Every fragment carries the same repo tag; the unindexed target has
        // none to scope by, so the single-repo snapshot is not filtered.
        let fragments = vec![
            importer("src/app.ts", "./lib/missing").with_repo("main"),
            importer("src/web.ts", "./lib/missing").with_repo("main"),
        ];
        let report = query(&fragments, "src/lib/missing.ts");
        assert_eq!(report.production_count, 2);
        assert_eq!(report.dependent_files, vec!["src/app.ts", "src/web.ts"]);
    }

    #[test]
    fn test_no_dependents_is_low_risk_not_an_error() {
        let fragments = vec![CodeFragment::new("src/solo.ts", 1, 5, FragmentKind::Function)];
        let report = query(&fragments, "src/solo.ts");
        assert!(report.dependents.is_empty());
        assert_eq!(report.risk, RiskLevel::Low);
        assert!(report.note.is_none());
    }

    #[test]
    fn test_self_import_is_not_a_dependent() {
        let fragments = vec![importer("src/a.ts", "./a")];
        let report = query(&fragments, "src/a.ts");
        assert!(report.dependents.is_empty());
        assert_eq!(report.production_count, 0);
    }

    #[test]
    fn test_cross_repo_fallback_note_on_single_repo_snapshot() {
        let fragments = vec![
            CodeFragment::new("src/core.ts", 1, 5, FragmentKind::Function),
            importer("src/app.ts", "./core"),
        ];
        let options = DependentsOptions {
            cross_repo: true,
            ..Default::default()
        };
        let report = find_dependents(&fragments, "", "src/core.ts", &options);
        assert!(report.note.is_some());
        assert_eq!(report.production_count, 1);
    }

    #[test]
    fn test_repo_scoping_without_cross_repo() {
        let fragments = vec![
            CodeFragment::new("src/core.ts", 1, 5, FragmentKind::Function).with_repo("main"),
            importer("src/app.ts", "./core").with_repo("main"),
            importer("mirror/app.ts", "src/core").with_repo("other"),
        ];
        let report = query(&fragments, "src/core.ts");
        assert_eq!(report.dependent_files, vec!["src/app.ts"]);
        assert!(report.note.is_none());

        let options = DependentsOptions {
            cross_repo: true,
            ..Default::default()
        };
        let report = find_dependents(&fragments, "", "src/core.ts", &options);
        assert_eq!(
            report.dependent_files,
            vec!["mirror/app.ts", "src/app.ts"]
        );
        assert!(report.note.is_none(), "multi-repo snapshot needs no note");
    }

    #[test]
    fn test_dependents_sorted_for_determinism() {
        let fragments = vec![
            CodeFragment::new("src/core.ts", 1, 5, FragmentKind::Function),
            importer("src/zeta.ts", "./core"),
            importer("src/alpha.ts", "./core"),
        ];
        let report = query(&fragments, "src/core.ts");
        assert_eq!(report.dependents[0].file_path, "src/alpha.ts");
        assert_eq!(report.dependents[1].file_path, "src/zeta.ts");
    }

    #[test]
    fn test_dependents_within_a_file_sort_numerically_by_line() {
        // Start lines 9 and 10 would invert under a lexicographic sort of
        // the "9-..." / "10-..." display strings.
        let fragments = vec![
            CodeFragment::new("src/core.ts", 1, 5, FragmentKind::Function),
            CodeFragment::new("src/app.ts", 10, 30, FragmentKind::Function)
                .with_symbol("later")
                .with_imports(&["./core"]),
            CodeFragment::new("src/app.ts", 9, 9, FragmentKind::Function)
                .with_symbol("earlier")
                .with_imports(&["./core"]),
        ];
        let report = query(&fragments, "src/core.ts");
        assert_eq!(report.dependents.len(), 2);
        assert_eq!(report.dependents[0].lines, "9-9");
        assert_eq!(report.dependents[1].lines, "10-30");
    }
}
