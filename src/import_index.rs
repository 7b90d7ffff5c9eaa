//! Reverse import lookup: one pass over the fragment snapshot builds a
//! mapping from normalized import target to the fragments referencing it.
//!
//! Built once per analysis run, read-only afterward. Relative imports
//! resolve to canonical workspace paths; anything else is indexed under its
//! normalized raw spelling, where only the fuzzy fallback can reach it (this
//! is what lets a root-relative `utils/helpers` find `src/utils/helpers.ts`).

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::paths::{matches_file, PathNormalizer};
use crate::schema::CodeFragment;

/// Import target → referencing fragments, plus a canonical file → fragments
/// view of the same snapshot for traversal.
pub struct ImportIndex<'a> {
    buckets: HashMap<String, Vec<&'a CodeFragment>>,
    by_file: HashMap<String, Vec<&'a CodeFragment>>,
    /// Bucket keys in sorted order, for the deterministic fallback scan.
    sorted_keys: Vec<String>,
    /// Canonical files in sorted order, for deterministic fuzzy resolution.
    sorted_files: Vec<String>,
}

impl<'a> ImportIndex<'a> {
    /// Build the index in one pass: O(total imports across all fragments).
    pub fn build(fragments: &'a [CodeFragment], normalizer: &PathNormalizer) -> Self {
        let mut buckets: HashMap<String, Vec<&'a CodeFragment>> = HashMap::new();
        let mut by_file: HashMap<String, Vec<&'a CodeFragment>> = HashMap::new();

        for fragment in fragments {
            let owner = normalizer.normalize(&fragment.file_path);
            by_file.entry(owner).or_default().push(fragment);

            for raw in &fragment.imports {
                let key = normalizer
                    .resolve_relative_import(raw, &fragment.file_path)
                    .unwrap_or_else(|| normalizer.normalize(raw));
                if key.is_empty() {
                    continue;
                }
                buckets.entry(key).or_default().push(fragment);
            }
        }

        let mut sorted_keys: Vec<String> = buckets.keys().cloned().collect();
        sorted_keys.sort();
        let mut sorted_files: Vec<String> = by_file.keys().cloned().collect();
        sorted_files.sort();

        debug!(
            targets = sorted_keys.len(),
            files = sorted_files.len(),
            "import index built"
        );

        Self {
            buckets,
            by_file,
            sorted_keys,
            sorted_files,
        }
    }

    /// All fragments that import `target_file`: an exact bucket lookup plus a
    /// linear fuzzy scan over every key. Results are deduplicated by the
    /// fragment's synthetic (file, line-range) id, exact hits first, fuzzy
    /// hits in sorted key order.
    ///
    /// The fallback scan is the documented cost of this query; on very large
    /// import surfaces it dominates. Accepted trade-off over maintaining a
    /// second fuzzy index.
    pub fn find_dependents(
        &self,
        normalizer: &PathNormalizer,
        target_file: &str,
    ) -> Vec<&'a CodeFragment> {
        let canonical = normalizer.normalize(target_file);
        let mut seen: HashSet<String> = HashSet::new();
        let mut out: Vec<&'a CodeFragment> = Vec::new();

        if let Some(exact) = self.buckets.get(&canonical) {
            for fragment in exact {
                if seen.insert(fragment.synthetic_id()) {
                    out.push(fragment);
                }
            }
        }

        let mut fuzzy_hits = 0usize;
        for key in &self.sorted_keys {
            if key == &canonical || !matches_file(key, &canonical) {
                continue;
            }
            fuzzy_hits += 1;
            for fragment in &self.buckets[key] {
                if seen.insert(fragment.synthetic_id()) {
                    out.push(fragment);
                }
            }
        }
        if fuzzy_hits > 0 {
            debug!(target = %canonical, fuzzy_keys = fuzzy_hits, "fallback scan matched");
        }

        out
    }

    /// Fragments physically located in a canonical file, in snapshot order.
    pub fn fragments_in_file(&self, canonical_file: &str) -> Option<&[&'a CodeFragment]> {
        self.by_file.get(canonical_file).map(|v| v.as_slice())
    }

    /// Resolve one raw import to an indexed file: relative resolution first,
    /// then exact file lookup, then fuzzy match in sorted file order.
    /// `None` means the reference is external and stays out of the graph.
    pub fn resolve_to_known_file(
        &self,
        normalizer: &PathNormalizer,
        raw_import: &str,
        source_file: &str,
    ) -> Option<&str> {
        let candidate = normalizer
            .resolve_relative_import(raw_import, source_file)
            .unwrap_or_else(|| normalizer.normalize(raw_import));
        if candidate.is_empty() {
            return None;
        }
        if let Some((key, _)) = self.by_file.get_key_value(&candidate) {
            return Some(key.as_str());
        }
        self.sorted_files
            .iter()
            .find(|file| matches_file(&candidate, file))
            .map(|s| s.as_str())
    }

    /// Canonical files present in the snapshot, sorted.
    pub fn known_files(&self) -> &[String] {
        &self.sorted_files
    }

    /// Number of distinct import targets.
    pub fn target_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_file.is_empty()
    }
}
