//! Dependency graph construction.
//!
//! Forward ("what does this import") and reverse ("what imports this") walks
//! share one shape: an explicit worklist, a visited-set owned by the caller
//! of the walk, depth limiting, and placeholder nodes for files the snapshot
//! never indexed. Both directions can be combined, and the file-level result
//! can be aggregated to directory-level modules as a post-process.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ChunkGraphError, Result};
use crate::import_index::ImportIndex;
use crate::paths::{has_code_extension, is_test_file, parent_dir, PathNormalizer};
use crate::schema::{fnv1a_hash, CodeFragment, FragmentKind};

/// Directory roots expand to at most this many member files.
pub const MAX_FILES_PER_DIRECTORY: usize = 50;
/// Total root cap after directory expansion.
pub const MAX_TOTAL_ROOTS: usize = 100;

// ========== Graph Types ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Function,
    Class,
    Interface,
    Module,
}

/// A node keyed by a deterministic id derived from its canonical path, so
/// the same file lands on the same id across traversals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub path: String,
    /// Aggregate complexity (max cyclomatic over the file's fragments),
    /// present only when requested and available.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub complexity: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Imports,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

impl GraphEdge {
    fn imports(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            kind: EdgeKind::Imports,
        }
    }
}

/// Traversal direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
    Both,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
            Direction::Both => "both",
        }
    }
}

/// Options for one graph generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphOptions {
    #[serde(default)]
    pub direction: Direction,
    /// Maximum walk depth from each root; absent means unlimited.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max_depth: Option<u32>,
    /// Test files are excluded from expansion unless set.
    #[serde(default)]
    pub include_tests: bool,
    /// Aggregate the result to directory-level module nodes.
    #[serde(default)]
    pub module_level: bool,
    /// Attach aggregate complexity to nodes.
    #[serde(default)]
    pub include_complexity: bool,
}

/// A generated dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraph {
    /// Canonical roots actually traversed, after directory expansion.
    pub roots: Vec<String>,
    pub direction: Direction,
    pub module_level: bool,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

// ========== Ids and Node Building ==========

/// Deterministic node id for a canonical file path.
pub fn node_id(canonical_path: &str) -> String {
    format!("{:016x}", fnv1a_hash(canonical_path))
}

/// Module ids hash a prefixed spelling so a directory can never collide
/// with a file of the same name.
fn module_node_id(dir: &str) -> String {
    format!("{:016x}", fnv1a_hash(&format!("module:{}", dir)))
}

fn file_label(canonical_path: &str) -> String {
    canonical_path
        .rsplit('/')
        .next()
        .unwrap_or(canonical_path)
        .to_string()
}

/// Node kind from the file's fragment kinds: class wins, then interface,
/// then function; plain files without symbol fragments stay `file`.
fn infer_node_kind(fragments: &[&CodeFragment]) -> NodeKind {
    let mut has_interface = false;
    let mut has_function = false;
    for fragment in fragments {
        match fragment.kind {
            FragmentKind::Class => return NodeKind::Class,
            FragmentKind::Interface => has_interface = true,
            FragmentKind::Function | FragmentKind::Method => has_function = true,
            FragmentKind::Block => {}
        }
    }
    if has_interface {
        NodeKind::Interface
    } else if has_function {
        NodeKind::Function
    } else {
        NodeKind::File
    }
}

fn aggregate_complexity(fragments: &[&CodeFragment]) -> Option<f64> {
    fragments
        .iter()
        .filter_map(|f| f.cyclomatic())
        .max()
        .map(f64::from)
}

fn build_node(path: &str, fragments: &[&CodeFragment], include_complexity: bool) -> GraphNode {
    GraphNode {
        id: node_id(path),
        label: file_label(path),
        kind: infer_node_kind(fragments),
        path: path.to_string(),
        complexity: if include_complexity {
            aggregate_complexity(fragments)
        } else {
            None
        },
    }
}

fn placeholder_node(path: &str) -> GraphNode {
    GraphNode {
        id: node_id(path),
        label: file_label(path),
        kind: NodeKind::File,
        path: path.to_string(),
        complexity: None,
    }
}

// ========== Traversal ==========

/// Walk one direction from a set of canonical roots, sharing `visited`
/// across all of them. Files are marked visited when scheduled; an edge into
/// an already-visited file is dropped, which is also the cycle guard.
fn walk(
    index: &ImportIndex,
    normalizer: &PathNormalizer,
    roots: &[String],
    forward: bool,
    options: &GraphOptions,
    visited: &mut HashSet<String>,
) -> (Vec<GraphNode>, Vec<GraphEdge>) {
    let mut nodes: Vec<GraphNode> = Vec::new();
    let mut edges: Vec<GraphEdge> = Vec::new();
    let mut stack: Vec<(String, Option<u32>)> = Vec::new();

    for root in roots {
        if !visited.insert(root.clone()) {
            continue;
        }
        stack.push((root.clone(), options.max_depth));

        while let Some((path, remaining)) = stack.pop() {
            let Some(fragments) = index.fragments_in_file(&path) else {
                nodes.push(placeholder_node(&path));
                continue;
            };
            nodes.push(build_node(&path, fragments, options.include_complexity));

            if remaining == Some(0) {
                continue;
            }
            let children = if forward {
                forward_children(index, normalizer, fragments)
            } else {
                reverse_children(index, normalizer, &path)
            };
            for child in children {
                if !options.include_tests && is_test_file(&child) {
                    continue;
                }
                if !visited.insert(child.clone()) {
                    // Edge back into a visited file is dropped silently.
                    continue;
                }
                if forward {
                    edges.push(GraphEdge::imports(&node_id(&path), &node_id(&child)));
                } else {
                    edges.push(GraphEdge::imports(&node_id(&child), &node_id(&path)));
                }
                stack.push((child, remaining.map(|d| d - 1)));
            }
        }
    }

    (nodes, edges)
}

/// Files this file imports: relative imports resolve even when the target
/// was never indexed (it becomes a placeholder when entered); non-relative
/// references only join the graph when they fuzzy-match an indexed file.
fn forward_children(
    index: &ImportIndex,
    normalizer: &PathNormalizer,
    fragments: &[&CodeFragment],
) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<String> = Vec::new();
    for fragment in fragments {
        for raw in &fragment.imports {
            let child = match index.resolve_to_known_file(normalizer, raw, &fragment.file_path) {
                Some(known) => known.to_string(),
                None => match normalizer.resolve_relative_import(raw, &fragment.file_path) {
                    Some(resolved) => resolved,
                    None => continue, // external reference
                },
            };
            if !child.is_empty() && seen.insert(child.clone()) {
                out.push(child);
            }
        }
    }
    out
}

/// Files that import this file, grouped from fragment hits in first-seen
/// order.
fn reverse_children(
    index: &ImportIndex,
    normalizer: &PathNormalizer,
    path: &str,
) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<String> = Vec::new();
    for fragment in index.find_dependents(normalizer, path) {
        let owner = normalizer.normalize(&fragment.file_path);
        if owner != path && seen.insert(owner.clone()) {
            out.push(owner);
        }
    }
    out
}

// ========== Root Expansion ==========

/// Canonicalize roots and expand directory roots (anything without a code
/// extension) into their indexed member files, applying both caps. Files
/// past a cap are dropped silently from the result; the condition is logged.
fn expand_roots(
    index: &ImportIndex,
    normalizer: &PathNormalizer,
    roots: &[String],
    include_tests: bool,
) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut expanded: Vec<String> = Vec::new();

    for root in roots {
        let canonical = normalizer.normalize(root);
        if has_code_extension(&canonical) {
            if seen.insert(canonical.clone()) {
                expanded.push(canonical);
            }
            continue;
        }
        let prefix = if canonical.is_empty() {
            String::new()
        } else {
            format!("{}/", canonical)
        };
        let mut taken = 0usize;
        let mut members = 0usize;
        for file in index.known_files() {
            if !file.starts_with(&prefix) {
                continue;
            }
            if !include_tests && is_test_file(file) {
                continue;
            }
            members += 1;
            if taken == MAX_FILES_PER_DIRECTORY {
                continue;
            }
            taken += 1;
            if seen.insert(file.clone()) {
                expanded.push(file.clone());
            }
        }
        if members > MAX_FILES_PER_DIRECTORY {
            warn!(
                directory = %canonical,
                members,
                cap = MAX_FILES_PER_DIRECTORY,
                "directory root truncated"
            );
        }
    }

    if expanded.len() > MAX_TOTAL_ROOTS {
        warn!(
            roots = expanded.len(),
            cap = MAX_TOTAL_ROOTS,
            "total roots truncated"
        );
        expanded.truncate(MAX_TOTAL_ROOTS);
    }
    expanded
}

// ========== Deduplication and Aggregation ==========

/// Merge nodes with the same id; a duplicate carrying complexity data
/// replaces one without.
fn dedupe_nodes(nodes: Vec<GraphNode>) -> Vec<GraphNode> {
    let mut position: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<GraphNode> = Vec::new();
    for node in nodes {
        match position.get(&node.id) {
            Some(&at) => {
                if out[at].complexity.is_none() && node.complexity.is_some() {
                    out[at] = node;
                }
            }
            None => {
                position.insert(node.id.clone(), out.len());
                out.push(node);
            }
        }
    }
    out
}

fn dedupe_edges(edges: Vec<GraphEdge>) -> Vec<GraphEdge> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    edges
        .into_iter()
        .filter(|e| seen.insert((e.from.clone(), e.to.clone())))
        .collect()
}

/// Regroup a file-level graph by containing directory. Root-level files
/// group under ".". An edge joins two modules when any file edge crosses
/// the boundary; intra-module edges are dropped.
pub fn aggregate_to_modules(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
) -> (Vec<GraphNode>, Vec<GraphEdge>) {
    let mut module_of: HashMap<String, String> = HashMap::new();
    let mut module_nodes: Vec<GraphNode> = Vec::new();
    let mut module_index: HashMap<String, usize> = HashMap::new();

    for node in nodes {
        let dir = match parent_dir(&node.path) {
            "" => ".".to_string(),
            dir => dir.to_string(),
        };
        let id = module_node_id(&dir);
        module_of.insert(node.id.clone(), id.clone());
        match module_index.get(&dir) {
            Some(&at) => {
                let merged = &mut module_nodes[at];
                merged.complexity = match (merged.complexity, node.complexity) {
                    (Some(a), Some(b)) => Some(a.max(b)),
                    (a, b) => a.or(b),
                };
            }
            None => {
                module_index.insert(dir.clone(), module_nodes.len());
                module_nodes.push(GraphNode {
                    id,
                    label: dir.clone(),
                    kind: NodeKind::Module,
                    path: dir,
                    complexity: node.complexity,
                });
            }
        }
    }

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut module_edges: Vec<GraphEdge> = Vec::new();
    for edge in edges {
        let (Some(from), Some(to)) = (module_of.get(&edge.from), module_of.get(&edge.to)) else {
            continue;
        };
        if from == to {
            continue;
        }
        if seen.insert((from.clone(), to.clone())) {
            module_edges.push(GraphEdge {
                from: from.clone(),
                to: to.clone(),
                kind: edge.kind,
            });
        }
    }

    (module_nodes, module_edges)
}

// ========== Entry Point ==========

/// Build a dependency graph from prepared parts. The index and normalizer
/// are constructed once per analysis run by the caller and shared across
/// queries.
pub fn generate_graph_with(
    index: &ImportIndex,
    normalizer: &PathNormalizer,
    roots: &[String],
    options: &GraphOptions,
) -> Result<DependencyGraph> {
    if roots.is_empty() {
        return Err(ChunkGraphError::EmptyRoots);
    }
    let expanded = expand_roots(index, normalizer, roots, options.include_tests);
    debug!(
        roots = expanded.len(),
        direction = options.direction.as_str(),
        "graph walk starting"
    );

    let (nodes, edges) = match options.direction {
        Direction::Forward => {
            let mut visited = HashSet::new();
            walk(index, normalizer, &expanded, true, options, &mut visited)
        }
        Direction::Reverse => {
            let mut visited = HashSet::new();
            walk(index, normalizer, &expanded, false, options, &mut visited)
        }
        Direction::Both => {
            // Each direction owns its visited-set; a shared one would stop
            // the second pass at the roots.
            let mut forward_visited = HashSet::new();
            let (mut nodes, mut edges) =
                walk(index, normalizer, &expanded, true, options, &mut forward_visited);
            let mut reverse_visited = HashSet::new();
            let (reverse_nodes, reverse_edges) =
                walk(index, normalizer, &expanded, false, options, &mut reverse_visited);
            nodes.extend(reverse_nodes);
            edges.extend(reverse_edges);
            (nodes, edges)
        }
    };

    let mut nodes = dedupe_nodes(nodes);
    let mut edges = dedupe_edges(edges);
    if options.module_level {
        let (module_nodes, module_edges) = aggregate_to_modules(&nodes, &edges);
        nodes = module_nodes;
        edges = module_edges;
    }

    Ok(DependencyGraph {
        roots: expanded,
        direction: options.direction,
        module_level: options.module_level,
        nodes,
        edges,
    })
}

/// Convenience entry: builds the normalizer and index for a one-shot run.
pub fn generate_graph(
    fragments: &[CodeFragment],
    workspace_root: &str,
    roots: &[String],
    options: &GraphOptions,
) -> Result<DependencyGraph> {
    let normalizer = PathNormalizer::new(workspace_root);
    let index = ImportIndex::build(fragments, &normalizer);
    generate_graph_with(&index, &normalizer, roots, options)
}
