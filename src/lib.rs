//! chunkgraph: dependency graph and complexity risk analysis over indexed
//! code fragments.
//!
//! An external scanner produces a snapshot of code fragments (file, line
//! range, symbol, raw imports, complexity numbers). This library consumes
//! such snapshots and answers three questions: who imports a given file,
//! what does the dependency graph around a set of roots look like, and
//! which files combine high complexity with a wide blast radius.
//!
//! All lookups run against an in-memory import index keyed by canonical
//! workspace-relative paths; one index serves any number of concurrent
//! read-only queries.
//!
//! # Example
//!
//! ```ignore
//! use chunkgraph::storage::{FragmentSource, JsonlStore, DEFAULT_SCAN_LIMIT};
//! use chunkgraph::{find_dependents, DependentsOptions};
//!
//! let snapshot = JsonlStore::at_default_path().get_all_fragments(DEFAULT_SCAN_LIMIT)?;
//! let report = find_dependents(
//!     &snapshot.fragments,
//!     "",
//!     "src/payments/stripe.ts",
//!     &DependentsOptions::default(),
//! );
//! println!("{} production dependents", report.production_count);
//! ```

pub mod analysis;
pub mod cli;
pub mod commands;
pub mod complexity;
pub mod dependents;
pub mod error;
pub mod graph;
pub mod import_index;
pub mod paths;
pub mod risk;
pub mod schema;
pub mod storage;

// Re-export commonly used types
pub use analysis::{analyze_complexity, ComplexityReport, ComplexitySummary, FileComplexityRecord};
pub use cli::{Cli, OutputFormat};
pub use complexity::{Severity, Violation};
pub use dependents::{find_dependents, DependentsOptions, DependentsReport};
pub use error::{ChunkGraphError, Result};
pub use graph::{
    generate_graph, DependencyGraph, Direction, GraphEdge, GraphNode, GraphOptions, NodeKind,
};
pub use import_index::ImportIndex;
pub use paths::PathNormalizer;
pub use risk::RiskLevel;
pub use schema::{CodeFragment, ComplexityNumbers, FragmentKind, HalsteadMetrics};
pub use storage::{FragmentSnapshot, FragmentSource, JsonlStore, DEFAULT_SCAN_LIMIT};
