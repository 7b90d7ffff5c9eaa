//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::graph::Direction;
use crate::storage::{JsonlStore, DEFAULT_SCAN_LIMIT};

/// Dependency graph and complexity risk analyzer
#[derive(Parser, Debug)]
#[command(name = "chunkgraph")]
#[command(about = "Dependency graph and complexity risk analysis over indexed code fragments")]
#[command(version)]
#[command(author)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Snapshot file to read (JSONL, one fragment per line)
    #[arg(long, global = true, env = "CHUNKGRAPH_SNAPSHOT", value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Maximum number of fragments loaded from the snapshot
    #[arg(long, global = true, value_name = "N", default_value_t = DEFAULT_SCAN_LIMIT)]
    pub scan_limit: usize,

    /// Workspace root prefix stripped during path canonicalization
    #[arg(long, global = true, value_name = "DIR", default_value = "")]
    pub workspace_root: String,

    /// Output format
    #[arg(short, long, global = true, default_value = "json", value_enum)]
    pub format: OutputFormat,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the files and fragments that import a target file
    Dependents(DependentsArgs),
    /// Generate a dependency graph from root files or directories
    Graph(GraphArgs),
    /// Scan for complexity violations and score file risk
    Complexity(ComplexityArgs),
    /// Summarize the snapshot (fragment, file, and language counts)
    Stats,
}

/// Arguments for the dependents command
#[derive(Args, Debug)]
pub struct DependentsArgs {
    /// File whose dependents to list
    #[arg(value_name = "FILE")]
    pub target: String,

    /// Include test files in the dependent list and counts
    #[arg(long)]
    pub include_tests: bool,

    /// Search across repository tags in a multi-repo snapshot
    #[arg(long)]
    pub cross_repo: bool,
}

/// Arguments for the graph command
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Root files or directories to traverse from
    #[arg(value_name = "PATH", required = true)]
    pub roots: Vec<String>,

    /// Traversal direction
    #[arg(short, long, default_value = "forward", value_enum)]
    pub direction: GraphDirection,

    /// Maximum traversal depth from each root (unlimited when omitted)
    #[arg(long, value_name = "N")]
    pub depth: Option<u32>,

    /// Include test files in the graph
    #[arg(long)]
    pub include_tests: bool,

    /// Aggregate file nodes into directory-level module nodes
    #[arg(long)]
    pub module_level: bool,

    /// Attach aggregated complexity to nodes
    #[arg(long)]
    pub with_complexity: bool,
}

/// Arguments for the complexity command
#[derive(Args, Debug)]
pub struct ComplexityArgs {
    /// Restrict the scan to one file or directory
    #[arg(long, value_name = "PATH")]
    pub file: Option<String>,
}

/// Traversal direction options
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum GraphDirection {
    /// Follow imports from the roots outward
    #[default]
    Forward,
    /// Find the files that import the roots
    Reverse,
    /// Union of both directions
    Both,
}

impl From<GraphDirection> for Direction {
    fn from(direction: GraphDirection) -> Self {
        match direction {
            GraphDirection::Forward => Direction::Forward,
            GraphDirection::Reverse => Direction::Reverse,
            GraphDirection::Both => Direction::Both,
        }
    }
}

/// Output format options
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Json,
    /// Single-line JSON
    Compact,
}

impl Cli {
    /// Parse CLI arguments from the command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Store for the selected snapshot path, falling back to the
    /// conventional cache location.
    pub fn store(&self) -> JsonlStore {
        match &self.snapshot {
            Some(path) => JsonlStore::new(path),
            None => JsonlStore::at_default_path(),
        }
    }
}
