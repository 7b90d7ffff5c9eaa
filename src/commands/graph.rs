//! Graph command handler - dependency graph generation from root paths

use crate::cli::GraphArgs;
use crate::commands::CommandContext;
use crate::error::Result;
use crate::graph::{generate_graph, GraphOptions};

/// Run the graph command: traverse the import graph from the given roots.
pub fn run_graph(args: &GraphArgs, ctx: &CommandContext) -> Result<String> {
    let snapshot = ctx.load_snapshot()?;

    let options = GraphOptions {
        direction: args.direction.into(),
        max_depth: args.depth,
        include_tests: args.include_tests,
        module_level: args.module_level,
        include_complexity: args.with_complexity,
    };
    let graph = generate_graph(
        &snapshot.fragments,
        &ctx.workspace_root,
        &args.roots,
        &options,
    )?;

    ctx.render(&graph, &snapshot)
}
