//! Complexity command handler - violation scan with risk-scored files

use crate::analysis::analyze_complexity;
use crate::cli::ComplexityArgs;
use crate::commands::CommandContext;
use crate::error::Result;

/// Run the complexity command: scan for threshold violations and score
/// each violating file's risk.
pub fn run_complexity(args: &ComplexityArgs, ctx: &CommandContext) -> Result<String> {
    let snapshot = ctx.load_snapshot()?;

    let report = analyze_complexity(
        &snapshot.fragments,
        &ctx.workspace_root,
        args.file.as_deref(),
    );

    ctx.render(&report, &snapshot)
}
