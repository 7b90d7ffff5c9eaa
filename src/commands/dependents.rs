//! Dependents command handler - reverse-dependency lookup for one file

use crate::cli::DependentsArgs;
use crate::commands::CommandContext;
use crate::dependents::{find_dependents, DependentsOptions};
use crate::error::Result;
use crate::storage::FragmentSource;

/// Run the dependents command: list who imports the target file.
pub fn run_dependents(args: &DependentsArgs, ctx: &CommandContext) -> Result<String> {
    let snapshot = ctx.load_snapshot()?;

    // A source that declares itself multi-repo widens the scope even
    // without the flag.
    let options = DependentsOptions {
        include_tests: args.include_tests,
        cross_repo: args.cross_repo || ctx.source().cross_repo(),
    };
    let report = find_dependents(
        &snapshot.fragments,
        &ctx.workspace_root,
        &args.target,
        &options,
    );

    ctx.render(&report, &snapshot)
}
