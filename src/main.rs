//! chunkgraph CLI entry point

use std::process::ExitCode;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chunkgraph::cli::{Cli, Commands};
use chunkgraph::commands::{
    run_complexity, run_dependents, run_graph, run_stats, CommandContext,
};

fn main() -> ExitCode {
    // Diagnostics go to stderr so stdout stays valid JSON.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn run() -> chunkgraph::Result<String> {
    // 1. Parse arguments
    let cli = Cli::parse_args();

    // 2. Collect the shared context (snapshot store, format, workspace root)
    let ctx = CommandContext::from_cli(&cli);

    // 3. Dispatch to the selected subcommand
    match &cli.command {
        Commands::Dependents(args) => run_dependents(args, &ctx),
        Commands::Graph(args) => run_graph(args, &ctx),
        Commands::Complexity(args) => run_complexity(args, &ctx),
        Commands::Stats => run_stats(&ctx),
    }
}
