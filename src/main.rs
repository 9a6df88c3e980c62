use anyhow::Result;
use clap::Parser;
use flatsplit::cli::{AppContext, Cli, Commands};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn setup_logging(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(!no_color),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet, cli.no_color);

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Flatten(args) => flatsplit::flatten_run(args, &ctx),
        Commands::Distribute(args) => flatsplit::distribute_run(args, &ctx),
        Commands::Strip(args) => flatsplit::core::inspect::strip_run(args, &ctx),
        Commands::Segments(args) => flatsplit::core::inspect::segments_run(args, &ctx),
        Commands::Tree(args) => flatsplit::tree_run(args, &ctx),
        Commands::Init(args) => flatsplit::infra::config::init(args, &ctx),
        Commands::Completions(args) => flatsplit::completion::run(args, &ctx),
    }
}
