//! agb CLI - Bioindex conversion tools.

mod cli;
mod commands;

use clap::Parser;
use cli::{AnalysisCommand, Cli, Commands, ConvertCommand};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            command:
                ConvertCommand::BioindexToTabular {
                    input,
                    output,
                    no_resolve_taxonomies,
                    taxonomy_url,
                    strict_resolution,
                    format,
                    locale,
                    timeout,
                    batch_size,
                    concurrency,
                    stdout_json,
                },
        } => commands::convert::run(commands::convert::ConvertArgs {
            input,
            output,
            resolve_taxonomies: !no_resolve_taxonomies,
            taxonomy_url,
            strict_resolution,
            format,
            locale,
            timeout,
            batch_size,
            concurrency,
            stdout_json,
            verbose: cli.verbose,
        }),

        Commands::Analysis {
            command: AnalysisCommand::BioindexIds { file },
        } => commands::analysis::run(file, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
