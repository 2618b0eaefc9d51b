pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::recommend::RecommendArgs;

#[derive(Debug, Parser)]
#[command(
    name = "storefront",
    about = "Storefront operator CLI",
    long_about = "Operate the storefront recommendation database: migrations, demo fixtures, config inspection and ad-hoc recommendation queries.",
    after_help = "Examples:\n  storefront migrate\n  storefront seed\n  storefront recommend --kind co-purchase --product 1\n  storefront recommend --kind browsing-history --viewer user:1 --limit 5"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load and verify the deterministic demo catalog")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Compute recommendations against the configured database")]
    Recommend {
        #[arg(
            long,
            help = "co-purchase, browsing-history, category, rating-affinity, trending, \
                    similar, recently-viewed or mixed"
        )]
        kind: String,
        #[arg(long, help = "Seed product id")]
        product: Option<i64>,
        #[arg(long, help = "Viewer key: user:<id> or anon:<address>")]
        viewer: Option<String>,
        #[arg(long, help = "Maximum number of products (1-50)")]
        limit: Option<usize>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Recommend { kind, product, viewer, limit } => {
            commands::recommend::run(RecommendArgs { kind, product, viewer, limit })
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
