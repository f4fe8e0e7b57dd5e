//! Grafter CLI — in-toto link metadata in a Grafeas store.
//!
//! Run supply-chain steps, translate their links to Grafeas occurrences,
//! and move them to and from a Grafeas server.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

/// Grafter — in-toto link metadata in a Grafeas store.
///
/// Runs supply-chain steps, translates the resulting link records into
/// Grafeas occurrences, and reconstructs links from stored occurrences for
/// verification.
#[derive(Parser)]
#[command(name = "grafter", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (repeat for more detail: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output logs as JSON (for machine consumption).
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run a supply-chain step, sign its link, and submit it as an occurrence.
    Run(commands::run::RunArgs),
    /// Post a supply-chain layout as an operation and create its step notes.
    Load(commands::load::LoadArgs),
    /// Fetch occurrences and reconstruct link files for verification.
    Fetch(commands::fetch::FetchArgs),
    /// Convert between link and occurrence files offline.
    Translate(commands::translate::TranslateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Run(args) => commands::run::execute(args).await,
        Commands::Load(args) => commands::load::execute(args).await,
        Commands::Fetch(args) => commands::fetch::execute(args).await,
        Commands::Translate(args) => commands::translate::execute(&args),
    }
}
