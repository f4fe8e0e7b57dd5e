//! The `grafter run` subcommand.
//!
//! Performs one supply-chain step: executes the command, records material
//! and product hashes into a link, signs it, translates it to an occurrence,
//! and submits the occurrence to the Grafeas server (or writes it to a file
//! with `--output`).

use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::Result;

use grafter_client::GrafeasClient;
use grafter_client::models::occurrence_id;
use grafter_link::runlib;
use grafter_link::signer::{LocalSigner, default_key_path};
use grafter_occurrence::translate;

/// Arguments for `grafter run`.
#[derive(Args)]
pub struct RunArgs {
    /// Grafeas server URL.
    #[arg(long, short = 't', default_value = "http://localhost:8080")]
    pub server: String,

    /// Grafeas project identifier.
    #[arg(long, short = 'p', default_value = "default")]
    pub project: String,

    /// Name of this step.
    #[arg(long, short = 'n')]
    pub name: String,

    /// Signing key file (generated if absent).
    /// Defaults to the grafter config directory.
    #[arg(long, short = 'k', value_name = "PATH")]
    pub key: Option<PathBuf>,

    /// Material path to record before the step (repeatable).
    #[arg(long, value_name = "PATH")]
    pub materials: Vec<PathBuf>,

    /// Product path to record after the step (repeatable).
    #[arg(long, value_name = "PATH")]
    pub products: Vec<PathBuf>,

    /// Resource URI the occurrence annotates. Defaults to the step name.
    #[arg(long, value_name = "URI")]
    pub resource_uri: Option<String>,

    /// Write the occurrence to a file instead of submitting it.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Command to execute, with options and arguments.
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,
}

/// Execute the run command.
pub async fn execute(args: RunArgs) -> Result<()> {
    let mut metablock = runlib::run_step(&args.name, &args.materials, &args.products, &args.command)?;

    let key_path = args.key.unwrap_or_else(default_key_path);
    let signer = LocalSigner::load_or_generate(&key_path)?;
    metablock.sign(&signer)?;

    let resource_uri = args.resource_uri.as_deref().unwrap_or(&args.name);
    let occurrence = translate::from_link(&metablock, &args.name, resource_uri)?;

    if let Some(path) = &args.output {
        occurrence.dump(path)?;
        println!("occurrence written to {}", path.display());
        return Ok(());
    }

    let id = occurrence_id(&args.name, &metablock.signatures[0].keyid);
    let client = GrafeasClient::new(args.server);
    client.create_occurrence(&args.project, &occurrence).await?;
    println!(
        "occurrence `{id}` submitted to project `{}`",
        args.project
    );
    Ok(())
}
