//! The `grafter translate` subcommand.
//!
//! Offline file-to-file conversion: a signed link file becomes an occurrence
//! file, or an occurrence file becomes a link file. No network involved.

use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::{Result, eyre};

use grafter_link::metablock::Metablock;
use grafter_occurrence::{Occurrence, translate};

/// Arguments for `grafter translate`.
#[derive(Args)]
pub struct TranslateArgs {
    /// Link file to convert into an occurrence.
    #[arg(long, value_name = "PATH", conflicts_with = "occurrence")]
    pub link: Option<PathBuf>,

    /// Occurrence file to convert into a link.
    #[arg(long, value_name = "PATH")]
    pub occurrence: Option<PathBuf>,

    /// Step name. Required for occurrence input; defaults to the link's
    /// own step name for link input.
    #[arg(long, value_name = "NAME")]
    pub step_name: Option<String>,

    /// Resource URI for the produced occurrence. Defaults to the step name.
    #[arg(long, value_name = "URI")]
    pub resource_uri: Option<String>,

    /// Output file path.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: PathBuf,
}

/// Execute the translate command.
pub fn execute(args: &TranslateArgs) -> Result<()> {
    match (&args.link, &args.occurrence) {
        (Some(link_path), None) => {
            let metablock = Metablock::load(link_path)?;
            let step_name = args
                .step_name
                .clone()
                .unwrap_or_else(|| metablock.signed.name.clone());
            let resource_uri = args.resource_uri.as_deref().unwrap_or(&step_name);

            let occurrence = translate::from_link(&metablock, &step_name, resource_uri)?;
            occurrence.dump(&args.output)?;
            println!("occurrence written to {}", args.output.display());
            Ok(())
        }
        (None, Some(occurrence_path)) => {
            let step_name = args
                .step_name
                .as_deref()
                .ok_or_else(|| eyre!("--step-name is required for occurrence input"))?;

            let occurrence = Occurrence::load(occurrence_path)?;
            let metablock = translate::to_link(&occurrence, step_name)?;
            metablock.dump(&args.output)?;
            println!("link written to {}", args.output.display());
            Ok(())
        }
        _ => Err(eyre!("pass exactly one of --link or --occurrence")),
    }
}
