//! The `grafter fetch` subcommand.
//!
//! Fetches occurrences from the Grafeas server, reconstructs their link
//! records, and writes `<id>.link` files into a directory for an external
//! in-toto verifier. Optionally fetches the stored layout alongside them.

use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::{Result, eyre};

use grafter_client::GrafeasClient;
use grafter_client::models::{LAYOUT_METADATA_KEY, LAYOUT_OPERATION_ID};
use grafter_occurrence::translate;

/// Arguments for `grafter fetch`.
#[derive(Args)]
pub struct FetchArgs {
    /// Grafeas server URL.
    #[arg(long, short = 't', default_value = "http://localhost:8080")]
    pub server: String,

    /// Grafeas project identifier.
    #[arg(long, short = 'p', default_value = "default")]
    pub project: String,

    /// Occurrence identifier to fetch, `<step>.<keyid8>` (repeatable).
    #[arg(long = "occurrence", value_name = "ID", required = true)]
    pub occurrences: Vec<String>,

    /// Directory to write reconstructed `.link` files into.
    #[arg(long, value_name = "DIR", default_value = "links")]
    pub link_dir: PathBuf,

    /// Also fetch the stored layout and write it next to the links.
    #[arg(long)]
    pub with_layout: bool,
}

/// Execute the fetch command.
pub async fn execute(args: FetchArgs) -> Result<()> {
    std::fs::create_dir_all(&args.link_dir)?;
    let client = GrafeasClient::new(args.server);

    if args.with_layout {
        let operation = client
            .get_operation(&args.project, LAYOUT_OPERATION_ID)
            .await?;
        let layout = operation
            .metadata
            .get(LAYOUT_METADATA_KEY)
            .ok_or_else(|| eyre!("layout operation has no `{LAYOUT_METADATA_KEY}` metadata"))?;
        let layout_path = args.link_dir.join("root.layout");
        std::fs::write(&layout_path, serde_json::to_string_pretty(layout)?)?;
        println!("layout written to {}", layout_path.display());
    }

    for id in &args.occurrences {
        // The identifier is `<step>.<keyid8>`; the bare step name feeds the
        // translator, which never derives it from the namespaced noteName.
        let step_name = id
            .split('.')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| eyre!("occurrence id `{id}` has no step name prefix"))?;

        let occurrence = client.get_occurrence(&args.project, id).await?;
        let metablock = translate::to_link(&occurrence, step_name)?;

        let link_path = args.link_dir.join(format!("{id}.link"));
        metablock.dump(&link_path)?;
        println!("link written to {}", link_path.display());
    }

    Ok(())
}
