//! The `grafter load` subcommand.
//!
//! Posts a supply-chain layout to the Grafeas server as an *operation* and
//! creates a *note* for each step the layout lists. The notes are what step
//! occurrences reference via `noteName`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::{Result, eyre};

use grafter_client::GrafeasClient;
use grafter_client::models::{LAYOUT_METADATA_KEY, LAYOUT_OPERATION_ID, Note, Operation};

/// Arguments for `grafter load`.
#[derive(Args)]
pub struct LoadArgs {
    /// Grafeas server URL.
    #[arg(long, short = 't', default_value = "http://localhost:8080")]
    pub server: String,

    /// Grafeas project identifier.
    #[arg(long, short = 'p', default_value = "default")]
    pub project: String,

    /// Path to the layout JSON file.
    #[arg(long, short = 'l', value_name = "PATH")]
    pub layout: PathBuf,
}

/// Execute the load command.
pub async fn execute(args: LoadArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.layout)?;
    let layout: serde_json::Value = serde_json::from_str(&text)?;

    let steps = layout
        .get("signed")
        .and_then(|signed| signed.get("steps"))
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| eyre!("layout has no `signed.steps` list"))?;

    let step_names: Vec<String> = steps
        .iter()
        .map(|step| {
            step.get("name")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| eyre!("layout step without a `name`"))
        })
        .collect::<Result<_>>()?;

    let client = GrafeasClient::new(args.server);

    let operation = Operation {
        name: format!(
            "projects/{}/operations/{LAYOUT_OPERATION_ID}",
            args.project
        ),
        metadata: BTreeMap::from([(LAYOUT_METADATA_KEY.to_owned(), layout)]),
        done: true,
    };
    client.create_operation(&args.project, &operation).await?;
    println!("layout stored as operation `{}`", operation.name);

    for step_name in &step_names {
        let note = Note::for_step(&args.project, step_name);
        client.create_note(&args.project, &note).await?;
        println!("note created: {}", note.name);
    }

    Ok(())
}
