//! The bidirectional link ↔ occurrence translator.
//!
//! Pure, stateless, and synchronous: both directions read their input and
//! allocate fresh output, so calls may run concurrently without locking.
//! The mapping is a bijection modulo two canonicalization rules:
//!
//! - materials/products are maps keyed by path on the link side but lists of
//!   `{resource_uri, hashes}` objects on the occurrence side;
//! - the integer `return-value` byproduct travels as a string inside the
//!   occurrence's string-only `custom_values`, the single intentionally
//!   lossy-but-reversible cast.

use std::collections::BTreeMap;

use tracing::warn;

use grafter_link::link::{ArtifactHashes, Byproducts, LINK_TYPE, Link};
use grafter_link::metablock::Metablock;

use crate::error::TranslateError;
use crate::occurrence::{
    Artifact, CustomValues, IntotoDetails, KIND_INTOTO, LinkPayload, Occurrence,
    OccurrenceSignature, Resource,
};

/// Translate a signed link into a Grafeas occurrence.
///
/// The occurrence's `noteName` is the caller-supplied `step_name`;
/// namespacing it into `projects/{id}/notes/{step}` form is the caller's
/// concern.
///
/// # Errors
///
/// Returns [`TranslateError::InvalidInput`] when the signed body is not a
/// link record, or [`TranslateError::Validation`] when it fails structural
/// validation. No partial occurrence is returned on failure.
pub fn from_link(
    metablock: &Metablock,
    step_name: &str,
    resource_uri: &str,
) -> Result<Occurrence, TranslateError> {
    if metablock.signed.type_ != LINK_TYPE {
        return Err(TranslateError::InvalidInput(format!(
            "expected a link record, got `{}`",
            metablock.signed.type_
        )));
    }
    metablock.signed.validate()?;

    let link = &metablock.signed;
    Ok(Occurrence {
        resource: Resource {
            uri: resource_uri.to_owned(),
        },
        note_name: step_name.to_owned(),
        kind: KIND_INTOTO.to_owned(),
        intoto: IntotoDetails {
            signatures: metablock
                .signatures
                .iter()
                .map(OccurrenceSignature::from_native)
                .collect(),
            signed: LinkPayload {
                materials: artifacts_to_list(&link.materials),
                products: artifacts_to_list(&link.products),
                command: link.command.clone(),
                byproducts: byproducts_to_custom(&link.byproducts),
                environment: CustomValues::new(link.environment.clone()),
            },
        },
    })
}

/// Reconstruct a link from a Grafeas occurrence.
///
/// The step name is caller-supplied rather than derived from `noteName`,
/// which is a namespaced identifier and not the bare step name.
///
/// # Errors
///
/// Returns [`TranslateError::InvalidInput`] when the occurrence is not
/// in-toto-typed, [`TranslateError::MalformedByproducts`] when a
/// `return-value` is present but not integer-parsable, and
/// [`TranslateError::MissingField`] when a signature carries neither
/// signature slot.
pub fn to_link(occurrence: &Occurrence, step_name: &str) -> Result<Metablock, TranslateError> {
    if occurrence.kind != KIND_INTOTO {
        return Err(TranslateError::InvalidInput(format!(
            "occurrence has kind `{}`, expected `{KIND_INTOTO}`",
            occurrence.kind
        )));
    }

    let signed = &occurrence.intoto.signed;
    let link = Link {
        type_: LINK_TYPE.to_owned(),
        name: step_name.to_owned(),
        materials: list_to_artifacts("materials", &signed.materials),
        products: list_to_artifacts("products", &signed.products),
        command: signed.command.clone(),
        byproducts: custom_to_byproducts(&signed.byproducts)?,
        environment: custom_to_environment(&signed.environment),
    };

    let signatures = occurrence
        .intoto
        .signatures
        .iter()
        .map(OccurrenceSignature::to_native)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Metablock { signed: link, signatures })
}

// ── Canonicalization helpers ─────────────────────────────────────────

/// Map form to list form, one entry per path in deterministic key order.
fn artifacts_to_list(artifacts: &BTreeMap<String, ArtifactHashes>) -> Vec<Artifact> {
    artifacts
        .iter()
        .map(|(path, hashes)| Artifact {
            resource_uri: path.clone(),
            hashes: hashes.clone(),
        })
        .collect()
}

/// List form back to map form, re-keying by `resource_uri`.
///
/// A duplicate `resource_uri` should not occur under the bijection
/// invariant; when it does, the later entry overwrites the earlier one and
/// the overwrite is logged.
fn list_to_artifacts(field: &'static str, entries: &[Artifact]) -> BTreeMap<String, ArtifactHashes> {
    let mut map = BTreeMap::new();
    for entry in entries {
        if map
            .insert(entry.resource_uri.clone(), entry.hashes.clone())
            .is_some()
        {
            warn!(
                field,
                resource_uri = %entry.resource_uri,
                "duplicate resource_uri in occurrence list — later entry overwrites earlier"
            );
        }
    }
    map
}

/// Encode byproducts into string-only `custom_values`.
///
/// `return-value` is stringified here; every other field is already a
/// string.
fn byproducts_to_custom(byproducts: &Byproducts) -> CustomValues {
    let mut custom_values = BTreeMap::new();
    if let Some(return_value) = byproducts.return_value {
        custom_values.insert("return-value".to_owned(), return_value.to_string());
    }
    if let Some(stdout) = &byproducts.stdout {
        custom_values.insert("stdout".to_owned(), stdout.clone());
    }
    if let Some(stderr) = &byproducts.stderr {
        custom_values.insert("stderr".to_owned(), stderr.clone());
    }
    for (key, value) in &byproducts.custom {
        custom_values.insert(key.clone(), value.clone());
    }
    CustomValues::new(custom_values)
}

/// Decode byproducts from `custom_values`, parsing `return-value` back to
/// an integer.
///
/// Keys an encoder left flattened at the top level are passed through
/// first, so an explicit `custom_values` entry wins on collision.
fn custom_to_byproducts(custom: &CustomValues) -> Result<Byproducts, TranslateError> {
    let mut byproducts = Byproducts::default();
    for (key, value) in &custom.extra {
        apply_byproduct(&mut byproducts, key, &coerce_string(value))?;
    }
    for (key, value) in &custom.custom_values {
        apply_byproduct(&mut byproducts, key, value)?;
    }
    Ok(byproducts)
}

fn apply_byproduct(
    byproducts: &mut Byproducts,
    key: &str,
    value: &str,
) -> Result<(), TranslateError> {
    match key {
        "return-value" => {
            let parsed = value
                .parse::<i64>()
                .map_err(|_| TranslateError::MalformedByproducts {
                    key: key.to_owned(),
                    value: value.to_owned(),
                })?;
            byproducts.return_value = Some(parsed);
        }
        "stdout" => byproducts.stdout = Some(value.to_owned()),
        "stderr" => byproducts.stderr = Some(value.to_owned()),
        _ => {
            byproducts.custom.insert(key.to_owned(), value.to_owned());
        }
    }
    Ok(())
}

/// Decode environment from `custom_values`; no type-special-cased keys.
fn custom_to_environment(custom: &CustomValues) -> BTreeMap<String, String> {
    let mut environment = BTreeMap::new();
    for (key, value) in &custom.extra {
        environment.insert(key.clone(), coerce_string(value));
    }
    for (key, value) in &custom.custom_values {
        environment.insert(key.clone(), value.clone());
    }
    environment
}

/// Render a flattened JSON value as the string it would carry in
/// `custom_values`.
fn coerce_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
