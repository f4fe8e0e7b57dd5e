//! Grafeas records other than occurrences: notes and operations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A Grafeas note — the template a step's occurrences instantiate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Fully qualified name: `projects/{id}/notes/{step}`.
    pub name: String,
    /// Human-readable description of the step.
    #[serde(rename = "shortDescription", skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    /// Note kind; `INTOTO` for supply-chain step definitions.
    pub kind: String,
}

impl Note {
    /// Create an in-toto-typed note for a layout step.
    #[must_use]
    pub fn for_step(project_id: &str, step_name: &str) -> Self {
        Self {
            name: note_name(project_id, step_name),
            short_description: Some(format!("supply chain step `{step_name}`")),
            kind: grafter_occurrence::occurrence::KIND_INTOTO.to_owned(),
        }
    }
}

/// A long-running Grafeas operation. The supply-chain layout is stored as
/// an operation whose metadata carries the layout JSON under the `in-toto`
/// key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Fully qualified name: `projects/{id}/operations/{op}`.
    pub name: String,
    /// Free-form operation metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Whether the operation has completed.
    #[serde(default)]
    pub done: bool,
}

/// The metadata key the layout document is stored under.
pub const LAYOUT_METADATA_KEY: &str = "in-toto";

/// The well-known operation identifier the layout is stored as.
pub const LAYOUT_OPERATION_ID: &str = "layout";

/// Namespaced note name: `projects/{id}/notes/{step}`.
#[must_use]
pub fn note_name(project_id: &str, step_name: &str) -> String {
    format!("projects/{project_id}/notes/{step_name}")
}

/// Namespaced occurrence name: `projects/{id}/occurrences/{name}`.
#[must_use]
pub fn occurrence_name(project_id: &str, name: &str) -> String {
    format!("projects/{project_id}/occurrences/{name}")
}

/// The occurrence identifier for one step execution: the step name suffixed
/// with the first eight hex digits of the signing keyid.
#[must_use]
pub fn occurrence_id(step_name: &str, keyid: &str) -> String {
    let prefix: String = keyid.chars().take(8).collect();
    format!("{step_name}.{prefix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_name_is_namespaced() {
        assert_eq!(note_name("demo", "clone"), "projects/demo/notes/clone");
    }

    #[test]
    fn occurrence_name_is_namespaced() {
        assert_eq!(
            occurrence_name("demo", "clone.776a00e2"),
            "projects/demo/occurrences/clone.776a00e2"
        );
    }

    #[test]
    fn occurrence_id_truncates_keyid() {
        assert_eq!(
            occurrence_id("clone", "776a00e2bcd0f4e6b14e9e4a8353e6a1deadbeef"),
            "clone.776a00e2"
        );
    }

    #[test]
    fn note_for_step_wire_shape() {
        let note = Note::for_step("demo", "clone");
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["name"], "projects/demo/notes/clone");
        assert_eq!(value["kind"], "INTOTO");
        assert!(value["shortDescription"].as_str().unwrap().contains("clone"));
    }

    #[test]
    fn operation_metadata_defaults_empty() {
        let op: Operation =
            serde_json::from_str(r#"{"name":"projects/demo/operations/layout"}"#).unwrap();
        assert!(op.metadata.is_empty());
        assert!(!op.done);
    }
}
