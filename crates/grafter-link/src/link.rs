//! The in-toto link record.
//!
//! A link describes one executed supply-chain step: the artifacts present
//! before it ran (`materials`), the artifacts present after (`products`),
//! the command line, and ancillary byproducts such as the exit status.
//!
//! See: <https://github.com/in-toto/docs/blob/master/in-toto-spec.md>

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::LinkError;

/// A set of digest algorithms and their hex-encoded values for one artifact.
pub type ArtifactHashes = BTreeMap<String, String>;

/// The `_type` discriminator every link record carries.
pub const LINK_TYPE: &str = "link";

/// An unsigned in-toto link record.
///
/// Immutable once constructed — every transformation produces a new
/// instance, and each instance owns freshly allocated containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Record discriminator — always [`LINK_TYPE`].
    #[serde(rename = "_type")]
    pub type_: String,
    /// Step name, unique within a supply-chain layout.
    pub name: String,
    /// Artifacts consumed by the step, keyed by path.
    pub materials: BTreeMap<String, ArtifactHashes>,
    /// Artifacts produced by the step, keyed by path.
    pub products: BTreeMap<String, ArtifactHashes>,
    /// The executed command line, argv-style.
    pub command: Vec<String>,
    /// Ancillary data the step produced.
    pub byproducts: Byproducts,
    /// Ambient execution context (e.g. working directory).
    pub environment: BTreeMap<String, String>,
}

/// Byproducts of a step execution.
///
/// `return-value` is the one integer-typed field in the link schema; the
/// remaining reserved keys (`stdout`, `stderr`) and all custom keys are
/// strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Byproducts {
    /// Process exit status of the step command.
    #[serde(rename = "return-value", skip_serializing_if = "Option::is_none")]
    pub return_value: Option<i64>,
    /// Captured standard output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    /// Captured standard error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// Any further byproduct keys.
    #[serde(flatten)]
    pub custom: BTreeMap<String, String>,
}

impl Byproducts {
    /// True when no byproduct field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.return_value.is_none()
            && self.stdout.is_none()
            && self.stderr.is_none()
            && self.custom.is_empty()
    }
}

impl Link {
    /// Create an empty link for the given step.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            type_: LINK_TYPE.to_owned(),
            name: name.into(),
            materials: BTreeMap::new(),
            products: BTreeMap::new(),
            command: Vec::new(),
            byproducts: Byproducts::default(),
            environment: BTreeMap::new(),
        }
    }

    /// Structurally validate this record.
    ///
    /// Checks the `_type` discriminator, the step name, and that every
    /// material/product digest is a non-empty lowercase hex string keyed by
    /// a non-empty algorithm name.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<(), LinkError> {
        if self.type_ != LINK_TYPE {
            return Err(LinkError::Validation(format!(
                "record has _type `{}`, expected `{LINK_TYPE}`",
                self.type_
            )));
        }
        if self.name.is_empty() {
            return Err(LinkError::Validation("step name is empty".to_owned()));
        }
        validate_artifacts("materials", &self.materials)?;
        validate_artifacts("products", &self.products)?;
        Ok(())
    }
}

fn validate_artifacts(
    field: &str,
    artifacts: &BTreeMap<String, ArtifactHashes>,
) -> Result<(), LinkError> {
    for (path, hashes) in artifacts {
        if path.is_empty() {
            return Err(LinkError::Validation(format!(
                "{field} contains an entry with an empty path"
            )));
        }
        for (algorithm, digest) in hashes {
            if algorithm.is_empty() {
                return Err(LinkError::Validation(format!(
                    "{field} entry `{path}` has an empty algorithm name"
                )));
            }
            if digest.is_empty() || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(LinkError::Validation(format!(
                    "{field} entry `{path}` has a non-hex {algorithm} digest"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_link() -> Link {
        let mut link = Link::new("clone");
        link.products.insert(
            "foo.py".to_owned(),
            BTreeMap::from([("sha256".to_owned(), "abc123".to_owned())]),
        );
        link.command = vec!["git".to_owned(), "clone".to_owned(), "url".to_owned()];
        link.byproducts.return_value = Some(0);
        link
    }

    #[test]
    fn new_link_validates() {
        sample_link().validate().expect("should validate");
    }

    #[test]
    fn empty_name_rejected() {
        let link = Link::new("");
        let err = link.validate().unwrap_err();
        assert!(matches!(err, LinkError::Validation(_)));
    }

    #[test]
    fn wrong_type_rejected() {
        let mut link = sample_link();
        link.type_ = "layout".to_owned();
        let err = link.validate().unwrap_err();
        assert!(err.to_string().contains("_type"));
    }

    #[test]
    fn non_hex_digest_rejected() {
        let mut link = sample_link();
        link.materials.insert(
            "bad.py".to_owned(),
            BTreeMap::from([("sha256".to_owned(), "not hex!".to_owned())]),
        );
        let err = link.validate().unwrap_err();
        assert!(err.to_string().contains("bad.py"));
    }

    #[test]
    fn instances_own_fresh_containers() {
        let mut a = Link::new("a");
        let b = Link::new("b");
        a.materials
            .insert("x".to_owned(), ArtifactHashes::new());
        assert!(b.materials.is_empty());
    }

    #[test]
    fn byproducts_wire_format() {
        let link = sample_link();
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["_type"], "link");
        assert_eq!(json["byproducts"]["return-value"], 0);
        // Unset byproduct fields must not appear on the wire.
        assert!(json["byproducts"].get("stdout").is_none());
    }

    #[test]
    fn byproducts_round_trip_custom_keys() {
        let byproducts = Byproducts {
            return_value: Some(-3),
            stdout: Some("out".to_owned()),
            stderr: None,
            custom: BTreeMap::from([("cache-hit".to_owned(), "yes".to_owned())]),
        };
        let json = serde_json::to_string(&byproducts).unwrap();
        let back: Byproducts = serde_json::from_str(&json).unwrap();
        assert_eq!(back, byproducts);
        assert!(json.contains("\"cache-hit\""));
    }
}
