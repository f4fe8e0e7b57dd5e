//! The Grafeas occurrence record with an in-toto payload.
//!
//! The wire JSON is the one bit-exact contract this crate honors — it is the
//! interchange format persisted to and fetched from the Grafeas store:
//!
//! ```json
//! {
//!   "resource": { "uri": "..." },
//!   "noteName": "...",
//!   "kind": "INTOTO",
//!   "intoto": {
//!     "signatures": [{ "keyid": "...", "signature": "..." }],
//!     "signed": { "materials": [...], "products": [...], "command": [...],
//!                 "byproducts": { "custom_values": {} },
//!                 "environment": { "custom_values": {} } }
//!   }
//! }
//! ```
//!
//! Deserialization goes through a raw form with optional fields so that an
//! absent required sub-object surfaces as a typed
//! [`TranslateError::MissingField`] instead of an opaque serde error.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use grafter_link::link::ArtifactHashes;
use grafter_link::metablock::Signature;

use crate::error::TranslateError;

/// The fixed `kind` discriminator for in-toto-typed occurrences.
pub const KIND_INTOTO: &str = "INTOTO";

/// A Grafeas occurrence annotating one artifact with link metadata.
///
/// Immutable value object: created either by translating a link or by
/// deserializing wire JSON, never mutated in place afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Occurrence {
    /// The subject artifact this occurrence annotates.
    pub resource: Resource,
    /// The parent note this occurrence instantiates. Namespacing into
    /// `projects/{id}/notes/{step}` form is a caller concern.
    #[serde(rename = "noteName")]
    pub note_name: String,
    /// Payload discriminator — always [`KIND_INTOTO`].
    pub kind: String,
    /// The in-toto payload.
    pub intoto: IntotoDetails,
}

/// The subject artifact reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// URI identifying the artifact.
    pub uri: String,
}

/// The in-toto payload of an occurrence: signatures plus the signed body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntotoDetails {
    /// One entry per signing identity.
    pub signatures: Vec<OccurrenceSignature>,
    /// The signed link body in occurrence shape.
    pub signed: LinkPayload,
}

/// The canonical occurrence-side encoding of a link's signed body.
///
/// All conversion paths produce and consume this structure — never a
/// loosely-typed mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkPayload {
    /// Input artifacts, as a list of per-artifact objects.
    pub materials: Vec<Artifact>,
    /// Output artifacts, same shape as materials.
    pub products: Vec<Artifact>,
    /// The executed command line.
    pub command: Vec<String>,
    /// Byproducts, string-coerced into `custom_values`.
    pub byproducts: CustomValues,
    /// Environment, string-coerced into `custom_values`.
    pub environment: CustomValues,
}

/// One artifact entry in the occurrence's list shape.
///
/// The Grafeas schema uses a list of objects here rather than a map keyed by
/// path, so the list form admits per-artifact extension later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Artifact path or URI.
    pub resource_uri: String,
    /// Content digests, algorithm name to hex digest.
    pub hashes: ArtifactHashes,
}

/// The Grafeas generic string-keyed extension container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomValues {
    /// String-valued custom fields.
    #[serde(default)]
    pub custom_values: BTreeMap<String, String>,
    /// Keys some encoders emit at the top level instead of under
    /// `custom_values`; passed through on reconstruction. An empty map
    /// flattens to nothing, so the wire shape is unchanged.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CustomValues {
    /// A container holding exactly the given `custom_values`.
    #[must_use]
    pub fn new(custom_values: BTreeMap<String, String>) -> Self {
        Self {
            custom_values,
            extra: BTreeMap::new(),
        }
    }
}

/// A signature in occurrence shape.
///
/// The occurrence schema names the signature field `signature`, the link
/// schema names it `sig`. Both slots are modeled so re-keying is idempotent:
/// a record that never crossed the wire may still carry the native `sig`
/// form, and that form wins on reconstruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceSignature {
    /// Identifier of the signing key.
    pub keyid: String,
    /// Occurrence-native signature slot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Link-native signature slot, present only when the record skipped a
    /// wire round trip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl OccurrenceSignature {
    /// Re-key a link-native signature into occurrence shape.
    #[must_use]
    pub fn from_native(signature: &Signature) -> Self {
        Self {
            keyid: signature.keyid.clone(),
            signature: Some(signature.sig.clone()),
            sig: None,
        }
    }

    /// Re-key into link-native `{keyid, sig}` shape.
    ///
    /// Idempotent: an already-native `sig` value is taken as-is, detected by
    /// the absence of a wire round trip rather than assumed.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::MissingField`] when neither slot is set.
    pub fn to_native(&self) -> Result<Signature, TranslateError> {
        let sig = self
            .sig
            .as_ref()
            .or(self.signature.as_ref())
            .ok_or(TranslateError::MissingField("intoto.signatures[].signature"))?;
        Ok(Signature {
            keyid: self.keyid.clone(),
            sig: sig.clone(),
        })
    }
}

/// Materials/products as they may appear on the wire: either the occurrence
/// list form or the in-toto map form, normalized at the boundary.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ArtifactCollection {
    /// Occurrence-native list of `{resource_uri, hashes}` objects.
    List(Vec<Artifact>),
    /// in-toto-native map from path to hash set.
    Map(BTreeMap<String, ArtifactHashes>),
}

impl ArtifactCollection {
    /// Normalize to the canonical list form, map entries in path order.
    #[must_use]
    pub fn into_entries(self) -> Vec<Artifact> {
        match self {
            Self::List(entries) => entries,
            Self::Map(map) => map
                .into_iter()
                .map(|(resource_uri, hashes)| Artifact {
                    resource_uri,
                    hashes,
                })
                .collect(),
        }
    }
}

// ── Wire deserialization ─────────────────────────────────────────────

#[derive(Deserialize)]
struct RawOccurrence {
    resource: Option<Resource>,
    #[serde(rename = "noteName")]
    note_name: Option<String>,
    kind: Option<String>,
    intoto: Option<RawIntoto>,
}

#[derive(Deserialize)]
struct RawIntoto {
    #[serde(default)]
    signatures: Vec<OccurrenceSignature>,
    signed: Option<RawLinkPayload>,
}

#[derive(Deserialize)]
struct RawLinkPayload {
    materials: Option<ArtifactCollection>,
    products: Option<ArtifactCollection>,
    command: Option<Vec<String>>,
    byproducts: Option<CustomValues>,
    environment: Option<CustomValues>,
}

impl Occurrence {
    /// Parse an occurrence from wire JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::MissingField`] when a required sub-object
    /// (`resource`, `noteName`, `intoto`, `intoto.signed`, or the signed
    /// body's `materials`/`products`/`command`) is absent,
    /// [`TranslateError::InvalidInput`] when `kind` is not `INTOTO`, and
    /// [`TranslateError::Serialize`] when the text is not valid JSON.
    pub fn from_json(json: &str) -> Result<Self, TranslateError> {
        let raw: RawOccurrence = serde_json::from_str(json)?;

        let kind = raw.kind.unwrap_or_else(|| KIND_INTOTO.to_owned());
        if kind != KIND_INTOTO {
            return Err(TranslateError::InvalidInput(format!(
                "occurrence has kind `{kind}`, expected `{KIND_INTOTO}`"
            )));
        }

        let resource = raw.resource.ok_or(TranslateError::MissingField("resource"))?;
        let note_name = raw.note_name.ok_or(TranslateError::MissingField("noteName"))?;
        let intoto = raw.intoto.ok_or(TranslateError::MissingField("intoto"))?;
        let signed = intoto
            .signed
            .ok_or(TranslateError::MissingField("intoto.signed"))?;

        let materials = signed
            .materials
            .ok_or(TranslateError::MissingField("intoto.signed.materials"))?
            .into_entries();
        let products = signed
            .products
            .ok_or(TranslateError::MissingField("intoto.signed.products"))?
            .into_entries();
        let command = signed
            .command
            .ok_or(TranslateError::MissingField("intoto.signed.command"))?;

        Ok(Self {
            resource,
            note_name,
            kind,
            intoto: IntotoDetails {
                signatures: intoto.signatures,
                signed: LinkPayload {
                    materials,
                    products,
                    command,
                    byproducts: signed.byproducts.unwrap_or_default(),
                    environment: signed.environment.unwrap_or_default(),
                },
            },
        })
    }

    /// Serialize to compact wire JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::Serialize`] on serialization failure.
    pub fn to_json(&self) -> Result<String, TranslateError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Load an occurrence from a JSON file.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Occurrence::from_json`], plus
    /// [`TranslateError::Io`].
    pub fn load(path: &Path) -> Result<Self, TranslateError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    /// Write this occurrence to a pretty-printed JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`TranslateError::Io`] or [`TranslateError::Serialize`].
    pub fn dump(&self, path: &Path) -> Result<(), TranslateError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
