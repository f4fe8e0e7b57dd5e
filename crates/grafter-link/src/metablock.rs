//! The signed wrapper around a link record.
//!
//! A `Metablock` pairs a link with the signatures accumulated over it. A
//! freshly generated link is unsigned; signatures are appended before
//! transmission and the signed body is immutable from then on.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LinkError;
use crate::link::Link;
use crate::signer::LocalSigner;

/// One signature over a link's signed body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Identifier of the signing key (SHA-256 of the SPKI public key).
    pub keyid: String,
    /// Base64-encoded signature bytes.
    pub sig: String,
}

/// A link record plus its signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metablock {
    /// The signed link body.
    pub signed: Link,
    /// One entry per signing identity; empty for a fresh link.
    pub signatures: Vec<Signature>,
}

impl Metablock {
    /// Wrap an unsigned link.
    #[must_use]
    pub fn new(signed: Link) -> Self {
        Self {
            signed,
            signatures: Vec::new(),
        }
    }

    /// The canonical byte payload that signatures cover: the compact JSON
    /// serialization of the signed body.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Serialize`] if the body cannot be serialized.
    pub fn payload(&self) -> Result<Vec<u8>, LinkError> {
        Ok(serde_json::to_vec(&self.signed)?)
    }

    /// Append a signature from the given signer.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Signing`] if the signing operation fails.
    pub fn sign(&mut self, signer: &LocalSigner) -> Result<(), LinkError> {
        let payload = self.payload()?;
        let signature = signer.sign(&payload)?;
        self.signatures.push(signature);
        Ok(())
    }

    /// Verify one of this metablock's signatures against a PEM public key.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::SignatureInvalid`] if no signature matches the
    /// key or the matching signature does not verify.
    pub fn verify(&self, keyid: &str, public_key_pem: &str) -> Result<(), LinkError> {
        let signature = self
            .signatures
            .iter()
            .find(|s| s.keyid == keyid)
            .ok_or_else(|| {
                LinkError::SignatureInvalid(format!("no signature with keyid `{keyid}`"))
            })?;
        let payload = self.payload()?;
        crate::signer::verify(&payload, &signature.sig, public_key_pem)
    }

    /// Load a metablock from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Io`] or [`LinkError::Serialize`].
    pub fn load(path: &Path) -> Result<Self, LinkError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write this metablock to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Io`] or [`LinkError::Serialize`].
    pub fn dump(&self, path: &Path) -> Result<(), LinkError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
