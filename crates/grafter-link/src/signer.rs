//! Local signing keys for link metadata.
//!
//! Links are signed with ECDSA P-256 via `aws-lc-rs`. The key identifier is
//! the SHA-256 hex digest of the SPKI-encoded public key, so the same key
//! always yields the same `keyid` across processes.

use std::path::Path;

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{
    ECDSA_P256_SHA256_ASN1, ECDSA_P256_SHA256_ASN1_SIGNING, EcdsaKeyPair, KeyPair, UnparsedPublicKey,
};
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::error::LinkError;
use crate::metablock::Signature;

/// The fixed size of the SPKI ASN.1 header for P-256 keys.
const P256_SPKI_HEADER_LEN: usize = 26;

/// A local ECDSA P-256 signing key.
///
/// Stored on disk as PEM-wrapped PKCS#8, created with mode `0o600`
/// (owner-only read/write).
pub struct LocalSigner {
    key_pair: EcdsaKeyPair,
    rng: SystemRandom,
}

impl LocalSigner {
    /// Load an existing key from `key_path`, or generate a new one if the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Key`] if the key file exists but cannot be
    /// parsed as PKCS#8, or cannot be created or written.
    pub fn load_or_generate(key_path: &Path) -> Result<Self, LinkError> {
        let rng = SystemRandom::new();

        if key_path.exists() {
            let pem = std::fs::read_to_string(key_path)
                .map_err(|e| LinkError::Key(format!("failed to read key file: {e}")))?;
            let der = pem_to_der(&pem)
                .ok_or_else(|| LinkError::Key("invalid PEM format".to_owned()))?;
            let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &der)
                .map_err(|e| LinkError::Key(format!("failed to parse PKCS#8 key: {e}")))?;

            tracing::info!(path = %key_path.display(), "loaded existing signing key");
            Ok(Self { key_pair, rng })
        } else {
            let pkcs8_doc = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
                .map_err(|e| LinkError::Key(format!("failed to generate key: {e}")))?;

            if let Some(parent) = key_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    LinkError::Key(format!(
                        "failed to create key directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }

            let pem = der_to_pem(pkcs8_doc.as_ref(), "PRIVATE KEY");
            std::fs::write(key_path, pem.as_bytes())
                .map_err(|e| LinkError::Key(format!("failed to write key file: {e}")))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let perms = std::fs::Permissions::from_mode(0o600);
                std::fs::set_permissions(key_path, perms).map_err(|e| {
                    LinkError::Key(format!("failed to set key file permissions: {e}"))
                })?;
            }

            let key_pair =
                EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8_doc.as_ref())
                    .map_err(|e| LinkError::Key(format!("failed to load generated key: {e}")))?;

            tracing::info!(path = %key_path.display(), "generated new signing key");
            Ok(Self { key_pair, rng })
        }
    }

    /// The key identifier: SHA-256 hex digest of the SPKI public key.
    #[must_use]
    pub fn keyid(&self) -> String {
        let spki = encode_p256_spki(self.key_pair.public_key().as_ref());
        let mut hasher = Sha256::new();
        hasher.update(&spki);
        hex::encode(hasher.finalize())
    }

    /// The public key as PEM-encoded SPKI.
    #[must_use]
    pub fn public_key_pem(&self) -> String {
        let spki = encode_p256_spki(self.key_pair.public_key().as_ref());
        der_to_pem(&spki, "PUBLIC KEY")
    }

    /// Sign a payload, producing a link-native `{keyid, sig}` signature.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Signing`] if the ECDSA operation fails.
    pub fn sign(&self, payload: &[u8]) -> Result<Signature, LinkError> {
        let sig = self
            .key_pair
            .sign(&self.rng, payload)
            .map_err(|e| LinkError::Signing(format!("ECDSA sign failed: {e}")))?;

        Ok(Signature {
            keyid: self.keyid(),
            sig: base64::engine::general_purpose::STANDARD.encode(sig.as_ref()),
        })
    }
}

/// Verify a base64 signature over `payload` with a PEM-encoded P-256 key.
///
/// # Errors
///
/// Returns [`LinkError::SignatureInvalid`] on any decoding or verification
/// failure.
pub fn verify(payload: &[u8], signature_b64: &str, public_key_pem: &str) -> Result<(), LinkError> {
    if signature_b64.is_empty() {
        return Err(LinkError::SignatureInvalid("empty signature".to_owned()));
    }

    let sig_bytes = base64::engine::general_purpose::STANDARD
        .decode(signature_b64)
        .map_err(|e| LinkError::SignatureInvalid(format!("invalid base64 signature: {e}")))?;

    let spki_der = pem_to_der(public_key_pem)
        .ok_or_else(|| LinkError::SignatureInvalid("invalid PEM public key".to_owned()))?;

    // Strip the SPKI header to get the raw EC point.
    if spki_der.len() <= P256_SPKI_HEADER_LEN {
        return Err(LinkError::SignatureInvalid(
            "public key DER too short for SPKI".to_owned(),
        ));
    }
    let raw_point = &spki_der[P256_SPKI_HEADER_LEN..];

    UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, raw_point)
        .verify(payload, &sig_bytes)
        .map_err(|e| LinkError::SignatureInvalid(format!("ECDSA verification failed: {e}")))
}

/// Default key path: `~/.config/grafter/keys/local.pem`.
pub fn default_key_path() -> std::path::PathBuf {
    directories::ProjectDirs::from("dev", "grafter", "grafter").map_or_else(
        || {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_owned());
            std::path::PathBuf::from(home).join(".config/grafter/keys/local.pem")
        },
        |dirs| dirs.config_dir().join("keys/local.pem"),
    )
}

// ── PEM helpers ──────────────────────────────────────────────────────

/// Wrap DER bytes in PEM with the given label.
///
/// # Panics
///
/// Cannot panic — base64 output is always valid ASCII.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    use std::fmt::Write;

    let b64 = base64::engine::general_purpose::STANDARD.encode(der);
    let mut pem = format!("-----BEGIN {label}-----\n");
    for chunk in b64.as_bytes().chunks(64) {
        pem.push_str(std::str::from_utf8(chunk).expect("base64 is ASCII"));
        pem.push('\n');
    }
    let _ = writeln!(pem, "-----END {label}-----");
    pem
}

/// Extract DER bytes from a PEM string.
pub fn pem_to_der(pem: &str) -> Option<Vec<u8>> {
    let mut b64 = String::new();
    let mut in_body = false;

    for line in pem.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("-----BEGIN ") {
            in_body = true;
            continue;
        }
        if trimmed.starts_with("-----END ") {
            break;
        }
        if in_body {
            b64.push_str(trimmed);
        }
    }

    base64::engine::general_purpose::STANDARD.decode(&b64).ok()
}

/// Encode a raw P-256 public key (uncompressed point, 65 bytes) as
/// `SubjectPublicKeyInfo` (SPKI) DER.
pub fn encode_p256_spki(pub_key: &[u8]) -> Vec<u8> {
    // Fixed SPKI header for a P-256 uncompressed public key:
    //   SEQUENCE { SEQUENCE { OID id-ecPublicKey, OID prime256v1 } BIT STRING }
    #[rustfmt::skip]
    const SPKI_HEADER: [u8; 26] = [
        0x30, 0x59,
        0x30, 0x13,
        0x06, 0x07,
        0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01,
        0x06, 0x08,
        0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07,
        0x03, 0x42, 0x00,
    ];

    let mut spki = Vec::with_capacity(SPKI_HEADER.len() + pub_key.len());
    spki.extend_from_slice(&SPKI_HEADER);
    spki.extend_from_slice(pub_key);
    spki
}
