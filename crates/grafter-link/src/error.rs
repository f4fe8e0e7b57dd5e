//! Error types for link metadata operations.

/// Errors from the link metadata subsystem.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The link record failed structural validation.
    #[error("link validation failed: {0}")]
    Validation(String),

    /// Failed to serialize or deserialize link metadata.
    #[error("failed to serialize link metadata: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Cryptographic key operation failed (load, generate, or parse).
    #[error("key error: {0}")]
    Key(String),

    /// Signing operation failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// A signature did not verify against the signed payload.
    #[error("signature verification failed: {0}")]
    SignatureInvalid(String),

    /// The step command could not be spawned.
    #[error("failed to execute step command `{command}`: {source}")]
    CommandFailed {
        /// The command that failed to spawn.
        command: String,
        /// The underlying OS error.
        source: std::io::Error,
    },

    /// I/O error during link operations.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),
}
