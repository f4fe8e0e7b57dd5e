//! Error types for occurrence translation.

use grafter_link::error::LinkError;

/// Errors from occurrence parsing and link translation.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// The wrong record kind was passed to a conversion entry point.
    #[error("invalid input record: {0}")]
    InvalidInput(String),

    /// The link failed structural validation before conversion.
    #[error(transparent)]
    Validation(#[from] LinkError),

    /// A byproduct value that must be an integer could not be parsed as one.
    #[error("byproduct `{key}` is not parseable as an integer: `{value}`")]
    MalformedByproducts {
        /// The offending byproduct key.
        key: String,
        /// The value that failed to parse.
        value: String,
    },

    /// A required sub-object is absent from the occurrence JSON.
    #[error("occurrence is missing required field `{0}`")]
    MissingField(&'static str),

    /// Failed to serialize or deserialize occurrence JSON.
    #[error("failed to serialize occurrence: {0}")]
    Serialize(#[from] serde_json::Error),

    /// I/O error during occurrence operations.
    #[error("occurrence I/O error: {0}")]
    Io(#[from] std::io::Error),
}
