//! Error types for the Grafeas RPC boundary.

use grafter_occurrence::TranslateError;

/// Errors from Grafeas store calls.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP request itself failed (connect, timeout, TLS).
    #[error("request to grafeas server failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("grafeas server returned {status} for {url}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The request URL.
        url: String,
        /// Response body, as returned by the server.
        body: String,
    },

    /// A response body could not be decoded.
    #[error("failed to decode grafeas response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A fetched occurrence was structurally invalid.
    #[error("invalid occurrence in response: {0}")]
    Payload(#[from] TranslateError),
}
