//! The Grafeas HTTP client.

use grafter_occurrence::Occurrence;
use tracing::debug;

use crate::error::TransportError;
use crate::models::{Note, Operation};

/// A client for one Grafeas server.
///
/// Stateless apart from the connection pool; cloning is cheap and clones
/// share the pool.
#[derive(Debug, Clone)]
pub struct GrafeasClient {
    http: reqwest::Client,
    base_url: String,
}

impl GrafeasClient {
    /// Create a client for the server at `base_url`
    /// (e.g. `http://localhost:8080`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    /// The v1alpha1 URL for a project-scoped path.
    fn url(&self, project_id: &str, path: &str) -> String {
        format!(
            "{}/v1alpha1/projects/{project_id}/{path}",
            self.base_url
        )
    }

    /// Create a note under the given project.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on any transport or decoding failure.
    pub async fn create_note(
        &self,
        project_id: &str,
        note: &Note,
    ) -> Result<Note, TransportError> {
        let url = self.url(project_id, "notes");
        debug!(%url, note = %note.name, "creating note");
        let response = self.http.post(&url).json(note).send().await?;
        let body = check_status(url, response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Store an occurrence under the given project.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on any transport or decoding failure.
    pub async fn create_occurrence(
        &self,
        project_id: &str,
        occurrence: &Occurrence,
    ) -> Result<Occurrence, TransportError> {
        let url = self.url(project_id, "occurrences");
        debug!(%url, note = %occurrence.note_name, "creating occurrence");
        let response = self.http.post(&url).json(occurrence).send().await?;
        let body = check_status(url, response).await?;
        Ok(Occurrence::from_json(&body)?)
    }

    /// Fetch one occurrence by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on any transport or decoding failure,
    /// including a structurally invalid occurrence body.
    pub async fn get_occurrence(
        &self,
        project_id: &str,
        occurrence_id: &str,
    ) -> Result<Occurrence, TransportError> {
        let url = self.url(project_id, &format!("occurrences/{occurrence_id}"));
        debug!(%url, "fetching occurrence");
        let response = self.http.get(&url).send().await?;
        let body = check_status(url, response).await?;
        Ok(Occurrence::from_json(&body)?)
    }

    /// Create an operation (used to store the supply-chain layout).
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on any transport or decoding failure.
    pub async fn create_operation(
        &self,
        project_id: &str,
        operation: &Operation,
    ) -> Result<Operation, TransportError> {
        let url = self.url(project_id, "operations");
        debug!(%url, operation = %operation.name, "creating operation");
        let response = self.http.post(&url).json(operation).send().await?;
        let body = check_status(url, response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Fetch one operation by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on any transport or decoding failure.
    pub async fn get_operation(
        &self,
        project_id: &str,
        operation_id: &str,
    ) -> Result<Operation, TransportError> {
        let url = self.url(project_id, &format!("operations/{operation_id}"));
        debug!(%url, "fetching operation");
        let response = self.http.get(&url).send().await?;
        let body = check_status(url, response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Turn a non-success response into a typed status error, otherwise hand
/// back the body text.
async fn check_status(url: String, response: reqwest::Response) -> Result<String, TransportError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(TransportError::Status {
            status: status.as_u16(),
            url,
            body,
        });
    }
    Ok(body)
}
