//! Client wrappers for project discussion endpoints. Ownership and ordering are
//! enforced by the backend; these calls only compose requests.

use super::types::{BodyPayload, Discussion, Reply};
use crate::client::{ApiClient, ApiError, RequestOptions};
use std::sync::Arc;
use url::form_urlencoded;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct DiscussionsClient {
    client: Arc<ApiClient>,
}

impl DiscussionsClient {
    #[must_use]
    pub const fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// # Errors
    /// Propagates any `ApiError` from the request.
    pub async fn list(&self, project_id: &str) -> Result<Vec<Discussion>, ApiError> {
        self.client
            .request(&discussions_path(project_id), RequestOptions::get())
            .await
    }

    /// # Errors
    /// Propagates any `ApiError` from the request.
    pub async fn create(&self, project_id: &str, body: &str) -> Result<Discussion, ApiError> {
        self.client
            .request(
                &discussions_path(project_id),
                RequestOptions::post(&BodyPayload { body })?,
            )
            .await
    }

    /// # Errors
    /// Propagates any `ApiError` from the request.
    pub async fn reply(
        &self,
        project_id: &str,
        discussion_id: Uuid,
        body: &str,
    ) -> Result<Reply, ApiError> {
        let path = format!("{}/{discussion_id}/replies", discussions_path(project_id));
        self.client
            .request(&path, RequestOptions::post(&BodyPayload { body })?)
            .await
    }

    /// Deletes a discussion or a reply; both share the same endpoint.
    ///
    /// # Errors
    /// Propagates any `ApiError` from the request.
    pub async fn delete(&self, project_id: &str, discussion_id: Uuid) -> Result<(), ApiError> {
        let path = format!("{}/{discussion_id}", discussions_path(project_id));
        self.client.request(&path, RequestOptions::delete()).await
    }
}

fn discussions_path(project_id: &str) -> String {
    format!("/api/projects/{}/discussions", path_segment(project_id.trim()))
}

/// Percent-encodes one path segment so `/`, `?` and `#` stay inside it.
fn path_segment(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
