//! Artifact publishing abstraction

use crate::domain::Result;
use async_trait::async_trait;
use url::Url;

/// Content type of every published report
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Uploads finished artifacts to object storage
#[async_trait]
pub trait ArtifactPublisher: Send + Sync {
    /// Upload `content` as `container/blob_name`, replacing any existing blob
    ///
    /// Publishing is idempotent: retrying simply uploads the full content
    /// again. The blob's content type is set to `content_type`.
    ///
    /// # Returns
    ///
    /// The blob's URI (without any credentials).
    async fn publish(
        &self,
        container: &str,
        blob_name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<Url>;
}
