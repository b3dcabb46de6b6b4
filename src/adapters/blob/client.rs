//! Azure Blob Storage publisher
//!
//! Uploads use the Put Blob REST operation as a single block blob, which the
//! service applies atomically. Requests are authorized either with a SAS
//! token or with an Azure AD bearer token from the client credentials flow.

use super::traits::ArtifactPublisher;
use crate::config::schema::{StorageAuthType, StorageConfig};
use crate::config::SecretString;
use crate::domain::{ExportError, Result};
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_identity::ClientSecretCredential;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";
const STORAGE_API_VERSION: &str = "2021-08-06";

enum BlobAuth {
    Sas(SecretString),
    Bearer(Arc<ClientSecretCredential>),
}

/// Azure Blob Storage implementation of [`ArtifactPublisher`]
pub struct AzureBlobPublisher {
    /// Blob service endpoint
    endpoint: Url,
    /// Request authorization
    auth: BlobAuth,
    /// HTTP client for API calls
    http_client: reqwest::Client,
}

impl AzureBlobPublisher {
    /// Create a new publisher from configuration
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Configuration` if the endpoint is invalid or the
    /// configured credentials are incomplete.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint_url()).map_err(|e| {
            ExportError::Configuration(format!("Invalid storage endpoint: {}", e))
        })?;

        let auth = match config.auth_type {
            StorageAuthType::Sas => {
                let token = config.sas_token.clone().ok_or_else(|| {
                    ExportError::Configuration(
                        "storage.sas_token is required when auth_type = 'sas'".to_string(),
                    )
                })?;
                BlobAuth::Sas(token)
            }
            StorageAuthType::ClientSecret => {
                let missing = |field: &str| {
                    ExportError::Configuration(format!(
                        "storage.{field} is required when auth_type = 'client_secret'"
                    ))
                };
                let tenant_id = config.tenant_id.as_ref().ok_or_else(|| missing("tenant_id"))?;
                let client_id = config.client_id.clone().ok_or_else(|| missing("client_id"))?;
                let client_secret = config
                    .client_secret
                    .as_ref()
                    .ok_or_else(|| missing("client_secret"))?;

                let secret = azure_core::credentials::Secret::new(
                    client_secret.expose_secret().as_str().to_string(),
                );
                let credential = ClientSecretCredential::new(tenant_id, client_id, secret, None)
                    .map_err(|e| {
                        ExportError::Configuration(format!(
                            "Failed to create Azure AD credential: {}",
                            e
                        ))
                    })?;
                BlobAuth::Bearer(credential)
            }
        };

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| {
                ExportError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::info!(endpoint = %endpoint, "Blob Storage publisher initialized");

        Ok(Self {
            endpoint,
            auth,
            http_client,
        })
    }

    /// URI of a blob, without credentials
    pub fn blob_url(&self, container: &str, blob_name: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ExportError::Configuration(format!(
                    "Storage endpoint cannot hold a path: {}",
                    self.endpoint
                ))
            })?
            .pop_if_empty()
            .push(container)
            .push(blob_name);
        Ok(url)
    }

    async fn get_access_token(credential: &ClientSecretCredential) -> Result<String> {
        let token = TokenCredential::get_token(credential, &[STORAGE_SCOPE], None)
            .await
            .map_err(|e| ExportError::Storage(format!("Failed to acquire Azure AD token: {}", e)))?;

        Ok(token.token.secret().to_string())
    }
}

/// Statuses worth another attempt: timeouts, throttling, server errors
fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
}

#[async_trait]
impl ArtifactPublisher for AzureBlobPublisher {
    async fn publish(
        &self,
        container: &str,
        blob_name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<Url> {
        let blob_url = self.blob_url(container, blob_name)?;
        let content_length = content.len();

        let mut request_url = blob_url.clone();
        let mut request = match &self.auth {
            BlobAuth::Sas(token) => {
                request_url.set_query(Some(token.expose_secret().as_str().trim_start_matches('?')));
                self.http_client.put(request_url)
            }
            BlobAuth::Bearer(credential) => {
                let token = Self::get_access_token(credential).await?;
                self.http_client
                    .put(request_url)
                    .header("Authorization", format!("Bearer {}", token))
            }
        };

        request = request
            .header("x-ms-version", STORAGE_API_VERSION)
            .header(
                "x-ms-date",
                chrono::Utc::now()
                    .format("%a, %d %b %Y %H:%M:%S GMT")
                    .to_string(),
            )
            .header("x-ms-blob-type", "BlockBlob")
            .header("x-ms-blob-content-type", content_type)
            .header("Content-Type", content_type)
            .body(content);

        let response = request.send().await.map_err(|e| {
            ExportError::Storage(format!("Failed to upload {}: {}", blob_url, e))
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(
                blob = %blob_url,
                bytes = content_length,
                status = %status,
                "Blob uploaded"
            );
            return Ok(blob_url);
        }

        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = format!(
            "Blob Storage returned status {} for {}: {}",
            status, blob_url, error_body
        );

        if is_retryable_status(status) {
            Err(ExportError::Storage(message))
        } else {
            Err(ExportError::Configuration(message))
        }
    }
}
