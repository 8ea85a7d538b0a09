//! services/superbrain/src/adapters/blob.rs
//!
//! This module contains the blob store adapter, the concrete implementation of
//! the `BlobStore` port. The surrounding app addresses blobs by opaque URL, so
//! this adapter is a thin HTTP client.

use async_trait::async_trait;
use tracing::warn;

use student_hub_core::ports::{BlobStore, PortError, PortResult};

/// A blob store adapter that fetches and deletes blobs over HTTP.
#[derive(Clone)]
pub struct HttpBlobStore {
    client: reqwest::Client,
}

impl HttpBlobStore {
    /// Creates a new `HttpBlobStore`.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn fetch(&self, blob_ref: &str) -> PortResult<Vec<u8>> {
        let response = self
            .client
            .get(blob_ref)
            .send()
            .await
            .map_err(|e| PortError::StoreUnavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PortError::NotFound(format!("Blob {} not found", blob_ref)));
        }
        let response = response
            .error_for_status()
            .map_err(|e| PortError::StoreUnavailable(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PortError::StoreUnavailable(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn delete(&self, blob_ref: &str) -> PortResult<()> {
        let response = self
            .client
            .delete(blob_ref)
            .send()
            .await
            .map_err(|e| PortError::StoreUnavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            // Already gone; deletion is idempotent from the caller's view.
            warn!("Blob {} was already deleted or not found.", blob_ref);
            return Ok(());
        }
        response
            .error_for_status()
            .map_err(|e| PortError::StoreUnavailable(e.to_string()))?;
        Ok(())
    }
}
