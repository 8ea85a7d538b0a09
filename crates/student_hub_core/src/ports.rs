//! crates/student_hub_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the Superbrain core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like the
//! document store, blob storage, or the generation API.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{ChatTurn, Document};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy for all port operations.
///
/// Listing and blob failures degrade where tolerable (the aggregator proceeds
/// with fewer documents); generation failures always surface to the caller.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Document store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("Generation API failure: {0}")]
    GenerationFailed(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Typed Generation Request
//=========================================================================================

/// A structured request to the generation API.
///
/// Replaces free-form prompt concatenation: the grounding text and the turn
/// history are explicit fields, and the persona/style instructions live in
/// adapter configuration rather than in the request itself.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The grounding text constraining the answer to known sources. Already
    /// truncated to the model-input budget by the session manager.
    pub grounding: String,
    /// The ordered transcript; the last entry is the new user turn.
    pub history: Vec<ChatTurn>,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Read-only query access to the remote document collection.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns all documents with status `published`, optionally restricted to
    /// one subject. No side effects; always safe to retry. No ordering
    /// guarantee is required across calls (the aggregator re-derives order
    /// deterministically).
    async fn list_published(&self, subject: Option<&str>) -> PortResult<Vec<Document>>;

    /// Point lookup by id.
    async fn get_document(&self, document_id: Uuid) -> PortResult<Document>;
}

/// Fetch-by-reference access to blob storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn fetch(&self, blob_ref: &str) -> PortResult<Vec<u8>>;

    async fn delete(&self, blob_ref: &str) -> PortResult<()>;
}

/// Page-by-page text extraction from raw document bytes.
///
/// The output preserves `--- Page N ---` boundary markers so downstream
/// consumers can cite page numbers.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, bytes: &[u8]) -> PortResult<String>;
}

/// A generative-text API taking a grounding preamble plus an ordered turn
/// history. May fail (quota, network, malformed input) and must be treated as
/// unreliable.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> PortResult<String>;
}
