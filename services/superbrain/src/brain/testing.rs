//! services/superbrain/src/brain/testing.rs
//!
//! Hand-rolled mock implementations of the core ports, shared by the brain
//! unit tests. Call counters use atomics so tests can assert on how much I/O
//! actually happened.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

use student_hub_core::domain::{Document, DocumentStatus, Fingerprint};
use student_hub_core::ports::{
    BlobStore, DocumentStore, GenerationRequest, GenerationService, PortError, PortResult,
    TextExtractor,
};

/// Builds a published document whose blob reference is derived from its id.
pub fn published_doc(
    title: &str,
    subject: &str,
    unit: Option<&str>,
    text: String,
) -> Document {
    let id = Uuid::new_v4();
    Document {
        id,
        title: title.to_string(),
        subject: subject.to_string(),
        unit: unit.map(str::to_string),
        blob_ref: format!("blob://{}", id),
        fingerprint: Fingerprint::of_bytes(text.as_bytes()),
        status: DocumentStatus::Published,
        text_length: Some(text.chars().count()),
        extracted_text: Some(text),
    }
}

//=========================================================================================
// Document Store
//=========================================================================================

pub struct MockDocumentStore {
    docs: Mutex<Vec<Document>>,
    fail_listing: Mutex<bool>,
}

impl MockDocumentStore {
    pub fn new(docs: Vec<Document>) -> Self {
        Self {
            docs: Mutex::new(docs),
            fail_listing: Mutex::new(false),
        }
    }

    pub fn publish(&self, doc: Document) {
        self.docs.lock().unwrap().push(doc);
    }

    pub fn remove(&self, id: Uuid) {
        self.docs.lock().unwrap().retain(|d| d.id != id);
    }

    pub fn fail_listing(&self, fail: bool) {
        *self.fail_listing.lock().unwrap() = fail;
    }

    pub fn current_ids(&self) -> BTreeSet<Uuid> {
        self.docs.lock().unwrap().iter().map(|d| d.id).collect()
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn list_published(&self, subject: Option<&str>) -> PortResult<Vec<Document>> {
        if *self.fail_listing.lock().unwrap() {
            return Err(PortError::StoreUnavailable("mock outage".to_string()));
        }
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.status == DocumentStatus::Published)
            .filter(|d| subject.map_or(true, |s| d.subject == s))
            .cloned()
            .collect())
    }

    async fn get_document(&self, document_id: Uuid) -> PortResult<Document> {
        self.docs
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == document_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Document {} not found", document_id)))
    }
}

//=========================================================================================
// Blob Store
//=========================================================================================

pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    delay: Option<Duration>,
    pub fetch_count: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn empty() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            delay: None,
            fetch_count: AtomicUsize::new(0),
        }
    }

    pub fn with_doc(doc: &Document) -> Self {
        Self::with_docs(&[doc])
    }

    /// Seeds one blob per document, holding the document's extracted text as
    /// the raw bytes (the passthrough extractor returns them unchanged).
    pub fn with_docs(docs: &[&Document]) -> Self {
        let store = Self::empty();
        for doc in docs {
            store.add_doc(doc);
        }
        store
    }

    pub fn add_doc(&self, doc: &Document) {
        self.blobs.lock().unwrap().insert(
            doc.blob_ref.clone(),
            doc.extracted_text.clone().unwrap_or_default().into_bytes(),
        );
    }

    pub fn fetch_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn fetch(&self, blob_ref: &str) -> PortResult<Vec<u8>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.blobs
            .lock()
            .unwrap()
            .get(blob_ref)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Blob {} not found", blob_ref)))
    }

    async fn delete(&self, blob_ref: &str) -> PortResult<()> {
        self.blobs.lock().unwrap().remove(blob_ref);
        Ok(())
    }
}

//=========================================================================================
// Text Extractor
//=========================================================================================

enum ExtractorMode {
    /// Returns the blob bytes as UTF-8 text unchanged.
    Passthrough,
    /// Always fails, as a malformed document would.
    Failing,
}

pub struct CountingExtractor {
    mode: ExtractorMode,
    pub calls: AtomicUsize,
}

impl CountingExtractor {
    pub fn passthrough() -> Self {
        Self {
            mode: ExtractorMode::Passthrough,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            mode: ExtractorMode::Failing,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TextExtractor for CountingExtractor {
    async fn extract(&self, bytes: &[u8]) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            ExtractorMode::Passthrough => Ok(String::from_utf8_lossy(bytes).into_owned()),
            ExtractorMode::Failing => Err(PortError::ExtractionFailed(
                "mock parser rejected the bytes".to_string(),
            )),
        }
    }
}

//=========================================================================================
// Generation Service
//=========================================================================================

/// Answers every request with a fixed reply and records the last request.
pub struct ScriptedGeneration {
    answer: String,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl ScriptedGeneration {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            last_request: Mutex::new(None),
        }
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for ScriptedGeneration {
    async fn generate(&self, request: &GenerationRequest) -> PortResult<String> {
        *self.last_request.lock().unwrap() = Some(request.clone());
        Ok(self.answer.clone())
    }
}

/// Always fails, like a network outage or exhausted quota.
pub struct FailingGeneration;

#[async_trait]
impl GenerationService for FailingGeneration {
    async fn generate(&self, _request: &GenerationRequest) -> PortResult<String> {
        Err(PortError::GenerationFailed("mock network error".to_string()))
    }
}

/// Blocks inside `generate` until released, so tests can assert on in-flight
/// behavior (turn rejection, mid-turn close).
pub struct GatedGeneration {
    answer: String,
    called: Notify,
    release: Notify,
    pub calls: AtomicUsize,
}

impl GatedGeneration {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            called: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Waits until a `generate` call has started.
    pub async fn wait_until_called(&self) {
        if self.calls.load(Ordering::SeqCst) == 0 {
            self.called.notified().await;
        }
    }

    /// Lets the blocked `generate` call complete.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl GenerationService for GatedGeneration {
    async fn generate(&self, _request: &GenerationRequest) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.called.notify_one();
        self.release.notified().await;
        Ok(self.answer.clone())
    }
}
