//! services/superbrain/src/brain/cache.rs
//!
//! The per-document extraction cache. Guarantees at most one extraction
//! attempt per document fingerprint and exposes the result for aggregation
//! without re-reading document bytes.
//!
//! This is the one piece of genuinely shared, mutable state in the core; all
//! mutation goes through `get_or_extract` / `invalidate`.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tracing::{info, warn};
use uuid::Uuid;

use student_hub_core::domain::{Document, ExtractionEntry, ExtractionOutcome, Fingerprint};
use student_hub_core::ports::{BlobStore, TextExtractor};

/// One cache slot: the fingerprint the entry was (or is being) extracted for,
/// plus the cell all concurrent callers await.
struct Slot {
    fingerprint: Fingerprint,
    cell: Arc<OnceCell<Arc<ExtractionEntry>>>,
}

/// A write-once cache of extracted document text, keyed by document id.
///
/// Concurrent `get_or_extract` calls for the same uncached id are coalesced
/// into a single extraction (single-flight); all callers receive the same
/// entry. Failures are recorded as entries, not raised, so one malformed
/// document can never abort an aggregate build.
pub struct ExtractionCache {
    blobs: Arc<dyn BlobStore>,
    extractor: Arc<dyn TextExtractor>,
    extraction_timeout: Duration,
    min_extracted_chars: usize,
    slots: Mutex<HashMap<Uuid, Slot>>,
}

impl ExtractionCache {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        extractor: Arc<dyn TextExtractor>,
        extraction_timeout: Duration,
        min_extracted_chars: usize,
    ) -> Self {
        Self {
            blobs,
            extractor,
            extraction_timeout,
            min_extracted_chars,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached entry for the document, extracting it first if
    /// necessary.
    ///
    /// A hit (existing entry with matching fingerprint) performs no I/O. A
    /// miss fetches the document bytes and runs page-by-page extraction under
    /// a per-document timeout; exactly one extraction runs no matter how many
    /// callers arrive concurrently.
    pub async fn get_or_extract(&self, document: &Document) -> Arc<ExtractionEntry> {
        let cell = {
            let mut slots = self.slots.lock().await;
            match slots.get(&document.id) {
                Some(slot) if slot.fingerprint == document.fingerprint => slot.cell.clone(),
                _ => {
                    // No slot, or the fingerprint changed (which should imply
                    // a new id; tolerate it by starting a fresh extraction).
                    let cell = Arc::new(OnceCell::new());
                    slots.insert(
                        document.id,
                        Slot {
                            fingerprint: document.fingerprint.clone(),
                            cell: cell.clone(),
                        },
                    );
                    cell
                }
            }
        };

        cell.get_or_init(|| self.extract_entry(document)).await.clone()
    }

    /// Removes the cached entry for a document. Called when a document is
    /// deleted; never called on edit-without-content-change (title/subject
    /// corrections do not invalidate extracted text).
    pub async fn invalidate(&self, document_id: Uuid) {
        if self.slots.lock().await.remove(&document_id).is_some() {
            info!("Evicted extraction cache entry for document {}.", document_id);
        }
    }

    /// Runs one extraction attempt and records the result as an entry.
    ///
    /// Never fails: extraction errors and timeouts become `Failure` entries
    /// with empty text. Automatic retries are deliberately absent; a
    /// moderator re-triggering approval is the only retry path.
    async fn extract_entry(&self, document: &Document) -> Arc<ExtractionEntry> {
        info!(
            "Extracting text for document {} ('{}').",
            document.id, document.title
        );

        let attempt = tokio::time::timeout(self.extraction_timeout, async {
            let bytes = self.blobs.fetch(&document.blob_ref).await?;
            self.extractor.extract(&bytes).await
        })
        .await;

        let (text, outcome) = match attempt {
            Err(_) => {
                warn!(
                    "Extraction for document {} timed out after {:?}.",
                    document.id, self.extraction_timeout
                );
                (String::new(), ExtractionOutcome::Failure)
            }
            Ok(Err(e)) => {
                warn!("Extraction for document {} failed: {}", document.id, e);
                (String::new(), ExtractionOutcome::Failure)
            }
            Ok(Ok(text)) => {
                if text.chars().count() > self.min_extracted_chars {
                    (text, ExtractionOutcome::Success)
                } else {
                    warn!(
                        "Extraction for document {} produced only {} characters; marking too short.",
                        document.id,
                        text.chars().count()
                    );
                    (text, ExtractionOutcome::TooShort)
                }
            }
        };

        Arc::new(ExtractionEntry {
            document_id: document.id,
            fingerprint: document.fingerprint.clone(),
            char_count: text.chars().count(),
            text,
            outcome,
            extracted_at: Utc::now(),
        })
    }
}
