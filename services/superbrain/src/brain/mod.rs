//! services/superbrain/src/brain/mod.rs
//!
//! The Superbrain core: extraction cache, context aggregator, and chat
//! session manager, plus the facade that wires them together and keeps the
//! staleness-checked context per subject filter.

pub mod aggregator;
pub mod cache;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregator::{BuildOptions, ContextAggregator};
pub use cache::ExtractionCache;
pub use session::{ChatSession, ChatSettings, Grounding};

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use student_hub_core::domain::{AggregatedContext, Document, ExtractionEntry};
use student_hub_core::ports::{DocumentStore, PortResult};

/// The whole-library knowledge view.
///
/// Keeps one built context per subject filter and rebuilds it only when the
/// published set changes. Rebuilding from a live listing plus the cache, rather
/// than editing a long-lived blob incrementally, sidesteps stale-deletion bugs
/// at the cost of an O(n) rebuild only when staleness is detected.
pub struct Superbrain {
    store: Arc<dyn DocumentStore>,
    cache: Arc<ExtractionCache>,
    aggregator: ContextAggregator,
    options: BuildOptions,
    contexts: Mutex<HashMap<Option<String>, Arc<AggregatedContext>>>,
}

impl Superbrain {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<ExtractionCache>,
        extraction_concurrency: usize,
        options: BuildOptions,
    ) -> Self {
        let aggregator = ContextAggregator::new(store.clone(), cache.clone(), extraction_concurrency);
        Self {
            store,
            cache,
            aggregator,
            options,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the current context for a subject filter, rebuilding it first
    /// if the published set has changed since it was built.
    ///
    /// Listing ids is cheap relative to extraction, so the staleness probe
    /// runs per call; the expensive rebuild runs only when the sets differ.
    pub async fn context_for(&self, subject: Option<&str>) -> PortResult<Arc<AggregatedContext>> {
        let current_ids: BTreeSet<Uuid> = self
            .store
            .list_published(subject)
            .await?
            .into_iter()
            .map(|d| d.id)
            .collect();

        let key = subject.map(str::to_string);
        let mut contexts = self.contexts.lock().await;
        if let Some(context) = contexts.get(&key) {
            if !context.is_stale(&current_ids) {
                return Ok(context.clone());
            }
            info!(
                "Library context for subject {:?} is stale; rebuilding.",
                subject
            );
        }

        let context = Arc::new(self.aggregator.build(subject, &self.options).await);
        contexts.insert(key, context.clone());
        Ok(context)
    }

    /// Populates the extraction cache for a freshly approved document so the
    /// next aggregation build finds it already extracted.
    pub async fn prime_document(&self, document: &Document) -> Arc<ExtractionEntry> {
        self.cache.get_or_extract(document).await
    }

    /// Evicts a deleted document from the extraction cache. Cached contexts
    /// that referenced it go stale naturally through id-set comparison on the
    /// next `context_for` call.
    pub async fn evict_document(&self, document_id: Uuid) {
        self.cache.invalidate(document_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::testing::{published_doc, CountingExtractor, MemoryBlobStore, MockDocumentStore};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn superbrain_over(
        store: Arc<MockDocumentStore>,
        blobs: Arc<MemoryBlobStore>,
        extractor: Arc<CountingExtractor>,
    ) -> Superbrain {
        let cache = Arc::new(ExtractionCache::new(
            blobs,
            extractor,
            Duration::from_secs(30),
            50,
        ));
        Superbrain::new(store, cache, 4, BuildOptions::default())
    }

    #[tokio::test]
    async fn contexts_are_reused_until_the_published_set_changes() {
        let doc_a = published_doc("Optics", "Physics", None, "o".repeat(100));
        let store = Arc::new(MockDocumentStore::new(vec![doc_a.clone()]));
        let blobs = Arc::new(MemoryBlobStore::with_docs(&[&doc_a]));
        let extractor = Arc::new(CountingExtractor::passthrough());
        let brain = superbrain_over(store.clone(), blobs.clone(), extractor.clone());

        let first = brain.context_for(None).await.unwrap();
        let second = brain.context_for(None).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let doc_b = published_doc("Waves", "Physics", None, "w".repeat(100));
        blobs.add_doc(&doc_b);
        store.publish(doc_b);

        let third = brain.context_for(None).await.unwrap();
        assert!(!Arc::ptr_eq(&second, &third));
        assert_eq!(third.included, 2);
    }

    #[tokio::test]
    async fn priming_at_approval_time_spares_the_build_from_extracting() {
        let doc = published_doc("Optics", "Physics", None, "o".repeat(100));
        let store = Arc::new(MockDocumentStore::new(vec![doc.clone()]));
        let blobs = Arc::new(MemoryBlobStore::with_docs(&[&doc]));
        let extractor = Arc::new(CountingExtractor::passthrough());
        let brain = superbrain_over(store, blobs, extractor.clone());

        brain.prime_document(&doc).await;
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);

        let context = brain.context_for(None).await.unwrap();
        assert_eq!(context.included, 1);
        // The build hit the cache; no second extraction.
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn eviction_makes_the_cached_context_stale() {
        let doc_a = published_doc("Optics", "Physics", None, "o".repeat(100));
        let doc_b = published_doc("Waves", "Physics", None, "w".repeat(100));
        let store = Arc::new(MockDocumentStore::new(vec![doc_a.clone(), doc_b.clone()]));
        let blobs = Arc::new(MemoryBlobStore::with_docs(&[&doc_a, &doc_b]));
        let brain = superbrain_over(store.clone(), blobs, Arc::new(CountingExtractor::passthrough()));

        let before = brain.context_for(None).await.unwrap();
        assert_eq!(before.included, 2);

        store.remove(doc_b.id);
        brain.evict_document(doc_b.id).await;

        let after = brain.context_for(None).await.unwrap();
        assert_eq!(after.included, 1);
        assert!(!after.text.contains("Waves"));
    }
}
