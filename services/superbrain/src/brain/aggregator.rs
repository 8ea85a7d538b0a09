//! services/superbrain/src/brain/aggregator.rs
//!
//! Builds the bounded multi-document "whole library" context used to ground
//! chat answers. The context is a derived value: rebuilt from a live listing
//! plus the extraction cache whenever staleness is detected, never edited
//! incrementally.

use futures::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use student_hub_core::domain::{AggregatedContext, Document, ExtractionEntry, ExtractionOutcome};
use student_hub_core::ports::DocumentStore;

use crate::brain::cache::ExtractionCache;

/// Options for one aggregation build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Maximum number of characters in the assembled context. Enforced at
    /// document boundaries only, so the text never cuts a sentence.
    pub char_budget: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            char_budget: 400_000,
        }
    }
}

/// Assembles `AggregatedContext` values from the published document set.
pub struct ContextAggregator {
    store: Arc<dyn DocumentStore>,
    cache: Arc<ExtractionCache>,
    /// How many extractions may run simultaneously during one build.
    extraction_concurrency: usize,
}

impl ContextAggregator {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<ExtractionCache>,
        extraction_concurrency: usize,
    ) -> Self {
        Self {
            store,
            cache,
            extraction_concurrency: extraction_concurrency.max(1),
        }
    }

    /// Builds a bounded context over the current published set, optionally
    /// restricted to one subject.
    ///
    /// Concatenation order is deterministic, sorted by `(subject, unit,
    /// title)` ascending, so repeated builds over an unchanged set are
    /// byte-identical. Per-document failures never abort the build; a store
    /// listing failure degrades to an empty library and is logged.
    pub async fn build(&self, subject: Option<&str>, options: &BuildOptions) -> AggregatedContext {
        let mut documents = match self.store.list_published(subject).await {
            Ok(documents) => documents,
            Err(e) => {
                warn!("Listing published documents failed, proceeding with an empty library: {}", e);
                Vec::new()
            }
        };

        documents.sort_by(|a, b| {
            let key_a = (&a.subject, a.unit.as_deref().unwrap_or(""), &a.title);
            let key_b = (&b.subject, b.unit.as_deref().unwrap_or(""), &b.title);
            key_a.cmp(&key_b)
        });

        let source_ids: BTreeSet<Uuid> = documents.iter().map(|d| d.id).collect();

        // Fan out over the cache with bounded concurrency so aggregation
        // latency stays sub-linear in library size without overwhelming the
        // blob store or extraction engine.
        let entries: HashMap<Uuid, Arc<ExtractionEntry>> = stream::iter(documents.iter())
            .map(|document| async move {
                (document.id, self.cache.get_or_extract(document).await)
            })
            .buffer_unordered(self.extraction_concurrency)
            .collect()
            .await;

        let mut text = String::new();
        let mut running_chars = 0usize;
        let mut included = 0usize;
        let mut excluded_for_failure = 0usize;
        let mut excluded_too_short = 0usize;
        let mut excluded_for_budget = 0usize;
        let mut budget_exhausted = false;

        for document in &documents {
            let entry = &entries[&document.id];
            match entry.outcome {
                ExtractionOutcome::Failure => excluded_for_failure += 1,
                ExtractionOutcome::TooShort => excluded_too_short += 1,
                ExtractionOutcome::Success => {
                    let block = render_block(document, &entry.text);
                    let block_chars = block.chars().count();
                    if budget_exhausted || running_chars + block_chars > options.char_budget {
                        // Truncate at the document boundary; everything from
                        // the first overflow on is excluded for budget.
                        budget_exhausted = true;
                        excluded_for_budget += 1;
                    } else {
                        text.push_str(&block);
                        running_chars += block_chars;
                        included += 1;
                    }
                }
            }
        }

        info!(
            "Superbrain context built: {} documents merged, {} excluded (failure: {}, too short: {}, budget: {}).",
            included,
            excluded_for_failure + excluded_too_short + excluded_for_budget,
            excluded_for_failure,
            excluded_too_short,
            excluded_for_budget
        );

        AggregatedContext {
            text,
            included,
            excluded_for_failure,
            excluded_too_short,
            excluded_for_budget,
            built_at: chrono::Utc::now(),
            source_ids,
        }
    }
}

/// Wraps one document's text with a header identifying its title and unit, so
/// the model and any citation logic can attribute spans to a source.
fn render_block(document: &Document, text: &str) -> String {
    format!(
        "\n\n=== SOURCE DOCUMENT: {} (Unit: {}) ===\n{}",
        document.title,
        document.unit.as_deref().unwrap_or("General"),
        text
    )
}
