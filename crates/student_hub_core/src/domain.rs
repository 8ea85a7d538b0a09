//! crates/student_hub_core/src/domain.rs
//!
//! Defines the pure, core data structures for the Superbrain feature.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A content hash uniquely identifying a document's bytes.
///
/// The fingerprint never changes for a given document id; replacing the
/// underlying content creates a new document id in this system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Computes the fingerprint of a byte slice (lowercase hex SHA-256).
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Wraps an already-computed hex digest, e.g. one read back from the store.
    pub fn from_hex(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The publication status of a study resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentStatus {
    Raw,
    Published,
    Rejected,
}

impl DocumentStatus {
    /// The lowercase string form used by the document store.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Raw => "raw",
            DocumentStatus::Published => "published",
            DocumentStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "raw" => Some(DocumentStatus::Raw),
            "published" => Some(DocumentStatus::Published),
            "rejected" => Some(DocumentStatus::Rejected),
            _ => None,
        }
    }
}

/// Represents a published (or pending) study resource.
///
/// `extracted_text` is present and non-empty only if the status is
/// `Published` and extraction succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub unit: Option<String>,
    /// Opaque reference into blob storage (URL or handle).
    pub blob_ref: String,
    pub fingerprint: Fingerprint,
    pub status: DocumentStatus,
    pub extracted_text: Option<String>,
    pub text_length: Option<usize>,
}

/// The outcome of a single extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionOutcome {
    Success,
    TooShort,
    Failure,
}

/// The cached result of extracting one document's text.
///
/// At most one entry exists per document id, and an entry is immutable once
/// written. Re-extraction only occurs if the fingerprint changes, which in
/// this system implies a new document id, so entries are write-once.
#[derive(Debug, Clone)]
pub struct ExtractionEntry {
    pub document_id: Uuid,
    pub fingerprint: Fingerprint,
    pub text: String,
    pub char_count: usize,
    pub outcome: ExtractionOutcome,
    pub extracted_at: DateTime<Utc>,
}

/// A derived, disposable "whole library" grounding context.
///
/// Built from the current published set plus the extraction cache; rebuilt,
/// never mutated in place.
#[derive(Debug, Clone)]
pub struct AggregatedContext {
    pub text: String,
    pub included: usize,
    pub excluded_for_failure: usize,
    pub excluded_too_short: usize,
    pub excluded_for_budget: usize,
    pub built_at: DateTime<Utc>,
    /// The full published id set this context was built from, for staleness
    /// detection (not just the ids that fit the budget).
    pub source_ids: BTreeSet<Uuid>,
}

impl AggregatedContext {
    /// Returns true if the published set has changed since this context was
    /// built (new publish, deletion, or un-publish).
    pub fn is_stale(&self, current_ids: &BTreeSet<Uuid>) -> bool {
        self.source_ids != *current_ids
    }
}

/// The author of one chat transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnRole {
    User,
    Assistant,
}

/// A single entry in a chat session's ordered transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
        }
    }
}
