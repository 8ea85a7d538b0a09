//! services/superbrain/src/adapters/store.rs
//!
//! This module contains the document store adapter, the concrete
//! implementation of the `DocumentStore` port from the `core` crate. It reads
//! the document collection from PostgreSQL using `sqlx`.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use student_hub_core::domain::{Document, DocumentStatus, Fingerprint};
use student_hub_core::ports::{DocumentStore, PortError, PortResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A read-only document store adapter backed by PostgreSQL.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Creates a new `PgDocumentStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct DocumentRecord {
    id: Uuid,
    title: String,
    subject: String,
    unit: Option<String>,
    blob_ref: String,
    fingerprint: String,
    status: String,
    extracted_text: Option<String>,
    text_length: Option<i32>,
}

impl DocumentRecord {
    fn to_domain(self) -> PortResult<Document> {
        let status = DocumentStatus::parse(&self.status).ok_or_else(|| {
            PortError::Unexpected(format!(
                "Document {} has unknown status '{}'",
                self.id, self.status
            ))
        })?;
        Ok(Document {
            id: self.id,
            title: self.title,
            subject: self.subject,
            unit: self.unit,
            blob_ref: self.blob_ref,
            fingerprint: Fingerprint::from_hex(self.fingerprint),
            status,
            extracted_text: self.extracted_text,
            text_length: self.text_length.map(|n| n as usize),
        })
    }
}

const DOCUMENT_COLUMNS: &str =
    "id, title, subject, unit, blob_ref, fingerprint, status, extracted_text, text_length";

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn list_published(&self, subject: Option<&str>) -> PortResult<Vec<Document>> {
        let records: Vec<DocumentRecord> = match subject {
            Some(subject) => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM documents WHERE status = 'published' AND subject = $1",
                    DOCUMENT_COLUMNS
                ))
                .bind(subject)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {} FROM documents WHERE status = 'published'",
                    DOCUMENT_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| PortError::StoreUnavailable(e.to_string()))?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_document(&self, document_id: Uuid) -> PortResult<Document> {
        let record: DocumentRecord = sqlx::query_as(&format!(
            "SELECT {} FROM documents WHERE id = $1",
            DOCUMENT_COLUMNS
        ))
        .bind(document_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Document {} not found", document_id))
            }
            _ => PortError::StoreUnavailable(e.to_string()),
        })?;

        record.to_domain()
    }
}
