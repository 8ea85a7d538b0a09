//! services/superbrain/src/adapters/pdf.rs
//!
//! This module contains the PDF text extraction adapter, the concrete
//! implementation of the `TextExtractor` port using `lopdf`.
//!
//! The `--- Page N ---` boundary markers are part of the contract: downstream
//! consumers rely on them to cite page numbers.

use async_trait::async_trait;
use lopdf::Document as PdfDocument;
use tokio::task::spawn_blocking;

use student_hub_core::ports::{PortError, PortResult, TextExtractor};

/// A text extractor for PDF bytes, running the parser on a blocking thread.
#[derive(Clone, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Page-by-page extraction. Pages that fail individually are skipped so a
    /// single bad page does not discard the rest of the document.
    fn extract_pages(bytes: &[u8]) -> PortResult<String> {
        let doc = PdfDocument::load_mem(bytes)
            .map_err(|e| PortError::ExtractionFailed(format!("Failed to load PDF: {}", e)))?;

        let mut full_text = String::new();
        for (page_num, _page_id) in doc.get_pages() {
            match doc.extract_text(&[page_num]) {
                Ok(page_text) => {
                    full_text.push_str(&format!("\n--- Page {} ---\n{}", page_num, page_text));
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable page {}: {}", page_num, e);
                }
            }
        }
        Ok(full_text)
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, bytes: &[u8]) -> PortResult<String> {
        let bytes = bytes.to_vec();
        spawn_blocking(move || Self::extract_pages(&bytes))
            .await
            .map_err(|e| PortError::Unexpected(format!("Extraction task panicked: {}", e)))?
    }
}
