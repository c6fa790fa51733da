//! Text extraction from uploaded documents.
//!
//! [`PdfTextExtractor`] is the only production extractor. The [`TextExtractor`]
//! trait exists so callers can plug in other formats or test doubles.

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::config::DEFAULT_MAX_DOCUMENT_BYTES;
use crate::error::{RagError, Result};

/// Magic bytes every PDF file starts with.
const PDF_MAGIC: &[u8] = b"%PDF-";

/// The content type accepted for uploads.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Text pulled from a document, one entry per page in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub pages: Vec<String>,
}

impl ExtractedText {
    /// Concatenate all pages, separated by a newline.
    pub fn text(&self) -> String {
        self.pages.join("\n")
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Whether the document yielded no readable characters at all.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|page| page.trim().is_empty())
    }
}

/// Extracts ordered plain text from raw document bytes.
pub trait TextExtractor: Send + Sync {
    /// Extract text from `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Extraction`] if the payload is not a readable
    /// document or yields no text.
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText>;
}

/// Extracts text from PDF documents using `pdf-extract`.
#[derive(Debug, Clone)]
pub struct PdfTextExtractor {
    max_bytes: usize,
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self { max_bytes: DEFAULT_MAX_DOCUMENT_BYTES }
    }
}

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject payloads larger than `max_bytes`.
    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText> {
        if bytes.is_empty() {
            return Err(RagError::Extraction("empty file uploaded".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(RagError::Extraction(format!(
                "document is {} bytes, limit is {} bytes",
                bytes.len(),
                self.max_bytes
            )));
        }
        if !bytes.starts_with(PDF_MAGIC) {
            return Err(RagError::Extraction("payload is not a PDF document".to_string()));
        }

        // pdf-extract panics on some malformed inputs instead of returning an error.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        }));

        let pages = match outcome {
            Ok(Ok(pages)) => pages,
            Ok(Err(e)) => {
                warn!(error = %e, "failed to parse PDF");
                return Err(RagError::Extraction(format!("could not parse PDF: {e}")));
            }
            Err(_) => {
                warn!("PDF parser panicked on malformed input");
                return Err(RagError::Extraction("could not parse PDF: malformed document".into()));
            }
        };

        let extracted = ExtractedText { pages };
        if extracted.is_blank() {
            return Err(RagError::Extraction("could not extract text from PDF".to_string()));
        }

        debug!(page_count = extracted.page_count(), byte_len = bytes.len(), "extracted PDF text");
        Ok(extracted)
    }
}

/// Whether an upload declares itself as a PDF, by content type or filename.
pub fn is_pdf_upload(filename: &str, content_type: Option<&str>) -> bool {
    let declared_pdf = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case(PDF_CONTENT_TYPE))
        .unwrap_or(false);
    declared_pdf || filename.to_ascii_lowercase().ends_with(".pdf")
}
