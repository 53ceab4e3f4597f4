use std::path::Path;

use lopdf::Document;
use tracing::{debug, warn};

use docrag_core::traits::TextExtractor;
use docrag_core::{Error, Result};

/// Page-by-page PDF text extraction.
///
/// Pages are concatenated in page order without a separator. A page whose text
/// cannot be decoded contributes an empty string instead of failing the
/// document.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self { Self }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let doc = Document::load(path).map_err(|e| Error::document_read(path, e))?;
        let pages = doc.get_pages();
        let mut all_text = String::new();
        let mut empty_pages = 0usize;
        // BTreeMap keys iterate in page-number order.
        for page_number in pages.keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => {
                    if text.trim().is_empty() {
                        empty_pages += 1;
                    }
                    all_text.push_str(&text);
                }
                Err(e) => {
                    warn!(path = %path.display(), page = page_number, error = %e, "no extractable text on page");
                    empty_pages += 1;
                }
            }
        }
        debug!(path = %path.display(), pages = pages.len(), empty_pages, chars = all_text.chars().count(), "extracted pdf text");
        Ok(all_text)
    }
}
