//! docrag-text
//!
//! Text extraction from source documents. `PdfExtractor` reads PDFs page by
//! page; `PlainTextExtractor` handles `.txt`/`.md`; `ExtensionExtractor`
//! dispatches between them by file extension.

pub mod pdf;
pub mod plain;

use std::path::Path;

use docrag_core::traits::TextExtractor;
use docrag_core::{Error, Result};

pub use pdf::PdfExtractor;
pub use plain::PlainTextExtractor;

/// Picks an extractor from the lowercase file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExtensionExtractor {
    pdf: PdfExtractor,
    plain: PlainTextExtractor,
}

impl ExtensionExtractor {
    pub fn new() -> Self { Self::default() }
}

impl TextExtractor for ExtensionExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let ext = path.extension().and_then(|s| s.to_str()).map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => self.pdf.extract(path),
            Some("txt") | Some("md") => self.plain.extract(path),
            other => Err(Error::document_read(path, format!("unsupported file type {:?}", other.unwrap_or("")))),
        }
    }
}
