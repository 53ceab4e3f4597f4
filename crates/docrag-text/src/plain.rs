use std::fs;
use std::path::Path;

use docrag_core::traits::TextExtractor;
use docrag_core::{Error, Result};

/// Reads a text file, replacing invalid UTF-8 sequences.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|e| Error::document_read(path, e))?;
        match String::from_utf8(bytes) {
            Ok(content) => Ok(content),
            Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        }
    }
}
