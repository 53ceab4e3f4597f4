//! Fixed-width character windowing.
//!
//! Units are Unicode scalar values, not tokens or bytes. There is no sentence
//! or paragraph awareness.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::Chunk;

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_OVERLAP: usize = 50;

/// A validated `(chunk_size, overlap)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self { Self { chunk_size: DEFAULT_CHUNK_SIZE, overlap: DEFAULT_OVERLAP } }
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        validate(chunk_size, overlap)?;
        Ok(Self { chunk_size, overlap })
    }

    pub fn chunk_size(&self) -> usize { self.chunk_size }

    pub fn overlap(&self) -> usize { self.overlap }

    pub fn split(&self, text: &str) -> Vec<String> { windows(text, self.chunk_size, self.overlap) }

    /// Chunk records for one document, numbered in emission order.
    pub fn chunks_for(&self, source: &Path, text: &str) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(i, piece)| Chunk::new(source, i, piece))
            .collect()
    }
}

/// Split `text` into overlapping windows of at most `chunk_size` characters.
///
/// Windows start every `chunk_size - overlap` characters; each is trimmed and
/// empty results are dropped.
pub fn chunk(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    validate(chunk_size, overlap)?;
    Ok(windows(text, chunk_size, overlap))
}

fn validate(chunk_size: usize, overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(Error::config("chunk_size must be greater than zero"));
    }
    if overlap >= chunk_size {
        return Err(Error::config(format!(
            "overlap ({}) must be smaller than chunk_size ({})",
            overlap, chunk_size
        )));
    }
    Ok(())
}

fn windows(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    // Byte offset of every char boundary, plus the end of the string.
    let bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let len = bounds.len() - 1;
    let step = chunk_size - overlap;

    let mut out = Vec::with_capacity(len / step + 1);
    let mut start = 0usize;
    while start < len {
        let end = start.saturating_add(chunk_size).min(len);
        let piece = text[bounds[start]..bounds[end]].trim();
        if !piece.is_empty() {
            out.push(piece.to_string());
        }
        start = start.saturating_add(step);
    }
    out
}
