//! Fixed-size document chunking.
//!
//! Splits extracted text into consecutive slices of at most `size`
//! characters (Unicode scalar values). No overlap, no boundary awareness:
//! concatenating the chunks reproduces the input exactly.

/// Default characters per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1500;

/// A restartable iterator over fixed-size chunks of a borrowed text.
///
/// Cloning the iterator restarts from the clone point without re-reading
/// anything.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    size: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let end = self
            .rest
            .char_indices()
            .nth(self.size)
            .map(|(byte, _)| byte)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}

/// Chunk `text` into slices of at most `size` characters.
///
/// Empty or whitespace-only input yields nothing. A `size` of zero is
/// treated as one so the iterator always makes progress.
pub fn chunk_text(text: &str, size: usize) -> Chunks<'_> {
    let rest = if text.trim().is_empty() { "" } else { text };
    Chunks {
        rest,
        size: size.max(1),
    }
}
