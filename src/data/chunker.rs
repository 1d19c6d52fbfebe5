// ============================================================
// Layer 4 — Token Window Chunker
// ============================================================
// Splits a long token sequence into overlapping windows.
//
// The QA model reads at most 384 tokens at once, and the
// question takes part of that budget. A long context is
// covered by sliding a window across its tokens, each window
// sharing `overlap` tokens with the previous one, so an answer
// near a boundary appears whole in at least one window.
//
// Example with chunk_size=5, overlap=2 over 10 tokens:
//   Window 1:  0..5
//   Window 2:  3..8
//   Window 3:  6..10   (last window, shorter)
//
// The stride (step between windows) = chunk_size - overlap
//
// Reference: Rust Book §8 (Slices)
//            Devlin et al. (2019) BERT paper - sliding window approach

use std::ops::Range;

pub struct Chunker {
    /// Maximum number of tokens per window
    chunk_size: usize,
    /// Number of tokens shared between adjacent windows
    overlap: usize,
}

impl Chunker {
    /// Create a new Chunker.
    ///
    /// # Panics
    /// Panics if overlap >= chunk_size (the stride would be 0)
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        assert!(
            overlap < chunk_size,
            "overlap ({}) must be less than chunk_size ({})",
            overlap,
            chunk_size
        );
        Self { chunk_size, overlap }
    }

    /// Index ranges of each window over a sequence of `len` tokens.
    /// Every index in 0..len is covered by at least one window.
    pub fn windows(&self, len: usize) -> Vec<Range<usize>> {
        if len == 0 {
            return Vec::new();
        }

        let stride = self.chunk_size - self.overlap;
        let mut windows = Vec::new();
        let mut start   = 0usize;

        loop {
            let end = (start + self.chunk_size).min(len);
            windows.push(start..end);
            if end == len {
                break;
            }
            start += stride;
        }

        windows
    }
}
