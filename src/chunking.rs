//! Overlapping text chunking for embedding
//!
//! Documents are cut into windows of at most `chunk_size` characters. Each
//! window ends at the best available boundary, tried in priority order:
//! paragraph break, line break, sentence end, whitespace, and finally a raw
//! character cut. Consecutive windows share exactly `chunk_overlap`
//! characters, so dropping the first `chunk_overlap` characters of every
//! chunk after the first and concatenating reconstructs the document.
//!
//! # Examples
//!
//! ```rust
//! use askrag::chunking::TextChunker;
//!
//! let chunker = TextChunker::new(40, 10);
//! let chunks = chunker.split("First paragraph.\n\nSecond paragraph is a little longer.");
//! assert_eq!(chunks[0], "First paragraph.\n\n");
//! ```

/// Split boundaries, highest priority first. Separators on one level compete on position.
const SEPARATOR_LEVELS: [&[&str]; 4] = [&["\n\n"], &["\n"], &[". ", "! ", "? "], &[" "]];

/// Default chunk size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between consecutive chunks in characters
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Splits text into overlapping, boundary-aware windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a chunker; sizes are counted in characters.
    ///
    /// A zero `chunk_size` is raised to 1 and an overlap that would stall the
    /// window is lowered to `chunk_size - 1`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub const fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into ordered overlapping chunks; empty text yields no chunks
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char index, plus the end of the text
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total_chars = offsets.len() - 1;

        let mut chunks = Vec::new();
        let mut start = 0;
        loop {
            let limit = (start + self.chunk_size).min(total_chars);
            if limit == total_chars {
                chunks.push(text[offsets[start]..].to_string());
                break;
            }

            let end = self.find_split(text, &offsets, start, limit);
            chunks.push(text[offsets[start]..offsets[end]].to_string());
            start = end - self.chunk_overlap;
        }

        chunks
    }

    /// Char index ending the chunk that starts at `start`.
    ///
    /// The end must lie past `start + chunk_overlap` so the next window advances.
    fn find_split(&self, text: &str, offsets: &[usize], start: usize, limit: usize) -> usize {
        let window_start = offsets[start];
        let window = &text[window_start..offsets[limit]];
        let min_end = start + self.chunk_overlap;

        for level in SEPARATOR_LEVELS {
            let last_boundary = level
                .iter()
                .filter_map(|sep| window.rfind(sep).map(|pos| window_start + pos + sep.len()))
                .max();

            if let Some(end_byte) = last_boundary {
                // Separators are ASCII, so `end_byte` is always a char boundary
                let end = offsets.partition_point(|&b| b < end_byte);
                if end > min_end {
                    return end;
                }
            }
        }

        limit
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}
