//! Byte/character offset handling.
//!
//! Every offset reparto exposes is a **character** offset. The `regex` crate
//! reports byte offsets, so every pattern match passes through a
//! [`SpanConverter`] before it becomes an entity.
//!
//! ```text
//! Text:  "Ramírez vive"
//! bytes:  R a m í  r e z _ v i v e
//!         0 1 2 3-4 5 6 7 8 ...
//! chars:  0 1 2 3   4 5 6 7 8 ...
//! ```

/// Maps the byte offsets `regex` reports onto char offsets for one text.
///
/// Build once per document. ASCII text needs no table.
#[derive(Debug, Clone)]
pub struct SpanConverter {
    /// Byte offset where each char starts, plus `text.len()` at the end.
    /// Empty for ASCII.
    starts: Vec<usize>,
    len: usize,
}

impl SpanConverter {
    #[must_use]
    pub fn new(text: &str) -> Self {
        let starts = if text.is_ascii() {
            Vec::new()
        } else {
            text.char_indices()
                .map(|(b, _)| b)
                .chain(std::iter::once(text.len()))
                .collect()
        };
        Self {
            starts,
            len: text.len(),
        }
    }

    /// Char index of the char containing `byte`; past the end maps to the
    /// char count.
    #[must_use]
    pub fn char_at(&self, byte: usize) -> usize {
        let byte = byte.min(self.len);
        if self.starts.is_empty() {
            return byte;
        }
        self.starts.partition_point(|&s| s <= byte) - 1
    }

    /// Byte offset where char `idx` starts, clamped to the text length.
    #[must_use]
    pub fn byte_at(&self, idx: usize) -> usize {
        if self.starts.is_empty() {
            return idx.min(self.len);
        }
        self.starts.get(idx).copied().unwrap_or(self.len)
    }

    /// Byte range to char range.
    #[must_use]
    pub fn chars(&self, byte_start: usize, byte_end: usize) -> (usize, usize) {
        (self.char_at(byte_start), self.char_at(byte_end))
    }
}

/// Slice `text` by char offsets, clamping to the text.
#[must_use]
pub fn char_slice(text: &str, char_start: usize, char_end: usize) -> &str {
    if char_end <= char_start {
        return "";
    }
    let mut indices = text.char_indices().map(|(b, _)| b).chain(std::iter::once(text.len()));
    let start = indices.nth(char_start).unwrap_or(text.len());
    let end = indices
        .nth(char_end - char_start - 1)
        .unwrap_or(text.len());
    &text[start..end]
}

/// Window of `radius` chars either side of `[char_start, char_end)`.
#[must_use]
pub fn char_context(text: &str, char_start: usize, char_end: usize, radius: usize) -> &str {
    char_slice(
        text,
        char_start.saturating_sub(radius),
        char_end.saturating_add(radius),
    )
}
