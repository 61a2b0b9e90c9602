//! Accumulation buffer with tail-bounded prompt inspection.
//!
//! Devices can emit megabytes for a single command (full tables, whole
//! configurations). Prompt detection only ever looks at the last
//! `search_depth` bytes, so matching stays O(search_depth) regardless of
//! output size.

/// Buffer for accumulating shell output.
///
/// ANSI escape sequences are stripped at ingest, so everything downstream
/// (prompt detection, sanitization, the returned output) sees plain text.
#[derive(Debug)]
pub struct PatternBuffer {
    buffer: Vec<u8>,

    /// How many bytes from the end participate in prompt inspection.
    search_depth: usize,
}

impl PatternBuffer {
    /// Create a new buffer with the given tail inspection depth.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            search_depth,
        }
    }

    /// Append new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let cleaned = strip_ansi_escapes::strip(data);
        self.buffer.extend_from_slice(&cleaned);
    }

    /// The tail region as text (lossy UTF-8).
    pub fn tail(&self) -> std::borrow::Cow<'_, str> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        String::from_utf8_lossy(&self.buffer[start..])
    }

    /// The whole buffer as text (lossy UTF-8).
    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Take the contents as a string and reset the buffer.
    pub fn take_string(&mut self) -> String {
        String::from_utf8_lossy(&std::mem::take(&mut self.buffer)).into_owned()
    }

    /// Current buffer length in bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.as_str_lossy(), "Hello, world!");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mGreen text\x1b[0m");
        assert_eq!(buffer.as_str_lossy(), "Green text");
    }

    #[test]
    fn test_tail_is_depth_bounded() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nrouter#");
        let tail = buffer.tail();
        assert!(tail.len() <= 10);
        assert!(tail.ends_with("router#"));
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"test data");
        assert_eq!(buffer.take_string(), "test data");
        assert!(buffer.is_empty());
    }
}
