//! Candidate terminators and the accumulator the response matcher fills.

use heapless::Vec;

/// Capacity of the response accumulator. Once full, the oldest bytes are
/// shifted out so the tail used for matching stays intact.
pub const RESPONSE_BUFFER_SIZE: usize = 256;

pub const OK: &[u8] = b"OK\r\n";
pub const ERROR: &[u8] = b"ERROR\r\n";

/// Up to five terminal patterns a reply may end with.
///
/// Matching reports the 1-based index of the first pattern the accumulated
/// text ends with. Unset slots never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expect<'a> {
    patterns: [Option<&'a [u8]>; 5],
}

impl Default for Expect<'_> {
    fn default() -> Self {
        Self::new([Some(OK), Some(ERROR), None, None, None])
    }
}

impl<'a> Expect<'a> {
    pub const fn new(patterns: [Option<&'a [u8]>; 5]) -> Self {
        Self { patterns }
    }

    /// No terminator at all. Only notifications are processed.
    pub const fn nothing() -> Self {
        Self::new([None; 5])
    }

    /// `pattern` as index 1, with `ERROR` kept as index 2.
    pub const fn reply(pattern: &'a [u8]) -> Self {
        Self::new([Some(pattern), Some(ERROR), None, None, None])
    }

    /// Pattern at the 1-based `index`.
    pub fn pattern(&self, index: usize) -> Option<&'a [u8]> {
        *self.patterns.get(index.checked_sub(1)?)?
    }

    pub fn matches(&self, data: &[u8]) -> Option<usize> {
        self.patterns
            .iter()
            .position(|p| matches!(p, Some(p) if !p.is_empty() && data.ends_with(p)))
            .map(|i| i + 1)
    }
}

/// Accumulator of unmatched reply text.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    data: Vec<u8, RESPONSE_BUFFER_SIZE>,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, byte: u8) {
        if self.data.is_full() {
            self.data.remove(0);
        }
        // Cannot fail, a slot was freed above.
        self.data.push(byte).ok();
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Accumulated text without surrounding whitespace.
    pub fn trimmed(&self) -> &[u8] {
        let start = self
            .data
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(self.data.len());
        let end = self
            .data
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .map_or(start, |i| i + 1);
        &self.data[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(buf: &mut ResponseBuffer, bytes: &[u8]) {
        for b in bytes {
            buf.push(*b);
        }
    }

    #[test]
    fn default_expects_ok_then_error() {
        let expect = Expect::default();
        assert_eq!(expect.matches(b"\r\nOK\r\n"), Some(1));
        assert_eq!(expect.matches(b"\r\nERROR\r\n"), Some(2));
        assert_eq!(expect.matches(b"\r\nOK\r"), None);
        assert_eq!(expect.pattern(2), Some(ERROR));
        assert_eq!(expect.pattern(0), None);
        assert_eq!(expect.pattern(3), None);
    }

    #[test]
    fn unset_slots_never_match() {
        let expect = Expect::nothing();
        assert_eq!(expect.matches(b""), None);
        assert_eq!(expect.matches(b"\r\nOK\r\n"), None);

        let expect = Expect::new([None, Some(b""), None, Some(b"+CSOC: "), None]);
        assert_eq!(expect.matches(b"anything"), None);
        assert_eq!(expect.matches(b"\r\n+CSOC: "), Some(4));
    }

    #[test]
    fn first_matching_pattern_wins() {
        let expect = Expect::new([Some(b"B\r\n"), Some(b"AB\r\n"), None, None, None]);
        assert_eq!(expect.matches(b"xAB\r\n"), Some(1));
    }

    #[test]
    fn accumulator_keeps_tail() {
        let mut buf = ResponseBuffer::new();
        for _ in 0..RESPONSE_BUFFER_SIZE {
            buf.push(b'x');
        }
        fill(&mut buf, b"OK\r\n");
        assert_eq!(buf.as_bytes().len(), RESPONSE_BUFFER_SIZE);
        assert!(buf.as_bytes().ends_with(b"xOK\r\n"));
        assert_eq!(Expect::default().matches(buf.as_bytes()), Some(1));
    }

    #[test]
    fn trimmed_strips_whitespace() {
        let mut buf = ResponseBuffer::new();
        fill(&mut buf, b"\r\n  +CSQ: 9,0 \r\n");
        assert_eq!(buf.trimmed(), b"+CSQ: 9,0");
        buf.clear();
        fill(&mut buf, b"\r\n\r\n");
        assert_eq!(buf.trimmed(), b"");
    }
}
