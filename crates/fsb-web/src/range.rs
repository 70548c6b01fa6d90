//! `Range: bytes=a-b` handling for file responses.

use std::sync::LazyLock;

use regex::Regex;

static BYTES_RANGE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^bytes=(\d*)-(\d*)$").ok());

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteRange {
    /// No usable range: serve everything with 200.
    Full,
    /// Inclusive byte offsets, already clamped to the file.
    Partial { start: u64, end: u64 },
    /// Starts at or past the end of the file: 416.
    Unsatisfiable,
}

impl ByteRange {
    pub fn len(&self, size: u64) -> u64 {
        match *self {
            ByteRange::Full => size,
            ByteRange::Partial { start, end } => end - start + 1,
            ByteRange::Unsatisfiable => 0,
        }
    }
}

/// An empty start means 0 and an empty end means the last byte. Anything
/// that does not parse is ignored.
pub fn parse_range(header: Option<&str>, size: u64) -> ByteRange {
    let Some(header) = header else {
        return ByteRange::Full;
    };
    if size == 0 {
        return ByteRange::Full;
    }
    let Some(caps) = BYTES_RANGE.as_ref().and_then(|re| re.captures(header.trim())) else {
        return ByteRange::Full;
    };

    let bound = |i: usize| -> Result<Option<u64>, ()> {
        match caps.get(i).map(|m| m.as_str()).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => s.parse().map(Some).map_err(|_| ()),
        }
    };
    let (Ok(start), Ok(end)) = (bound(1), bound(2)) else {
        return ByteRange::Full;
    };

    let start = start.unwrap_or(0);
    if start >= size {
        return ByteRange::Unsatisfiable;
    }
    let end = end.unwrap_or(size - 1).min(size - 1);
    if end < start {
        return ByteRange::Full;
    }
    ByteRange::Partial { start, end }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_or_garbage_serves_everything() {
        assert_eq!(parse_range(None, 100), ByteRange::Full);
        assert_eq!(parse_range(Some("items=0-10"), 100), ByteRange::Full);
        assert_eq!(parse_range(Some("bytes=a-b"), 100), ByteRange::Full);
        assert_eq!(parse_range(Some("bytes=0-1,5-6"), 100), ByteRange::Full);
        assert_eq!(parse_range(Some("bytes=50-10"), 100), ByteRange::Full);
        assert_eq!(parse_range(Some("bytes=99999999999999999999-"), 100), ByteRange::Full);
    }

    #[test]
    fn explicit_and_open_ended() {
        assert_eq!(parse_range(Some("bytes=0-9"), 100), ByteRange::Partial { start: 0, end: 9 });
        assert_eq!(parse_range(Some("bytes=90-"), 100), ByteRange::Partial { start: 90, end: 99 });
        assert_eq!(parse_range(Some("bytes=-9"), 100), ByteRange::Partial { start: 0, end: 9 });
        assert_eq!(parse_range(Some(" bytes=10-20 "), 100), ByteRange::Partial { start: 10, end: 20 });
    }

    #[test]
    fn end_is_clamped_to_the_file() {
        let r = parse_range(Some("bytes=50-500"), 100);
        assert_eq!(r, ByteRange::Partial { start: 50, end: 99 });
        assert_eq!(r.len(100), 50);
    }

    #[test]
    fn start_past_end_is_unsatisfiable() {
        assert_eq!(parse_range(Some("bytes=100-"), 100), ByteRange::Unsatisfiable);
        assert_eq!(parse_range(Some("bytes=150-200"), 100), ByteRange::Unsatisfiable);
    }

    #[test]
    fn empty_file_ignores_ranges() {
        assert_eq!(parse_range(Some("bytes=0-0"), 0), ByteRange::Full);
    }
}
