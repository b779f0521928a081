//! Source positions for QS scripts

#![allow(clippy::cast_possible_truncation)] // Script files over 4GB are not supported

use std::ops::Range;

/// A byte range in a QS source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Byte offset of the first byte
    pub start: u32,
    /// Byte offset one past the last byte
    pub end: u32,
}

impl Span {
    /// Create a span from byte offsets
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Span covering both `self` and `other`
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        let start = if self.start < other.start {
            self.start
        } else {
            other.start
        };
        let end = if self.end > other.end {
            self.end
        } else {
            other.end
        };
        Self { start, end }
    }

    /// Span used by nodes the polisher synthesizes
    #[must_use]
    pub const fn synthetic() -> Self {
        Self {
            start: u32::MAX,
            end: u32::MAX,
        }
    }

    /// True for spans created by [`Span::synthetic`]
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        self.start == u32::MAX && self.end == u32::MAX
    }

    #[must_use]
    pub const fn as_range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start as u32, range.end as u32)
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::synthetic()
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// 1-based line and column of a byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    /// Counted in characters, not bytes
    pub column: u32,
}

impl Location {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets of one source text to line/column locations
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<u32>,
    source: String,
}

impl LineIndex {
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .match_indices('\n')
                .map(|(i, _)| (i + 1) as u32),
        );
        Self {
            line_starts,
            source: source.to_string(),
        }
    }

    /// Location of a byte offset; offsets past the end clamp to the last line
    #[must_use]
    pub fn location(&self, offset: u32) -> Location {
        let offset = offset.min(self.source.len() as u32);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[line] as usize;
        let column = self
            .source
            .get(line_start..offset as usize)
            .map_or(0, |prefix| prefix.chars().count());
        Location {
            line: (line + 1) as u32,
            column: (column + 1) as u32,
        }
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_covers_both() {
        assert_eq!(Span::new(5, 10).merge(Span::new(8, 15)), Span::new(5, 15));
        assert_eq!(Span::new(8, 15).merge(Span::new(5, 10)), Span::new(5, 15));
    }

    #[test]
    fn synthetic_spans_are_flagged() {
        assert!(Span::synthetic().is_synthetic());
        assert!(!Span::new(0, 1).is_synthetic());
    }

    #[test]
    fn locations_across_lines() {
        let index = LineIndex::new("var a;\nvar b;\n");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.location(0), Location::new(1, 1));
        assert_eq!(index.location(4), Location::new(1, 5));
        assert_eq!(index.location(7), Location::new(2, 1));
    }

    #[test]
    fn columns_count_characters() {
        // "ñ" is two bytes in UTF-8
        let index = LineIndex::new("var ñ = 1;");
        assert_eq!(index.location(7), Location::new(1, 7));
    }
}
