//! Read-only, line-indexed view of a source file.
//!
//! Everything upstream of edit application works against [`TextBuffer`], so
//! the rewrite core never touches the filesystem. Columns are byte offsets
//! within a line.

use serde::Serialize;

/// Line-oriented access to a text snapshot.
pub trait TextBuffer {
    /// Text of line `index`, without its line terminator.
    fn line_at(&self, index: usize) -> &str;

    /// Number of lines in the buffer.
    fn line_count(&self) -> usize;
}

/// A zero-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Half-open range `[start, end)` between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// True when the two ranges share at least one byte.
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Owned buffer built from a source string.
///
/// Keeps the byte offset of every line start so positions can be mapped back
/// onto the original text, including `\r\n` files.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    source: String,
    /// (start, end) byte offsets of each line's content, terminator excluded
    lines: Vec<(usize, usize)>,
}

impl LineBuffer {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let mut lines = Vec::new();
        let mut start = 0;

        for (idx, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                let mut end = idx;
                if end > start && source.as_bytes()[end - 1] == b'\r' {
                    end -= 1;
                }
                lines.push((start, end));
                start = idx + 1;
            }
        }
        lines.push((start, source.len()));

        Self { source, lines }
    }

    /// The full source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Byte offset of `position` in [`Self::source`].
    ///
    /// Returns `None` if the line does not exist or the column lies past the
    /// end of the line.
    pub fn offset_of(&self, position: Position) -> Option<usize> {
        let (start, end) = *self.lines.get(position.line)?;
        let offset = start + position.column;
        if offset > end || !self.source.is_char_boundary(offset) {
            return None;
        }
        Some(offset)
    }

    /// Text covered by `range`, if both ends map onto the source.
    pub fn slice(&self, range: Range) -> Option<&str> {
        let start = self.offset_of(range.start)?;
        let end = self.offset_of(range.end)?;
        self.source.get(start..end)
    }
}

impl TextBuffer for LineBuffer {
    fn line_at(&self, index: usize) -> &str {
        match self.lines.get(index) {
            Some(&(start, end)) => &self.source[start..end],
            None => "",
        }
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }
}

impl<'a> TextBuffer for [&'a str] {
    fn line_at(&self, index: usize) -> &str {
        self.get(index).copied().unwrap_or("")
    }

    fn line_count(&self) -> usize {
        self.len()
    }
}
