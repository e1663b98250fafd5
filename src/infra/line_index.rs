//! Byte offset and line/column conversion

use std::sync::Arc;

use crate::models::position::{Position, Range};

/// Line start table of one file. Columns are UTF-8 byte counts.
#[derive(Debug, Clone)]
pub struct LineIndex {
    text: Arc<str>,
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: Arc<str>) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Length of `line` without its terminator (`\n` or `\r\n`)
    pub fn line_len(&self, line: usize) -> Option<usize> {
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        let content = &self.text.as_bytes()[start..end];
        Some(if content.ends_with(b"\r") {
            content.len() - 1
        } else {
            content.len()
        })
    }

    /// Byte offset of `pos`. `None` when the line does not exist or the column
    /// runs past the end of the line. An offset inside a multi-byte character
    /// is moved back to the character start.
    pub fn offset(&self, pos: Position) -> Option<usize> {
        let line = pos.line as usize;
        let column = pos.column as usize;
        if column > self.line_len(line)? {
            return None;
        }

        let mut offset = self.line_starts[line] + column;
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        Some(offset)
    }

    /// Position of a byte offset, clamped to the end of the text
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = self
            .line_starts
            .partition_point(|start| *start <= offset)
            .saturating_sub(1);
        Position::new(line as u32, (offset - self.line_starts[line]) as u32)
    }

    pub fn range(&self, start: usize, end: usize) -> Range {
        Range::new(self.position(start), self.position(end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(text: &str) -> LineIndex {
        LineIndex::new(Arc::from(text))
    }

    #[test]
    fn test_offsets_roundtrip_each_line() {
        let idx = index("let a;\nlet bb;\n\nfoo()");
        assert_eq!(idx.line_count(), 4);
        assert_eq!(idx.offset(Position::new(1, 4)), Some(11));
        assert_eq!(idx.position(11), Position::new(1, 4));
        assert_eq!(idx.offset(Position::new(2, 0)), Some(15));
        assert_eq!(idx.offset(Position::new(3, 5)), Some(21));
    }

    #[test]
    fn test_out_of_range() {
        let idx = index("ab\ncd");
        assert_eq!(idx.offset(Position::new(0, 2)), Some(2));
        assert_eq!(idx.offset(Position::new(0, 3)), None);
        assert_eq!(idx.offset(Position::new(2, 0)), None);
    }

    #[test]
    fn test_crlf_terminator_is_not_a_column() {
        let idx = index("ab\r\ncd");
        assert_eq!(idx.line_len(0), Some(2));
        assert_eq!(idx.offset(Position::new(0, 3)), None);
        assert_eq!(idx.offset(Position::new(1, 1)), Some(5));
    }

    #[test]
    fn test_multibyte_columns_are_bytes() {
        // "é" is two bytes
        let idx = index("é = 1");
        assert_eq!(idx.line_len(0), Some(6));
        assert_eq!(idx.offset(Position::new(0, 1)), Some(0));
        assert_eq!(idx.offset(Position::new(0, 2)), Some(2));
        assert_eq!(idx.position(3), Position::new(0, 3));
    }

    #[test]
    fn test_empty_text() {
        let idx = index("");
        assert_eq!(idx.line_count(), 1);
        assert_eq!(idx.offset(Position::new(0, 0)), Some(0));
        assert_eq!(idx.position(10), Position::new(0, 0));
    }
}
