//! Position, range and location types
//!
//! Positions are zero-based. Columns count UTF-8 code units from the start of
//! the line, consistently across the engine.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Position within a document (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Convert 1-indexed CLI input to a 0-indexed position
    pub fn from_cli(line: u32, column: u32) -> Self {
        Self {
            line: line.saturating_sub(1),
            column: column.saturating_sub(1),
        }
    }

    /// Convert to a 1-indexed display position
    pub fn to_display(&self) -> (u32, u32) {
        (self.line + 1, self.column + 1)
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.line, self.column).cmp(&(other.line, other.column))
    }
}

/// Range within a document, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Convert a single position to an empty range
    pub fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }
}

/// A file uri plus a source range
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub uri: String,
    pub range: Range,
}

impl Location {
    pub fn new(uri: impl Into<String>, range: Range) -> Self {
        Self {
            uri: uri.into(),
            range,
        }
    }

    /// Ordering key used when presenting several locations: `(uri, line, column)`
    pub fn sort_key(&self) -> (&str, u32, u32) {
        (&self.uri, self.range.start.line, self.range.start.column)
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key()
            .cmp(&other.sort_key())
            .then_with(|| self.range.end.cmp(&other.range.end))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, column) = self.range.start.to_display();
        write!(f, "{}:{}:{}", self.uri, line, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cli_is_zero_based() {
        assert_eq!(Position::from_cli(10, 5), Position::new(9, 4));
        assert_eq!(Position::from_cli(0, 0), Position::new(0, 0));
        assert_eq!(Position::new(9, 4).to_display(), (10, 5));
    }

    #[test]
    fn test_location_ordering() {
        let a = Location::new("a.ts", Range::point(Position::new(3, 0)));
        let b = Location::new("a.ts", Range::point(Position::new(1, 7)));
        let c = Location::new("b.ts", Range::point(Position::new(0, 0)));

        let mut locations = vec![c.clone(), a.clone(), b.clone()];
        locations.sort();
        assert_eq!(locations, vec![b, a, c]);
    }

    #[test]
    fn test_range_contains_is_half_open() {
        let range = Range::new(Position::new(0, 2), Position::new(0, 5));
        assert!(range.contains(Position::new(0, 2)));
        assert!(range.contains(Position::new(0, 4)));
        assert!(!range.contains(Position::new(0, 5)));
    }
}
