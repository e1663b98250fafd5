//! Infrastructure layer for Sightline
//!
//! Parsing, text indexing and filesystem discovery.

pub mod file_filter;
pub mod line_index;
pub mod syntax;
