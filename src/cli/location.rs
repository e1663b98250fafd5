//! Location parsing for CLI commands

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::models::position::Position;

#[derive(Debug, Clone)]
pub struct ParsedLocation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl ParsedLocation {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            bail!("Location cannot be empty");
        }

        let (file_part, rest) = Self::split_path_and_position(input)?;
        let file = PathBuf::from(file_part);
        let (line, column) = Self::parse_position(rest)?;

        Ok(Self { file, line, column })
    }

    fn split_path_and_position(input: &str) -> Result<(&str, &str)> {
        let is_windows = input.len() > 2
            && input.as_bytes().get(1) == Some(&b':')
            && input.as_bytes().first().map(|b| b.is_ascii_alphabetic()) == Some(true);

        let search_start = if is_windows { 2 } else { 0 };
        let search_range = &input[search_start..];

        let mut potential_splits: Vec<(usize, bool)> = Vec::new(); // (position, is_negative)
        for (byte_idx, ch) in search_range.char_indices() {
            if ch == ':' {
                let abs_pos = search_start + byte_idx;
                let after = &input[abs_pos + 1..];
                let first_char = after.chars().next();
                match first_char {
                    Some(c) if c.is_ascii_digit() => potential_splits.push((abs_pos, false)),
                    Some('-') => potential_splits.push((abs_pos, true)),
                    _ => {}
                }
            }
        }

        if potential_splits.is_empty() {
            bail!(
                "Invalid location format. Expected: file:line[:column]\nExample: src/main.ts:10:5"
            )
        }

        let (split_pos, is_negative) = potential_splits[0];
        if is_negative {
            bail!(
                "Invalid line number: negative values not allowed. Line numbers are 1-indexed positive integers.\nExample: src/main.ts:10:5"
            )
        }

        Ok((&input[..split_pos], &input[split_pos + 1..]))
    }

    fn parse_position(rest: &str) -> Result<(u32, u32)> {
        let parts: Vec<&str> = rest.splitn(2, ':').collect();

        let line_str = parts.first().unwrap_or(&"");
        let line: u32 = line_str.parse().map_err(|_| {
            anyhow::anyhow!(
                "Invalid line number '{}': must be a positive integer (1-indexed)",
                line_str
            )
        })?;

        let column: u32 = if let Some(col_str) = parts.get(1) {
            col_str.parse().map_err(|_| {
                anyhow::anyhow!(
                    "Invalid column number '{}': must be a positive integer (1-indexed)",
                    col_str
                )
            })?
        } else {
            1
        };

        if line == 0 {
            bail!("Line number must be >= 1 (got 0). Line numbers are 1-indexed.");
        }
        if column == 0 {
            bail!("Column number must be >= 1 (got 0). Column numbers are 1-indexed.");
        }

        Ok((line, column))
    }

    /// 0-indexed engine position
    pub fn position(&self) -> Position {
        Position::from_cli(self.line, self.column)
    }

    /// Root-relative uri of the file, as tracked by the engine
    pub fn uri(&self, root: &Path) -> Result<String> {
        path_to_uri(&self.file, root)
    }
}

/// Root-relative, `/`-separated uri for a CLI path argument
pub fn path_to_uri(file: &Path, root: &Path) -> Result<String> {
    let relative = if file.is_absolute() {
        match file.strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => {
                let canonical_root = root
                    .canonicalize()
                    .context("Failed to resolve project root")?;
                let canonical = file
                    .canonicalize()
                    .map_err(|_| anyhow::anyhow!("File not found: {}", file.display()))?;
                canonical
                    .strip_prefix(&canonical_root)
                    .map(Path::to_path_buf)
                    .map_err(|_| {
                        anyhow::anyhow!(
                            "Access denied: {} is outside project boundary",
                            file.display()
                        )
                    })?
            }
        }
    } else {
        file.to_path_buf()
    };

    let mut parts: Vec<String> = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    bail!(
                        "Access denied: {} is outside project boundary",
                        file.display()
                    );
                }
            }
            Component::RootDir | Component::Prefix(_) => {}
        }
    }

    if parts.is_empty() {
        bail!("Not a source file: {}", file.display());
    }
    Ok(parts.join("/"))
}

impl std::fmt::Display for ParsedLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}
