//! Fence markers
//!
//! Minimal types representing a classified line.
//! No state machine logic here - a marker does not know whether it opens or
//! closes a block.

use std::sync::LazyLock;

use regex::Regex;

use crate::parser::lexer::Line;

/// Three or more backticks followed by an info string without backticks
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(`{3,})([^`]*)$").expect("fence pattern is valid"));

/// A fenced code block delimiter line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceMarker {
    /// 1-based line number
    pub line: usize,
    /// Leading whitespace width, used to align a matching close
    pub indentation: usize,
    /// Number of backticks in the delimiter
    pub fence_len: usize,
    /// Text after the delimiter, trimmed (may be empty)
    pub language_tag: String,
}

impl FenceMarker {
    /// Bare markers are the only ones structurally eligible to close a block
    pub fn is_closing_candidate(&self) -> bool {
        self.language_tag.is_empty()
    }

    /// The delimiter as written, e.g. "```rust"
    pub fn display(&self) -> String {
        format!("{}{}", "`".repeat(self.fence_len), self.language_tag)
    }
}

/// Kind of a classified line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Empty or whitespace-only line
    Blank,
    /// Anything that is not a fence marker
    Content,
    /// Part of the leading YAML frontmatter, including both delimiters
    Frontmatter,
    /// A candidate fence marker
    Fence(FenceMarker),
}

/// A line together with its classification
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLine<'a> {
    pub line: Line<'a>,
    pub kind: LineKind,
}

impl ClassifiedLine<'_> {
    pub fn marker(&self) -> Option<&FenceMarker> {
        match &self.kind {
            LineKind::Fence(marker) => Some(marker),
            _ => None,
        }
    }
}

/// Parse a fence marker from a line, if the line is one
pub fn parse_marker(line: &Line<'_>) -> Option<FenceMarker> {
    let captures = FENCE_RE.captures(line.stripped)?;
    let backticks = captures.get(1)?.as_str();
    let info = captures.get(2).map(|m| m.as_str().trim()).unwrap_or("");

    Some(FenceMarker {
        line: line.index,
        indentation: line.indentation(),
        fence_len: backticks.len(),
        language_tag: info.to_string(),
    })
}
