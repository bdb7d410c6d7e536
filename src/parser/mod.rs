//! Markdown Line Parser
//!
//! Tokenization and fence-marker classification, done once per document.
//! Both the fence state machine and the formatting rules consume the same
//! classified lines.

pub mod lexer;
pub mod marker;

pub use lexer::{Line, LineStream, tokenize};
pub use marker::{ClassifiedLine, FenceMarker, LineKind, parse_marker};

const FRONTMATTER_DELIMITER: &str = "---";

/// Classify a single line, ignoring document context
pub fn classify_line(line: &Line<'_>) -> LineKind {
    if line.is_blank() {
        LineKind::Blank
    } else if let Some(marker) = parse_marker(line) {
        LineKind::Fence(marker)
    } else {
        LineKind::Content
    }
}

/// Classify every line of a document
///
/// When `skip_frontmatter` is set, a leading `---` ... `---` block is marked
/// as [`LineKind::Frontmatter`] and never yields fence markers.
pub fn classify_document(text: &str, skip_frontmatter: bool) -> Vec<ClassifiedLine<'_>> {
    let frontmatter_end = if skip_frontmatter {
        frontmatter_end(tokenize(text))
    } else {
        None
    };

    tokenize(text)
        .map(|line| {
            let kind = match frontmatter_end {
                Some(end) if line.index <= end => LineKind::Frontmatter,
                _ => classify_line(&line),
            };
            ClassifiedLine { line, kind }
        })
        .collect()
}

/// Line number of the closing frontmatter delimiter, if the document has frontmatter
pub fn frontmatter_end(mut lines: LineStream<'_>) -> Option<usize> {
    let first = lines.next()?;
    if first.raw.trim_end() != FRONTMATTER_DELIMITER {
        return None;
    }

    lines
        .find(|line| line.raw.trim_end() == FRONTMATTER_DELIMITER)
        .map(|line| line.index)
}
