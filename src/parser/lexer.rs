//! Line Tokenizer
//!
//! Splits document text into indexed lines.
//! Focus: borrow from the source text, never drop a line, restart cheaply.

/// One line of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number
    pub index: usize,
    /// Line text without its terminator
    pub raw: &'a str,
    /// Line text with surrounding whitespace removed
    pub stripped: &'a str,
}

impl Line<'_> {
    pub fn is_blank(&self) -> bool {
        self.stripped.is_empty()
    }

    /// Width of the leading whitespace, with tabs expanded to the next multiple of 4
    pub fn indentation(&self) -> usize {
        let mut width = 0;
        for ch in self.raw.chars() {
            match ch {
                ' ' => width += 1,
                '\t' => width += 4 - (width % 4),
                _ => break,
            }
        }
        width
    }
}

/// Lazy sequence of [`Line`]s over a document
///
/// A clone continues from the clone point, so cloning a fresh stream gives a
/// second independent pass over the same lines.
#[derive(Debug, Clone)]
pub struct LineStream<'a> {
    inner: std::str::Lines<'a>,
    next_index: usize,
}

impl<'a> Iterator for LineStream<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.inner.next()?;
        let index = self.next_index;
        self.next_index += 1;

        Some(Line {
            index,
            raw,
            stripped: raw.trim(),
        })
    }
}

/// Tokenize a document into lines
///
/// Handles both `\n` and `\r\n` terminators. A trailing terminator does not
/// produce an extra empty line.
pub fn tokenize(text: &str) -> LineStream<'_> {
    LineStream {
        inner: text.lines(),
        next_index: 1,
    }
}
