//! Fence State Machine
//!
//! Single forward pass over classified lines that tracks which code block is
//! open. Produces raw structural events; turning them into messages is the
//! synthesizer's job.

use std::collections::HashMap;

use crate::parser::{ClassifiedLine, FenceMarker};

/// Open/closed state of the document being scanned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenceState {
    Outside,
    /// Inside the block opened by this marker
    Inside(FenceMarker),
}

/// What a fence marker line turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceRole {
    Opening,
    Closing,
    /// Content of an open block (shorter delimiter, or closer of a nested-looking fence)
    Inert,
    /// Looks like a fence but cannot open or close anything here
    Ambiguous,
}

/// Why a marker inside an open block was not accepted as its closer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmbiguityReason {
    /// Closers are always bare, so a tagged fence cannot end the block
    TaggedInsideBlock { marker: String },
    /// Bare fence whose indentation differs from the opener's
    IndentMismatch { expected: usize, found: usize },
}

/// Raw structural event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenceEvent {
    Opened {
        line: usize,
        language_tag: String,
    },
    Closed {
        open_line: usize,
        line: usize,
    },
    Ambiguous {
        line: usize,
        open_line: usize,
        reason: AmbiguityReason,
    },
    /// Naive reading of a tagged fence as a closer carrying extra text
    ClosingText {
        line: usize,
        text: String,
    },
    Unclosed {
        open_line: usize,
    },
}

/// A code block as paired by the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub open_line: usize,
    pub close_line: Option<usize>,
    pub language_tag: String,
}

impl CodeBlock {
    /// True when `line` is the opener, the closer, or anything in between
    pub fn contains(&self, line: usize) -> bool {
        line >= self.open_line && self.close_line.is_none_or(|close| line <= close)
    }
}

/// Everything the state machine learned about one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FenceTrace {
    pub events: Vec<FenceEvent>,
    /// Role of every fence marker line, in line order
    pub roles: Vec<(usize, FenceRole)>,
    /// Opening line -> closing line of every closed block
    pub(crate) closes: HashMap<usize, usize>,
}

impl FenceTrace {
    pub fn role_of(&self, line: usize) -> Option<FenceRole> {
        self.roles
            .binary_search_by_key(&line, |(l, _)| *l)
            .ok()
            .map(|i| self.roles[i].1)
    }

    /// Line that closed the block opened at `open_line`, if any
    pub fn close_line_of(&self, open_line: usize) -> Option<usize> {
        self.closes.get(&open_line).copied()
    }

    pub fn is_unclosed(&self, open_line: usize) -> bool {
        self.events.iter().any(
            |event| matches!(event, FenceEvent::Unclosed { open_line: l } if *l == open_line),
        )
    }

    /// Code blocks in document order
    pub fn blocks(&self) -> Vec<CodeBlock> {
        self.events
            .iter()
            .filter_map(|event| match event {
                FenceEvent::Opened { line, language_tag } => Some(CodeBlock {
                    open_line: *line,
                    close_line: self.close_line_of(*line),
                    language_tag: language_tag.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

/// The state machine itself; one per document scan
#[derive(Debug)]
pub struct FenceStateMachine {
    state: FenceState,
    /// Tagged fence seen inside the open block, waiting for its own bare closer
    nested: Option<FenceMarker>,
    /// Tagged fences shorter than the open block's delimiter
    shorter_tagged: Vec<FenceMarker>,
    trace: FenceTrace,
}

impl Default for FenceStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl FenceStateMachine {
    pub fn new() -> Self {
        Self {
            state: FenceState::Outside,
            nested: None,
            shorter_tagged: Vec::new(),
            trace: FenceTrace::default(),
        }
    }

    pub fn state(&self) -> &FenceState {
        &self.state
    }

    /// Feed the next line; lines must arrive in document order
    pub fn consume(&mut self, line: &ClassifiedLine<'_>) {
        let Some(marker) = line.marker() else {
            return;
        };

        let role = match std::mem::replace(&mut self.state, FenceState::Outside) {
            FenceState::Outside => {
                self.trace.events.push(FenceEvent::Opened {
                    line: marker.line,
                    language_tag: marker.language_tag.clone(),
                });
                self.state = FenceState::Inside(marker.clone());
                FenceRole::Opening
            }
            FenceState::Inside(open) => {
                let role = self.consume_inside(&open, marker);
                if role == FenceRole::Closing {
                    self.nested = None;
                    self.shorter_tagged.clear();
                } else {
                    self.state = FenceState::Inside(open);
                }
                role
            }
        };

        self.trace.roles.push((marker.line, role));
    }

    fn consume_inside(&mut self, open: &FenceMarker, marker: &FenceMarker) -> FenceRole {
        // A longer outer fence can only be closed by a fence at least as long.
        // Shorter tagged fences only matter if the outer block never closes.
        if marker.fence_len < open.fence_len {
            if !marker.is_closing_candidate() {
                self.shorter_tagged.push(marker.clone());
            }
            return FenceRole::Inert;
        }

        if marker.is_closing_candidate() {
            if let Some(nested) = &self.nested {
                if marker.fence_len >= nested.fence_len {
                    self.nested = None;
                    return FenceRole::Inert;
                }
            }

            if marker.indentation == open.indentation {
                self.trace.events.push(FenceEvent::Closed {
                    open_line: open.line,
                    line: marker.line,
                });
                self.trace.closes.insert(open.line, marker.line);
                return FenceRole::Closing;
            }

            self.trace.events.push(FenceEvent::Ambiguous {
                line: marker.line,
                open_line: open.line,
                reason: AmbiguityReason::IndentMismatch {
                    expected: open.indentation,
                    found: marker.indentation,
                },
            });
            return FenceRole::Ambiguous;
        }

        self.trace.events.push(FenceEvent::Ambiguous {
            line: marker.line,
            open_line: open.line,
            reason: AmbiguityReason::TaggedInsideBlock {
                marker: marker.display(),
            },
        });
        if marker.indentation == open.indentation {
            self.trace.events.push(FenceEvent::ClosingText {
                line: marker.line,
                text: marker.language_tag.clone(),
            });
        }
        self.nested = Some(marker.clone());

        FenceRole::Ambiguous
    }

    /// End of document
    pub fn finish(mut self) -> FenceTrace {
        if let FenceState::Inside(open) = &self.state {
            // Nesting inside a block that never closes is a cascade symptom
            for marker in self.shorter_tagged.drain(..) {
                self.trace.events.push(FenceEvent::Ambiguous {
                    line: marker.line,
                    open_line: open.line,
                    reason: AmbiguityReason::TaggedInsideBlock {
                        marker: marker.display(),
                    },
                });
                if let Ok(i) = self
                    .trace
                    .roles
                    .binary_search_by_key(&marker.line, |(l, _)| *l)
                {
                    self.trace.roles[i].1 = FenceRole::Ambiguous;
                }
            }
            self.trace.events.push(FenceEvent::Unclosed {
                open_line: open.line,
            });
        }
        self.trace
    }
}

/// Run the state machine over a whole document
pub fn trace_fences(lines: &[ClassifiedLine<'_>]) -> FenceTrace {
    let mut machine = FenceStateMachine::new();
    for line in lines {
        machine.consume(line);
    }
    machine.finish()
}
