//! Diagnostic Synthesizer
//!
//! Turns raw fence events and formatting findings into the ordered,
//! human-readable diagnostic list. Every symptom of an unclosed block is
//! attributed to the line that opened it.

use std::collections::HashSet;

use crate::settings::LintSettings;
use crate::validation::engine::{Rule, ScanResult, Severity};
use crate::validation::rules::Finding;
use crate::validation::state_machine::{AmbiguityReason, FenceEvent, FenceTrace};

/// Build the final diagnostics for one document
pub fn synthesize(trace: &FenceTrace, findings: Vec<Finding>, settings: &LintSettings) -> ScanResult {
    let mut result = ScanResult::new();

    // Lines that already carry a cascade explanation
    let explained: HashSet<usize> = trace
        .events
        .iter()
        .filter_map(|event| match event {
            FenceEvent::Ambiguous { line, .. } => Some(*line),
            _ => None,
        })
        .collect();

    for event in &trace.events {
        match event {
            FenceEvent::Unclosed { open_line } => {
                result.push(
                    *open_line,
                    Severity::Error,
                    Rule::UnclosedBlock,
                    format!("Unclosed code block starting at line {}", open_line),
                    None,
                );
            }
            FenceEvent::Ambiguous {
                line,
                open_line,
                reason,
            } => {
                result.push(
                    *line,
                    Severity::Error,
                    Rule::AmbiguousFence,
                    explain_ambiguity(*line, *open_line, reason, trace),
                    Some(*open_line),
                );
            }
            FenceEvent::ClosingText { line, text } if !explained.contains(line) => {
                result.push(
                    *line,
                    Severity::Error,
                    Rule::ClosingFenceText,
                    format!("Closing fence has extra text '{}'", text),
                    None,
                );
            }
            FenceEvent::ClosingText { .. } | FenceEvent::Opened { .. } | FenceEvent::Closed { .. } => {}
        }
    }

    for finding in findings {
        result.push(
            finding.line,
            settings.formatting_severity,
            finding.rule,
            finding.message,
            None,
        );
    }

    // Stable: structural diagnostics stay ahead of formatting ones on the same line
    result.diagnostics.sort_by_key(|d| d.line_number);

    result
}

/// One sentence covering both readings of an ambiguous fence line
fn explain_ambiguity(
    line: usize,
    open_line: usize,
    reason: &AmbiguityReason,
    trace: &FenceTrace,
) -> String {
    let close_line = trace.close_line_of(open_line);

    match (reason, close_line) {
        (AmbiguityReason::TaggedInsideBlock { marker }, None) => format!(
            "Line {} appears to be a new opening fence ({}), but the code block opened at line {} \
             was never closed, so it is interpreted as part of the unclosed block",
            line, marker, open_line
        ),
        (AmbiguityReason::TaggedInsideBlock { marker }, Some(close)) => format!(
            "Line {} appears to be a new opening fence ({}), but the code block opened at line {} \
             is still open here (it closes at line {}), so it is interpreted as part of that block; \
             use a longer fence for the outer block to nest fences",
            line, marker, open_line, close
        ),
        (AmbiguityReason::IndentMismatch { expected, found }, None) => format!(
            "Line {} looks like a closing fence but is indented {} columns instead of {}, \
             so it is interpreted as part of the unclosed block opened at line {}",
            line, found, expected, open_line
        ),
        (AmbiguityReason::IndentMismatch { expected, found }, Some(close)) => format!(
            "Line {} looks like a closing fence but is indented {} columns instead of {}, \
             so it is interpreted as part of the code block opened at line {} (it closes at line {})",
            line, found, expected, open_line, close
        ),
    }
}
