//! Validation Engine
//!
//! Core scan logic separated from parsing and LSP concerns.

use serde::{Deserialize, Serialize};

use crate::parser::classify_document;
use crate::settings::LintSettings;
use crate::validation::rules::check_formatting;
use crate::validation::state_machine::{CodeBlock, trace_fences};
use crate::validation::synthesizer::synthesize;

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Broad category of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Structural,
    Formatting,
}

/// The check that produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    UnclosedBlock,
    AmbiguousFence,
    ClosingFenceText,
    MissingLanguage,
    BlankLineBeforeFence,
    BlankLineAfterFence,
}

impl Rule {
    /// Stable identifier, also used as the LSP diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            Rule::UnclosedBlock => "unclosed-block",
            Rule::AmbiguousFence => "ambiguous-fence",
            Rule::ClosingFenceText => "closing-fence-text",
            Rule::MissingLanguage => "missing-language",
            Rule::BlankLineBeforeFence => "blank-line-before-fence",
            Rule::BlankLineAfterFence => "blank-line-after-fence",
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Rule::UnclosedBlock | Rule::AmbiguousFence | Rule::ClosingFenceText => {
                DiagnosticKind::Structural
            }
            Rule::MissingLanguage | Rule::BlankLineBeforeFence | Rule::BlankLineAfterFence => {
                DiagnosticKind::Formatting
            }
        }
    }
}

/// A diagnostic message about the scanned document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// 1-based line the diagnostic is anchored at
    pub line_number: usize,
    pub severity: Severity,
    pub message: String,
    /// Set only on cascade explanations: the line of the unclosed fence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_cause_line: Option<usize>,
    pub rule: Rule,
}

impl Diagnostic {
    pub fn kind(&self) -> DiagnosticKind {
        self.rule.kind()
    }
}

/// Ordered diagnostics for one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ScanResult {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn push(
        &mut self,
        line_number: usize,
        severity: Severity,
        rule: Rule,
        message: String,
        root_cause_line: Option<usize>,
    ) {
        self.diagnostics.push(Diagnostic {
            line_number,
            severity,
            message,
            root_cause_line,
            rule,
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    /// Diagnostics anchored at a given line
    pub fn at_line(&self, line_number: usize) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.line_number == line_number)
    }
}

impl<'a> IntoIterator for &'a ScanResult {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

/// Scan a document with the built-in default settings
pub fn scan(document_text: &str) -> ScanResult {
    scan_with(document_text, &LintSettings::default())
}

/// Scan a document
///
/// Pure function of its inputs: no I/O, no state kept between calls.
pub fn scan_with(document_text: &str, settings: &LintSettings) -> ScanResult {
    let lines = classify_document(document_text, settings.skip_frontmatter);
    let trace = trace_fences(&lines);
    let findings = check_formatting(&lines, &trace, settings);
    let result = synthesize(&trace, findings, settings);

    log::debug!(
        "Scanned {} lines: {} fence events, {} diagnostics",
        lines.len(),
        trace.events.len(),
        result.len()
    );

    result
}

/// Code blocks as paired by the fence state machine, in document order
pub fn code_blocks(document_text: &str, settings: &LintSettings) -> Vec<CodeBlock> {
    let lines = classify_document(document_text, settings.skip_frontmatter);
    trace_fences(&lines).blocks()
}
