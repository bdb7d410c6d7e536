//! Document reports
//!
//! A document's scan result tagged with its id, plus plain-text rendering
//! for command-line output.

use serde::Serialize;

use crate::validation::{ScanResult, Severity};

/// Scan result of one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub id: String,
    #[serde(flatten)]
    pub result: ScanResult,
    /// Set when the document could not be scanned at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl DocumentReport {
    pub fn failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            result: ScanResult::new(),
            failure: Some(reason.into()),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.failure.is_some() || self.result.has_errors()
    }

    /// One line per diagnostic: `id:line: severity[rule]: message`
    pub fn render_text(&self) -> Vec<String> {
        if let Some(reason) = &self.failure {
            return vec![format!("{}: error: {}", self.id, reason)];
        }

        self.result
            .iter()
            .map(|d| {
                let severity = match d.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                    Severity::Info => "info",
                };
                let mut line = format!(
                    "{}:{}: {}[{}]: {}",
                    self.id,
                    d.line_number,
                    severity,
                    d.rule.code(),
                    d.message
                );
                if let Some(root) = d.root_cause_line {
                    line.push_str(&format!(" (root cause: line {})", root));
                }
                line
            })
            .collect()
    }
}
