//! Document Aggregator
//!
//! Runs one scan per document and hands back its report. Each scan owns its
//! own state, so documents can be scanned concurrently.

use tokio::task::JoinSet;

use crate::core::diagnostics::DocumentReport;
use crate::settings::{LintSettings, settings_for_document};
use crate::validation::{ScanResult, scan_with};

/// A document handed over by a collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path or logical id, used only for attribution
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Scans documents with one set of shared settings
#[derive(Debug, Clone, Default)]
pub struct DocumentScanner {
    settings: LintSettings,
}

impl DocumentScanner {
    pub fn new(settings: LintSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &LintSettings {
        &self.settings
    }

    /// Scan raw text, honouring the document's own modeline
    pub fn scan(&self, text: &str) -> ScanResult {
        let settings = settings_for_document(&self.settings, text);
        scan_with(text, &settings)
    }

    pub fn scan_document(&self, document: &Document) -> DocumentReport {
        let result = self.scan(&document.text);
        log::debug!("{}: {} diagnostics", document.id, result.len());

        DocumentReport {
            id: document.id.clone(),
            result,
            failure: None,
        }
    }

    /// Scan many documents on the blocking pool; reports come back in input order
    ///
    /// A document whose scan task fails still gets a report, marked as failed.
    pub async fn scan_all(&self, documents: Vec<Document>) -> Vec<DocumentReport> {
        let ids: Vec<String> = documents.iter().map(|d| d.id.clone()).collect();

        let mut tasks = JoinSet::new();
        for (position, document) in documents.into_iter().enumerate() {
            let scanner = self.clone();
            tasks.spawn_blocking(move || (position, scanner.scan_document(&document)));
        }

        let mut completed = Vec::with_capacity(ids.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => completed.push(report),
                Err(e) => log::error!("Scan task failed: {}", e),
            }
        }

        collect_reports(ids, completed)
    }
}

/// Order completed reports by input position, filling gaps with failures
fn collect_reports(ids: Vec<String>, completed: Vec<(usize, DocumentReport)>) -> Vec<DocumentReport> {
    let mut slots: Vec<Option<DocumentReport>> = vec![None; ids.len()];
    for (position, report) in completed {
        if let Some(slot) = slots.get_mut(position) {
            *slot = Some(report);
        }
    }

    ids.into_iter()
        .zip(slots)
        .map(|(id, slot)| slot.unwrap_or_else(|| DocumentReport::failed(id, "scan did not complete")))
        .collect()
}
