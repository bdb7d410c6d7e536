//! Fence Language Server
//!
//! Code-fence integrity checks for markdown documentation: a line-based
//! fence state machine that pairs opening and closing fences, explains
//! cascades caused by an unclosed block, and reports formatting issues
//! around fences.
//!
//! This library provides:
//! - Line classification and fence marker parsing
//! - The fence state machine, formatting rules and diagnostic synthesis
//! - Layered settings with per-document modelines
//! - Batch scanning and an LSP backend

pub mod config;
pub mod core;
pub mod lsp;
pub mod parser;
pub mod settings;
pub mod validation;

pub use config::Config;
pub use crate::core::{Document, DocumentReport, DocumentScanner};
pub use settings::{LintSettings, SettingsManager};
pub use validation::{Diagnostic, Rule, ScanResult, Severity, scan, scan_with};
