//! Core Business Logic
//!
//! Per-document scanning and reporting for collaborators.

pub mod diagnostics;
pub mod document;

pub use diagnostics::DocumentReport;
pub use document::{Document, DocumentScanner};
