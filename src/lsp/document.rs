use crate::validation::{CodeBlock, ScanResult};

/// State for each open document
#[derive(Debug)]
pub struct DocumentState {
    pub content: String,
    pub result: ScanResult, // Diagnostics from the last scan, with modeline applied
    pub blocks: Vec<CodeBlock>,
}
