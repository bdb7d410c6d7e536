use std::sync::LazyLock;

use regex::Regex;
use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::*;

use crate::lsp::backend::Backend;
use crate::lsp::document::DocumentState;
use crate::settings::settings_for_document;
use crate::validation::{CodeBlock, Severity, code_blocks, scan_with};

/// An opening fence being typed: indentation, backticks, partial language
static PARTIAL_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*`{3,}([\w+#.-]*)$").expect("partial fence pattern is valid"));

/// Trait for handling hover requests
#[tower_lsp::async_trait]
pub trait HandleHover {
    async fn handle_hover(&self, params: HoverParams) -> LspResult<Option<Hover>>;
}

/// Trait for handling completion requests
#[tower_lsp::async_trait]
pub trait HandleCompletion {
    async fn handle_completion(
        &self,
        params: CompletionParams,
    ) -> LspResult<Option<CompletionResponse>>;
}

/// Trait for handling document symbols
#[tower_lsp::async_trait]
pub trait HandleDocumentSymbol {
    async fn handle_document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> LspResult<Option<DocumentSymbolResponse>>;
}

/// Trait for handling diagnostics
#[tower_lsp::async_trait]
pub trait HandleDiagnostics {
    async fn create_document_state(&self, content: String) -> DocumentState;
    async fn publish_diagnostics(&self, uri: Url);
    fn create_lsp_diagnostic(
        &self,
        uri: &Url,
        content: &str,
        diagnostic: crate::validation::Diagnostic,
    ) -> tower_lsp::lsp_types::Diagnostic;
}

#[tower_lsp::async_trait]
impl HandleHover for Backend {
    async fn handle_hover(&self, params: HoverParams) -> LspResult<Option<Hover>> {
        let tdpp = params.text_document_position_params;
        let uri = tdpp.text_document.uri;
        let line_number = tdpp.position.line as usize + 1;

        let docs = self.documents.lock().await;
        let doc_state = match docs.get(&uri) {
            Some(state) => state,
            None => return Ok(None),
        };

        let mut sections = Vec::new();

        if let Some(block) = doc_state
            .blocks
            .iter()
            .find(|b| b.open_line == line_number || b.close_line == Some(line_number))
        {
            sections.push(describe_block(block));
        }

        for diagnostic in doc_state.result.at_line(line_number) {
            let mut text = format!("**{}**: {}", diagnostic.rule.code(), diagnostic.message);
            if let Some(root) = diagnostic.root_cause_line {
                text.push_str(&format!("\n\nRoot cause: line {}", root));
            }
            sections.push(text);
        }

        if sections.is_empty() {
            return Ok(None);
        }

        Ok(Some(Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: sections.join("\n\n---\n\n"),
            }),
            range: None,
        }))
    }
}

#[tower_lsp::async_trait]
impl HandleCompletion for Backend {
    async fn handle_completion(
        &self,
        params: CompletionParams,
    ) -> LspResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let pos = params.text_document_position.position;

        let docs = self.documents.lock().await;
        let doc_state = match docs.get(&uri) {
            Some(state) => state,
            None => return Ok(None),
        };

        let line_idx = pos.line as usize;
        let line = doc_state.content.lines().nth(line_idx).unwrap_or("");
        let line_up_to_cursor = prefix_at_utf16(line, pos.character as usize);

        let partial = match PARTIAL_FENCE_RE.captures(line_up_to_cursor) {
            Some(captures) => captures[1].to_lowercase(),
            None => return Ok(None),
        };

        // Only an opening fence takes a language tag
        let line_number = line_idx + 1;
        let inside_block = doc_state
            .blocks
            .iter()
            .any(|b| b.contains(line_number) && b.open_line != line_number);
        if inside_block {
            return Ok(None);
        }

        let settings = self.settings.read().await;
        let completions: Vec<CompletionItem> = settings
            .known_languages
            .iter()
            .filter(|language| language.to_lowercase().starts_with(&partial))
            .map(|language| CompletionItem {
                label: language.clone(),
                kind: Some(CompletionItemKind::ENUM_MEMBER),
                detail: Some("Code block language".to_string()),
                ..Default::default()
            })
            .collect();

        if completions.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(completions)))
        }
    }
}

#[tower_lsp::async_trait]
impl HandleDiagnostics for Backend {
    /// Scan the content with the current settings and the document's modeline
    async fn create_document_state(&self, content: String) -> DocumentState {
        let settings = settings_for_document(&*self.settings.read().await, &content);
        let result = scan_with(&content, &settings);
        let blocks = code_blocks(&content, &settings);

        DocumentState {
            content,
            result,
            blocks,
        }
    }

    /// Publish diagnostics for a document
    async fn publish_diagnostics(&self, uri: Url) {
        let docs = self.documents.lock().await;
        let doc_state = match docs.get(&uri) {
            Some(state) => state,
            None => return,
        };

        let diagnostics: Vec<_> = doc_state
            .result
            .iter()
            .cloned()
            .map(|d| self.create_lsp_diagnostic(&uri, &doc_state.content, d))
            .collect();
        drop(docs);

        self.client
            .publish_diagnostics(uri, diagnostics, None)
            .await;
    }

    fn create_lsp_diagnostic(
        &self,
        uri: &Url,
        content: &str,
        diagnostic: crate::validation::Diagnostic,
    ) -> tower_lsp::lsp_types::Diagnostic {
        let severity = match diagnostic.severity {
            Severity::Error => DiagnosticSeverity::ERROR,
            Severity::Warning => DiagnosticSeverity::WARNING,
            Severity::Info => DiagnosticSeverity::INFORMATION,
        };

        let related_information = diagnostic.root_cause_line.map(|root| {
            vec![DiagnosticRelatedInformation {
                location: Location::new(uri.clone(), line_range(content, root)),
                message: format!("Code block opened at line {}", root),
            }]
        });

        tower_lsp::lsp_types::Diagnostic::new(
            line_range(content, diagnostic.line_number),
            Some(severity),
            Some(NumberOrString::String(diagnostic.rule.code().to_string())),
            Some("fence-ls".to_string()),
            diagnostic.message,
            related_information,
            None,
        )
    }
}

#[tower_lsp::async_trait]
impl HandleDocumentSymbol for Backend {
    async fn handle_document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> LspResult<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;

        let docs = self.documents.lock().await;
        let doc_state = match docs.get(&uri) {
            Some(state) => state,
            None => return Ok(None),
        };

        let last_line = doc_state.content.lines().count().max(1);

        let symbols = doc_state
            .blocks
            .iter()
            .map(|block| {
                let end_line = block.close_line.unwrap_or(last_line);
                let range = Range::new(
                    line_range(&doc_state.content, block.open_line).start,
                    line_range(&doc_state.content, end_line).end,
                );

                #[allow(deprecated)]
                DocumentSymbol {
                    name: block_name(block),
                    detail: Some(describe_span(block)),
                    kind: SymbolKind::NAMESPACE,
                    tags: None,
                    deprecated: Some(false), // Required by tower-lsp 0.20
                    range,
                    selection_range: line_range(&doc_state.content, block.open_line),
                    children: None,
                }
            })
            .collect();

        Ok(Some(DocumentSymbolResponse::Nested(symbols)))
    }
}

/// Full range of a 1-based line, in UTF-16 columns
fn line_range(content: &str, line_number: usize) -> Range {
    let line_idx = line_number.saturating_sub(1);
    let width = content
        .lines()
        .nth(line_idx)
        .map(|line| line.encode_utf16().count())
        .unwrap_or(0);

    Range::new(
        Position::new(line_idx as u32, 0),
        Position::new(line_idx as u32, width as u32),
    )
}

/// Prefix of `line` up to a UTF-16 column
fn prefix_at_utf16(line: &str, column: usize) -> &str {
    let mut units = 0;
    for (byte_idx, ch) in line.char_indices() {
        if units >= column {
            return &line[..byte_idx];
        }
        units += ch.len_utf16();
    }
    line
}

fn block_name(block: &CodeBlock) -> String {
    if block.language_tag.is_empty() {
        "``` (no language)".to_string()
    } else {
        format!("```{}", block.language_tag)
    }
}

fn describe_span(block: &CodeBlock) -> String {
    match block.close_line {
        Some(close) => format!("lines {}-{}", block.open_line, close),
        None => format!("line {}, never closed", block.open_line),
    }
}

fn describe_block(block: &CodeBlock) -> String {
    let language = if block.language_tag.is_empty() {
        "no language"
    } else {
        block.language_tag.as_str()
    };
    format!("**Code block** `{}` ({})", language, describe_span(block))
}
