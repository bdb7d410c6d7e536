use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::Config;
use crate::lsp::document::DocumentState;
use crate::lsp::handlers::{
    HandleCompletion, HandleDiagnostics, HandleDocumentSymbol, HandleHover,
};
use crate::settings::{LintSettings, SettingsManager};

/// The main LSP backend that holds state and implements the Language Server Protocol
#[derive(Clone)]
pub struct Backend {
    pub client: Client,
    pub settings: Arc<RwLock<LintSettings>>,
    pub settings_manager: Arc<Mutex<SettingsManager>>,
    pub documents: Arc<Mutex<HashMap<Url, DocumentState>>>,
    pub config: Config,
}

impl Backend {
    pub fn new(client: Client, config: Config, settings_manager: SettingsManager) -> Self {
        let settings = settings_manager.shared();

        Self {
            client,
            settings,
            settings_manager: Arc::new(Mutex::new(settings_manager)),
            documents: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    /// Rescan every open document with the current settings and republish
    pub async fn refresh_documents(&self) {
        let open: Vec<(Url, String)> = self
            .documents
            .lock()
            .await
            .iter()
            .map(|(uri, state)| (uri.clone(), state.content.clone()))
            .collect();

        for (uri, content) in open {
            let doc_state = self.create_document_state(content).await;

            let mut docs = self.documents.lock().await;
            // Skip documents edited or closed while rescanning
            match docs.get_mut(&uri) {
                Some(existing) if existing.content == doc_state.content => *existing = doc_state,
                _ => continue,
            }
            drop(docs);

            self.publish_diagnostics(uri).await;
        }
    }

    /// Watch the settings files and rescan open documents after each reload
    async fn start_settings_watch(&self) {
        let mut reloaded = {
            let mut manager = self.settings_manager.lock().await;
            if let Err(e) = manager.watch(Some(self.client.clone())) {
                log::error!("Failed to watch settings files: {}", e);
                self.client
                    .log_message(
                        MessageType::ERROR,
                        format!("Failed to watch settings files: {}", e),
                    )
                    .await;
            }
            manager.subscribe()
        };

        let backend = self.clone();
        tokio::spawn(async move {
            while reloaded.changed().await.is_ok() {
                log::info!("Settings reloaded, rescanning open documents");
                backend.refresh_documents().await;
            }
        });
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(
        &self,
        _: InitializeParams,
    ) -> tower_lsp::jsonrpc::Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(vec!["`".to_string()]),
                    work_done_progress_options: Default::default(),
                    all_commit_characters: None,
                    completion_item: None,
                }),
                document_symbol_provider: Some(OneOf::Left(true)),
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "fence-ls".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let message = match &self.config.explicit_settings {
            Some(path) => format!("fence-ls initialized (settings: {})", path.display()),
            None => "fence-ls initialized".to_string(),
        };
        self.client.log_message(MessageType::INFO, message).await;

        self.start_settings_watch().await;
    }

    async fn shutdown(&self) -> tower_lsp::jsonrpc::Result<()> {
        Ok(())
    }

    async fn hover(&self, params: HoverParams) -> tower_lsp::jsonrpc::Result<Option<Hover>> {
        self.handle_hover(params).await
    }

    async fn completion(
        &self,
        params: CompletionParams,
    ) -> tower_lsp::jsonrpc::Result<Option<CompletionResponse>> {
        self.handle_completion(params).await
    }

    async fn document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> tower_lsp::jsonrpc::Result<Option<DocumentSymbolResponse>> {
        self.handle_document_symbol(params).await
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri.clone();
        let doc_state = self.create_document_state(params.text_document.text).await;

        let mut docs = self.documents.lock().await;
        docs.insert(uri.clone(), doc_state);
        drop(docs); // Release the lock before calling publish_diagnostics

        self.publish_diagnostics(uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.clone();
        if let Some(change) = params.content_changes.into_iter().last() {
            let doc_state = self.create_document_state(change.text).await;

            let mut docs = self.documents.lock().await;
            docs.insert(uri.clone(), doc_state);
            drop(docs); // Release the lock before calling publish_diagnostics

            self.publish_diagnostics(uri).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.lock().await.remove(&uri);

        // Clear stale diagnostics in the client
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }
}

#[cfg(test)]
mod tests {
    use tower_lsp::LspService;

    use super::*;

    const CASCADE: &str = "Intro\n\n```python\nx = 1\n```bash\nls\n```\n";

    fn service() -> (LspService<Backend>, tower_lsp::ClientSocket) {
        let config = Config {
            explicit_settings: None,
            user_settings: None,
            workspace_settings: None,
            log_level: "info".to_string(),
        };
        let manager = SettingsManager::with_sources(Vec::new());
        LspService::new(move |client| Backend::new(client, config, manager))
    }

    fn uri() -> Url {
        Url::parse("file:///docs/memo.md").unwrap()
    }

    async fn open(backend: &Backend, text: &str) {
        backend
            .did_open(DidOpenTextDocumentParams {
                text_document: TextDocumentItem::new(
                    uri(),
                    "markdown".to_string(),
                    1,
                    text.to_string(),
                ),
            })
            .await;
    }

    fn position(line: u32, character: u32) -> TextDocumentPositionParams {
        TextDocumentPositionParams::new(TextDocumentIdentifier::new(uri()), Position::new(line, character))
    }

    #[tokio::test]
    async fn test_lsp_diagnostic_carries_rule_and_root_cause() {
        let (service, _socket) = service();
        let backend = service.inner();
        open(backend, CASCADE).await;

        let docs = backend.documents.lock().await;
        let state = docs.get(&uri()).unwrap();
        let lsp: Vec<_> = state
            .result
            .iter()
            .cloned()
            .map(|d| backend.create_lsp_diagnostic(&uri(), &state.content, d))
            .collect();

        assert_eq!(lsp.len(), 2);
        assert_eq!(lsp[0].code, Some(NumberOrString::String("unclosed-block".to_string())));
        assert_eq!(lsp[0].related_information, None);

        let ambiguous = &lsp[1];
        assert_eq!(ambiguous.range.start, Position::new(4, 0));
        assert_eq!(ambiguous.range.end, Position::new(4, 7));
        assert_eq!(ambiguous.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(ambiguous.source.as_deref(), Some("fence-ls"));
        assert_eq!(
            ambiguous.code,
            Some(NumberOrString::String("ambiguous-fence".to_string()))
        );
        let related = ambiguous.related_information.as_ref().unwrap();
        assert_eq!(related[0].location.uri, uri());
        assert_eq!(related[0].location.range.start.line, 2);
    }

    #[tokio::test]
    async fn test_hover_on_ambiguous_line() {
        let (service, _socket) = service();
        let backend = service.inner();
        open(backend, CASCADE).await;

        let hover = backend
            .hover(HoverParams {
                text_document_position_params: position(4, 3),
                work_done_progress_params: Default::default(),
            })
            .await
            .unwrap()
            .unwrap();

        let HoverContents::Markup(markup) = hover.contents else {
            panic!("expected markup hover");
        };
        assert!(markup.value.contains("**ambiguous-fence**"));
        assert!(markup.value.contains("Root cause: line 3"));

        let opener = backend
            .hover(HoverParams {
                text_document_position_params: position(2, 0),
                work_done_progress_params: Default::default(),
            })
            .await
            .unwrap()
            .unwrap();
        let HoverContents::Markup(markup) = opener.contents else {
            panic!("expected markup hover");
        };
        assert!(markup.value.contains("**Code block** `python` (line 3, never closed)"));
    }

    #[tokio::test]
    async fn test_completion_on_opening_fence_only() {
        let (service, _socket) = service();
        let backend = service.inner();
        open(backend, "Intro\n\n```ru\n\n```rust\nlet x = 1;\n```py\n```\n").await;

        let complete = |line, character| CompletionParams {
            text_document_position: position(line, character),
            work_done_progress_params: Default::default(),
            partial_result_params: Default::default(),
            context: None,
        };

        let Some(CompletionResponse::Array(items)) =
            backend.completion(complete(2, 5)).await.unwrap()
        else {
            panic!("expected completions on an opening fence");
        };
        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["rust"]);

        // Tagged fence inside the block opened at line 3
        assert!(backend.completion(complete(6, 5)).await.unwrap().is_none());
        // Prose
        assert!(backend.completion(complete(0, 3)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_refresh_documents_uses_reloaded_settings() {
        let (service, _socket) = service();
        let backend = service.inner();
        open(backend, "Intro\n\n```\ncode\n```\n").await;
        assert_eq!(
            backend.documents.lock().await.get(&uri()).unwrap().result.len(),
            1
        );

        backend.settings.write().await.require_language = false;
        backend.refresh_documents().await;

        assert!(backend.documents.lock().await.get(&uri()).unwrap().result.is_empty());
    }

    #[tokio::test]
    async fn test_did_close_forgets_document() {
        let (service, _socket) = service();
        let backend = service.inner();
        open(backend, CASCADE).await;

        backend
            .did_close(DidCloseTextDocumentParams {
                text_document: TextDocumentIdentifier::new(uri()),
            })
            .await;

        assert!(backend.documents.lock().await.is_empty());
        backend.refresh_documents().await;
        assert!(backend.documents.lock().await.is_empty());
    }
}
