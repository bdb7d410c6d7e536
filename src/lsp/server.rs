use anyhow::Result;
use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};

use crate::Config;
use crate::lsp::backend::Backend;
use crate::settings::SettingsManager;

/// Start the LSP server on stdio
pub async fn serve() -> Result<()> {
    let config = Config::from_args_and_env()?;
    config.init_logging();

    // Settings are resolved before the first document can arrive; watching
    // starts once the client is initialized
    let settings_manager = SettingsManager::new(&config)?;
    settings_manager.load().await?;

    let (service, socket) =
        LspService::build(move |client| Backend::new(client, config, settings_manager)).finish();

    Server::new(stdin(), stdout(), socket).serve(service).await;

    Ok(())
}
