use anyhow::Result;

use fence_language_server::lsp::serve;

#[tokio::main]
async fn main() -> Result<()> {
    serve().await
}
