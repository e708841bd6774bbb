use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use actionlet::ActionService;
use actionlet::transport::{ServerConfig, serve};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Diagnostics go to stderr above; stdout is reserved for activation log
    // content and sentinels.
    let root = std::env::var("ACTION_ROOT").unwrap_or_else(|_| "/action".to_string());
    let service = Arc::new(ActionService::new(&root));

    serve(ServerConfig::from_env(), service).await
}
