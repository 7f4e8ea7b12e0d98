// Monthly Budget - Web Server
// Serves the budget page and the session/calculation API

use anyhow::Result;
use monthly_budget::{api, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "monthly_budget=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        session_idle_minutes = config.session_idle_minutes,
        "configuration loaded"
    );

    api::serve(config).await
}
