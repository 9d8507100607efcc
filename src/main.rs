//! blog-graph server
//!
//! Usage: `blog-graph [config.yaml]`

use anyhow::Result;
use blog_graph::config::AppConfig;
use blog_graph::server::ServerBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_yaml_file(&path)?,
        None => AppConfig::default(),
    };
    config.apply_env_overrides()?;

    init_tracing(&config.log_level)?;

    let addr = config.server.address();
    tracing::info!(
        schema = config.schema_path.as_deref().unwrap_or("<built-in>"),
        seed = config.seed_path.as_deref().unwrap_or("<built-in>"),
        "Starting blog-graph"
    );

    ServerBuilder::from_config(&config)?.serve(&addr).await
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
