use anyhow::Result;
use axum::Router;
use clap::Parser;
use pubsearch_core::IndexConfig;
use server::{build_app, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Index snapshot path
    #[arg(long, default_value = "./data/index.bin")]
    index: PathBuf,
    /// JSON config file (field weights, normalizer options)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();

    // CORS_ALLOW_ORIGIN is comma-separated; unset allows any origin
    let cors_origins: Vec<String> = std::env::var("CORS_ALLOW_ORIGIN")
        .map(|val| val.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    let config = ServerConfig {
        index_path: args.index,
        index_config: IndexConfig::load_or_default(args.config.as_deref())?,
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
        cors_origins,
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
