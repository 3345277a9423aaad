use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use slateink_server::store::FileStore;
use slateink_server::{router, AppState};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Base URL of the vision analysis service.
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    analyze_upstream: String,
    /// Server-side fallback key, used when a request carries none.
    #[arg(long)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slateink_server=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();
    let data_dir = args
        .data_dir
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../notes"));
    if let Err(error) = tokio::fs::create_dir_all(&data_dir).await {
        tracing::error!("failed to create data dir: {error}");
    }

    let state = AppState {
        store: Arc::new(FileStore::new(data_dir)),
        http: reqwest::Client::new(),
        analyze_upstream: args.analyze_upstream,
        api_key: args.api_key.or_else(|| std::env::var("GEMINI_API_KEY").ok()),
    };
    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("notes API listening on http://localhost:{port}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server");
    axum::serve(listener, app).await.expect("Server crashed");
}
