use pdf_chat::api::{create_router, AppState};
use pdf_chat::domain::ports::DocumentStore;
use pdf_chat::infrastructure::{AppConfig, EphemeralDocumentStore, Sweeper};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "api=debug,pdf_chat=debug,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::load()?;
    std::fs::create_dir_all(&config.config.upload.temp_dir)?;

    if config.config.llm.api_key.is_none() {
        tracing::warn!("OPENROUTER_API_KEY not set, chat answers will be mocked");
    }

    let store = Arc::new(EphemeralDocumentStore::new(config.config.store.retention()?));
    let store: Arc<dyn DocumentStore> = store;
    let sweeper = Sweeper::start(store.clone(), config.config.store.sweep_interval());

    let addr = SocketAddr::new(config.config.server.host.parse()?, config.config.server.port);
    let state = AppState::new(store, config)?;
    let app = create_router(state);

    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.shutdown().await;
    Ok(())
}
