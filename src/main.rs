use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use clap::Parser;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use car_market_api::config::{AppConfig, StorageBackend};
use car_market_api::database::Repositories;
use car_market_api::handlers::{protected, public};
use car_market_api::state::AppState;

/// Form overhead allowed on top of the image size limit
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Debug, Parser)]
#[command(name = "car-market-api", version, about = "Car listing marketplace API server")]
struct Args {
    /// Interface to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Use the in-memory store instead of PostgreSQL
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.memory {
        config.database.backend = StorageBackend::Memory;
    }
    tracing::info!("Starting Car Market API in {:?} mode", config.environment);

    let repositories = Repositories::from_config(&config.database)
        .await
        .inspect_err(|e| tracing::error!("Failed to open storage: {}", e))
        .context("failed to open storage")?;

    let state = AppState::new(config, repositories);
    state
        .images
        .ensure_dir()
        .await
        .with_context(|| format!("failed to create upload directory {}", state.images.dir().display()))?;

    let bind_addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let addr: SocketAddr = bind_addr
        .parse()
        .with_context(|| format!("invalid listen address {}", bind_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!(
        "Car Market API listening on http://{} (storage: {})",
        addr,
        state.repositories.backend_name()
    );

    let repositories = state.repositories.clone();
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    repositories.close().await;
    tracing::info!("Shut down cleanly");
    Ok(())
}

fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(state.images.dir());
    let upload_prefix = state.config.uploads.public_prefix.clone();
    let body_limit = state.images.max_bytes() + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(car_routes())
        .merge(upload_routes(body_limit))
        .nest_service(&upload_prefix, uploads)
        .with_state(state)
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

fn auth_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/access-token", post(auth::login))
        .route("/refresh-token", post(auth::refresh))
        .route("/me", get(protected::auth::whoami))
}

fn car_routes() -> Router<AppState> {
    use protected::cars;

    Router::new()
        .route("/cars", get(public::cars::list).post(cars::create))
        .route(
            "/cars/:id",
            get(public::cars::get).put(cars::update).delete(cars::delete),
        )
        .route("/cars/search/:query", get(public::cars::search))
        .route("/my-cars", get(cars::mine))
}

fn upload_routes(body_limit: usize) -> Router<AppState> {
    use protected::{cars, upload};

    Router::new()
        .route(
            "/cars/upload",
            get(public::cars::get_upload).post(cars::create_with_upload),
        )
        .route("/cars/:id/upload", put(cars::update_with_upload))
        .route("/upload", post(upload::upload))
        .route("/upload/:filename", axum::routing::delete(upload::remove))
        .layer(DefaultBodyLimit::max(body_limit))
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Car Selling API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": ["/register", "/login", "/access-token", "/refresh-token", "/me"],
            "cars": [
                "/cars",
                "/cars/upload",
                "/cars/{id}",
                "/cars/{id}/upload",
                "/my-cars",
                "/cars/search/{query}"
            ],
            "upload": ["/upload", "/upload/{filename}"]
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.repositories.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": state.repositories.backend_name()
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
