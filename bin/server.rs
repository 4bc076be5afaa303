// ISPB Registry - Web Server
// Read-only REST API over the persisted snapshot

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use clap::Parser;
use ispb_registry::logging::init_logging;
use ispb_registry::{CanonicalRecord, InstitutionRegistry, LastUpdate, PipelineConfig, SnapshotStore};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ispb-server", version, about = "Serve the ISPB registry over HTTP")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding ispbs.json and last_update.json
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[arg(long, env = "ISPB_BIND", default_value = "0.0.0.0:3000")]
    bind: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

/// Shared application state. Reload swaps the inner Arc wholesale.
#[derive(Clone)]
struct AppState {
    store: Arc<SnapshotStore>,
    registry: Arc<RwLock<Arc<InstitutionRegistry>>>,
}

impl AppState {
    async fn current(&self) -> Arc<InstitutionRegistry> {
        self.registry.read().await.clone()
    }

    /// Read the artifacts on the blocking pool; file I/O stays off the workers
    async fn load_from_disk(&self) -> Result<InstitutionRegistry> {
        let store = Arc::clone(&self.store);
        let snapshot = tokio::task::spawn_blocking(move || store.load())
            .await
            .context("Snapshot loading task failed")??;
        Ok(InstitutionRegistry::from_snapshot(snapshot))
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Full listing response
#[derive(Serialize)]
struct ListResponse<'a> {
    total: usize,
    last_update: LastUpdate,
    data: &'a [CanonicalRecord],
}

#[derive(Serialize)]
struct ReloadResponse {
    total_institutions: usize,
    last_update: LastUpdate,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/ispbs - Every institution in the snapshot
async fn list_ispbs(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.current().await;
    let response = Json(ListResponse {
        total: registry.count(),
        last_update: registry.metadata().last_update.clone(),
        data: registry.all(),
    })
    .into_response();
    response
}

/// GET /api/ispb/:ispb - One institution
async fn get_ispb(State(state): State<AppState>, Path(ispb): Path<String>) -> impl IntoResponse {
    let registry = state.current().await;

    match registry.lookup(&ispb) {
        Some(record) => (StatusCode::OK, Json(ApiResponse::ok(record.clone()))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<CanonicalRecord>::err(format!(
                "ISPB {} not found",
                ispb.trim()
            ))),
        )
            .into_response(),
    }
}

/// GET /api/stats - Aggregate counts and freshness
async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.current().await;
    Json(ApiResponse::ok(registry.stats(Utc::now())))
}

/// POST /api/reload - Re-read the artifacts from disk
async fn reload(State(state): State<AppState>) -> impl IntoResponse {
    match state.load_from_disk().await {
        Ok(registry) => {
            let registry = Arc::new(registry);
            let response = ReloadResponse {
                total_institutions: registry.count(),
                last_update: registry.metadata().last_update.clone(),
            };
            *state.registry.write().await = registry;
            info!(total = response.total_institutions, "registry reloaded");
            (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
        }
        Err(e) => {
            warn!(error = %format!("{:#}", e), "reload failed; keeping current registry");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<ReloadResponse>::err(format!("{:#}", e))),
            )
                .into_response()
        }
    }
}

/// GET / - API documentation page
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ispbs", get(list_ispbs))
        .route("/ispb/:ispb", get(get_ispb))
        .route("/stats", get(get_stats))
        .route("/reload", post(reload))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    println!("🌐 ISPB Registry - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut config = PipelineConfig::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.storage.data_dir = dir;
    }

    let store = SnapshotStore::new(config.storage.data_dir.clone());
    let snapshot = store.load()?;
    if snapshot.records.is_empty() {
        println!("⚠️  No snapshot in {}", store.data_dir().display());
        println!("   Run: ispb-registry update");
    }
    let registry = InstitutionRegistry::from_snapshot(snapshot);
    println!("✓ Loaded {} institutions", registry.count());

    let state = AppState {
        store: Arc::new(store),
        registry: Arc::new(RwLock::new(Arc::new(registry))),
    };

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", args.bind))?;

    println!("\n🚀 Server running on http://{}", args.bind);
    println!("   API: http://{}/api/ispbs", args.bind);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}
