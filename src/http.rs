//! HTTP transport for diplom-ai
//!
//! Thin axum layer over the core: request bodies are parsed into the loose
//! validation DTOs, validated, then handed to the pipeline, the composer or
//! the assembler. CORS is fully open, as the browser client is served from a
//! different origin.

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures_util::StreamExt;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::composer::Composer;
use crate::config::Config;
use crate::document::{Assembler, DOCX_MEDIA_TYPE};
use crate::error::Result;
use crate::model::ItemText;
use crate::outline::{self, Profile};
use crate::pipeline::Pipeline;
use crate::validation::{DocumentInput, GenerateRequest, ItemRequest};

pub const NDJSON_MEDIA_TYPE: &str = "application/x-ndjson";

/// Shared state for HTTP server
#[derive(Clone)]
pub struct HttpState {
    pub config: Arc<Config>,
    pub composer: Arc<dyn Composer>,
    pub pipeline: Pipeline,
    pub assembler: Arc<Assembler>,
}

impl HttpState {
    pub fn new(config: Config, composer: Arc<dyn Composer>, shutdown: CancellationToken) -> Self {
        let pipeline =
            Pipeline::new(composer.clone(), config.pipeline.pacing()).with_shutdown(shutdown);
        let assembler = Arc::new(Assembler::new(config.document.work_label.clone()));
        Self {
            config: Arc::new(config),
            composer,
            pipeline,
            assembler,
        }
    }
}

/// Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    "ok"
}

/// Info endpoint
pub async fn info_handler(State(state): State<HttpState>) -> impl IntoResponse {
    let pacing = state.pipeline.pacing();
    let profiles: serde_json::Map<String, serde_json::Value> = Profile::ALL
        .iter()
        .map(|p| (p.to_string(), json!(outline::resolve(*p))))
        .collect();

    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "profiles": profiles,
        "pacing": {
            "goal_delay_ms": pacing.after_goal.as_millis() as u64,
            "task_delay_ms": pacing.after_task.as_millis() as u64,
        },
        "document": {
            "filename": state.config.document.filename,
        }
    }))
}

/// Stream outline items for a topic as NDJSON
pub async fn generate_handler(
    State(state): State<HttpState>,
    body: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = body?;
    let topic = request.validate()?;

    let lines = state.pipeline.run(topic).map(|record| record.to_line());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, NDJSON_MEDIA_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(lines),
    )
        .into_response())
}

pub async fn rephrase_handler(
    State(state): State<HttpState>,
    Path(item_id): Path<String>,
    body: std::result::Result<Json<ItemRequest>, JsonRejection>,
) -> Result<Json<ItemText>> {
    let Json(request) = body?;
    let kind = request.validate()?;
    let text = state.composer.rephrase(&item_id, kind).await?;
    Ok(Json(ItemText { id: item_id, text }))
}

pub async fn replace_handler(
    State(state): State<HttpState>,
    Path(item_id): Path<String>,
    body: std::result::Result<Json<ItemRequest>, JsonRejection>,
) -> Result<Json<ItemText>> {
    let Json(request) = body?;
    let kind = request.validate()?;
    let text = state.composer.replace(&item_id, kind).await?;
    Ok(Json(ItemText { id: item_id, text }))
}

/// Render a DOCX from an approved structure
pub async fn document_handler(
    State(state): State<HttpState>,
    body: std::result::Result<Json<DocumentInput>, JsonRejection>,
) -> Result<Response> {
    let Json(input) = body?;
    let request = input.validate()?;
    let bytes = state.assembler.assemble(&request)?;

    let disposition = format!("attachment; filename={}", state.config.document.filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, DOCX_MEDIA_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Build the application router
pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/info", get(info_handler))
        .route("/generate", post(generate_handler))
        .route("/items/:item_id/rephrase", post(rephrase_handler))
        .route("/items/:item_id/replace", post(replace_handler))
        .route("/documents/generate", post(document_handler))
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
        .with_state(state)
}

/// Start the HTTP server and run until Ctrl-C
pub async fn start_http_server(config: Config, composer: Arc<dyn Composer>) -> anyhow::Result<()> {
    let bind = config.server.bind;
    let shutdown = CancellationToken::new();
    let app = router(HttpState::new(config, composer, shutdown.clone()));

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP listener: {}", e))?;

    tracing::info!("Starting HTTP server on {}", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutdown requested, closing open outline streams");
            shutdown.cancel();
        })
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    Ok(())
}
