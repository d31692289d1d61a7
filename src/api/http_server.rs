// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Routers for the two front-ends and the shared application state

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderValue};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use super::errors::ApiError;
use super::pages::{upload_page, widget_page};
use super::upload::upload_handler;
use super::widget::{examples_handler, recognize_handler};
use crate::render::{annotate, TextOverlay};
use crate::storage::UploadStore;
use crate::version;
use crate::vision::frame::BgrFrame;
use crate::vision::plate::{PlatePipeline, PlateResult};

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<dyn PlatePipeline>,
    pub overlay: Arc<TextOverlay>,
    pub store: Arc<UploadStore>,
    /// Sample images for the widget UI
    pub examples_dir: Option<PathBuf>,
}

/// Pipeline output for one image
#[derive(Debug, Clone)]
pub struct Recognition {
    pub plates: Vec<PlateResult>,
    pub annotated: BgrFrame,
    pub processing_time_ms: u64,
}

impl AppState {
    pub fn new(
        pipeline: Arc<dyn PlatePipeline>,
        overlay: Arc<TextOverlay>,
        store: Arc<UploadStore>,
    ) -> Self {
        Self {
            pipeline,
            overlay,
            store,
            examples_dir: None,
        }
    }

    pub fn with_examples_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.examples_dir = dir;
        self
    }

    /// Run detection, recognition and rendering on a blocking worker
    pub async fn recognize(&self, frame: BgrFrame) -> Result<Recognition, ApiError> {
        let pipeline = self.pipeline.clone();
        let overlay = self.overlay.clone();

        tokio::task::spawn_blocking(move || {
            let start = Instant::now();
            let plates = pipeline.detect_recognition_plate(&frame)?;
            let annotated = annotate(&frame, &plates, &overlay);
            Ok::<_, anyhow::Error>(Recognition {
                plates,
                annotated,
                processing_time_ms: start.elapsed().as_millis() as u64,
            })
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("Inference task failed: {}", e)))?
        .map_err(|e| ApiError::ProcessingFailed(format!("{:#}", e)))
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": version::VERSION_NUMBER,
        "build": version::get_version_info(),
        "font": state.overlay.font_source().to_string(),
    }))
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Upload-page server: `/`, `/upload`, `/static/*`, `/health`
pub fn create_upload_router(state: AppState, max_body_bytes: usize) -> Router {
    // Static files are served with caching disabled
    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::EXPIRES,
            HeaderValue::from_static("0"),
        ))
        .service(ServeDir::new(state.store.static_dir()));

    Router::new()
        .route("/", get(upload_page))
        .route("/upload", post(upload_handler))
        .route("/health", get(health_handler))
        .nest_service("/static", static_files)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

/// Widget UI server: `/`, `/api/recognize`, `/api/examples`, `/examples/*`
pub fn create_widget_router(state: AppState, max_body_bytes: usize) -> Router {
    let mut router = Router::new()
        .route("/", get(widget_page))
        .route("/api/recognize", post(recognize_handler))
        .route("/api/examples", get(examples_handler))
        .route("/health", get(health_handler));

    if let Some(dir) = state.examples_dir.clone() {
        router = router.nest_service("/examples", ServeDir::new(dir));
    }

    router
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(router: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
