//! HTTP surface: the generation endpoint, server-side PNG export, and the
//! browser page.

use crate::handler::{CredentialAssessment, ThumbnailService};
use crate::models::{GenerationRequest, SuggestionItem};
use crate::render::PngExporter;
use crate::{Error, Result};
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::instrument;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared, read-only state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ThumbnailService>,
}

/// Creates the application router.
pub fn create_router(service: Arc<ThumbnailService>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route(
            "/api/generate-thumbnails",
            post(generate_thumbnails).fallback(method_not_allowed),
        )
        .route(
            "/api/render-thumbnail",
            post(render_thumbnail).fallback(method_not_allowed),
        )
        .with_state(state)
        .layer(axum::middleware::from_fn(log_request))
}

/// Binds `bind_addr` and serves until the process exits.
pub async fn serve(bind_addr: &str, service: Arc<ThumbnailService>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_router(service)).await?;
    Ok(())
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    tracing::info!(%method, %path, status = response.status().as_u16(), "Handled request");
    response
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> &'static str {
    "OK"
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "Method not allowed" })),
    )
}

fn bad_request(details: String, field: Option<&'static str>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "Missing required fields",
            "details": details,
            "field": field,
        })),
    )
        .into_response()
}

fn generation_failure(details: String, credential: CredentialAssessment) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "Failed to generate thumbnails",
            "details": details,
            "apiKeyValid": credential.is_plausible(),
        })),
    )
        .into_response()
}

/// `POST /api/generate-thumbnails`
#[instrument(skip_all)]
async fn generate_thumbnails(
    State(state): State<AppState>,
    payload: std::result::Result<Json<GenerationRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return bad_request(rejection.body_text(), None),
    };

    match state.service.generate(&request).await {
        Ok(batch) => (StatusCode::OK, Json(batch)).into_response(),
        Err(Error::InvalidArgument { field }) => {
            bad_request(format!("{} is required", field), Some(field))
        }
        Err(Error::GenerationFailed {
            details,
            credential,
        }) => generation_failure(details, credential),
        Err(other) => {
            tracing::error!("Thumbnail generation failed: {}", other);
            generation_failure(
                other.to_string(),
                CredentialAssessment::assess(&request.credential),
            )
        }
    }
}

/// `POST /api/render-thumbnail`: one card as a PNG download.
#[instrument(skip_all)]
async fn render_thumbnail(
    payload: std::result::Result<Json<SuggestionItem>, JsonRejection>,
) -> Response {
    let item = match payload {
        Ok(Json(item)) => item,
        Err(rejection) => return bad_request(rejection.body_text(), None),
    };

    match PngExporter::render(&item).await {
        Ok(card) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/png".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", card.file_name),
                ),
            ],
            card.png,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Card rendering failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to render thumbnail", "details": e.to_string() })),
            )
                .into_response()
        }
    }
}
