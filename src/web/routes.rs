use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::ingest::IngestError;

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit", post(submit))
        .route("/retrieve", get(retrieve))
        .route("/healthz", get(health))
}

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    origin: String,
    urls: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    status: &'static str,
    message: String,
    new_url_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct RetrieveParams {
    origin: String,
    /// Page to return; defaults to 1 and overrides any `page-N` in `origin`.
    page: Option<u32>,
    /// Return every page of a thread instead of just `page`.
    #[serde(default)]
    all_pages: bool,
}

#[derive(Debug, Serialize)]
struct RetrieveResponse {
    urls: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: &'static str,
    message: String,
}

async fn submit(State(state): State<AppState>, Json(request): Json<SubmitRequest>) -> Response {
    match state.ingest.submit(&request.origin, &request.urls).await {
        Ok(new_url_count) => Json(SubmitResponse {
            status: "OK",
            message: format!("Added {new_url_count} new urls"),
            new_url_count,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

async fn retrieve(
    State(state): State<AppState>,
    Query(params): Query<RetrieveParams>,
) -> Response {
    let page = if params.all_pages {
        None
    } else {
        Some(params.page.unwrap_or(1))
    };

    match state.ingest.retrieve(&params.origin, page).await {
        Ok(urls) => Json(RetrieveResponse { urls }).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn health() -> &'static str {
    "OK"
}

fn error_response(err: &IngestError) -> Response {
    let status = match err {
        IngestError::Validation { .. } => {
            tracing::debug!("Rejected request: {err}");
            StatusCode::BAD_REQUEST
        }
        IngestError::Storage(_) => {
            tracing::error!("Request failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ErrorResponse {
            status: "ERROR",
            message: err.to_string(),
        }),
    )
        .into_response()
}
