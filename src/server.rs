//! HTTP trigger for crawls
//!
//! `POST /scrape` with `{"baseUrl": ..., "callbackUrl": ...}` runs one crawl
//! to completion and answers with its report. `GET /health` answers `ok`.

use crate::crawler::CrawlRunner;
use crate::output::CrawlReport;
use crate::SweepError;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    runner: Arc<dyn CrawlRunner>,
}

impl AppState {
    pub fn new(runner: Arc<dyn CrawlRunner>) -> Self {
        Self { runner }
    }
}

/// Body of `POST /scrape`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub callback_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

/// Builds the router serving the crawl trigger
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/scrape", post(scrape))
        .with_state(state)
}

/// Returns the trimmed value, or None when it is absent or blank
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

async fn scrape(
    State(state): State<AppState>,
    body: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<CrawlReport>, ApiError> {
    let Json(request) = body.map_err(|e| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!("baseUrl and callbackUrl are required: {}", e.body_text()),
        )
    })?;

    let (Some(base_url), Some(callback_url)) = (
        non_blank(request.base_url.as_deref()),
        non_blank(request.callback_url.as_deref()),
    ) else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "baseUrl and callbackUrl are required",
        ));
    };

    tracing::info!("Crawl requested: base {} callback {}", base_url, callback_url);

    match state.runner.run_crawl(base_url, callback_url).await {
        Ok(report) => Ok(Json(report)),
        Err(e) if e.is_precondition() => Err(api_error(StatusCode::BAD_REQUEST, e.to_string())),
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Serves the router on `bind` until the process is stopped
pub async fn serve(bind: &str, state: AppState) -> Result<(), SweepError> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
