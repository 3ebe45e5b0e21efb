// src/api.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::cache::JobService;
use crate::ingest::types::{Listing, SourceReport, SourceStatus};
use crate::query::{self, JobFilters, JobsResponse};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<JobService>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/jobs", get(jobs))
        .route("/api/jobs/status", get(sources_status))
        .route("/api/jobs/source/{name}", get(source_probe))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Main query endpoint. Always answers 200 with a `dataSource` marker —
/// degraded data is a payload property, not an HTTP error.
async fn jobs(
    State(state): State<AppState>,
    Query(filters): Query<JobFilters>,
) -> Json<JobsResponse> {
    let registry = state.service.registry();
    if filters.forces_fallback() {
        let snap = state.service.fallback_snapshot();
        return Json(query::apply(&snap, registry, &filters));
    }
    let snap = state.service.snapshot().await;
    Json(query::apply(&snap, registry, &filters))
}

#[derive(Serialize)]
struct SourceStatusRow {
    name: String,
    status: &'static str,
    jobs: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<SourceReport> for SourceStatusRow {
    fn from(report: SourceReport) -> Self {
        Self {
            name: report.source,
            status: match report.health.status {
                SourceStatus::Ok => "working",
                SourceStatus::Failed => "failed",
            },
            jobs: report.health.count,
            error: report.health.error,
        }
    }
}

/// Probe every enabled source and report per-source health. Bypasses the
/// shared cache so an operator sees live reality, not the snapshot.
async fn sources_status(State(state): State<AppState>) -> Json<Vec<SourceStatusRow>> {
    let reports = state.service.probe_all().await;
    Json(reports.into_iter().map(SourceStatusRow::from).collect())
}

#[derive(Serialize)]
struct SourceProbeResponse {
    source: String,
    status: &'static str,
    total: usize,
    jobs: Vec<Listing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Fetch exactly one named source (operational testing).
async fn source_probe(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SourceProbeResponse>, (StatusCode, String)> {
    let report = state
        .service
        .probe_source(&name)
        .await
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown source: {name}")))?;
    Ok(Json(SourceProbeResponse {
        source: report.source,
        status: match report.health.status {
            SourceStatus::Ok => "working",
            SourceStatus::Failed => "failed",
        },
        total: report.listings.len(),
        jobs: report.listings,
        error: report.health.error,
    }))
}
