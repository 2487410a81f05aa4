//! REST API handlers for the fleet dashboard
//!
//! These handlers use the shared AnalyticsService.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::service::{lane_options_from_query, AnalyticsService, LaneQuery, ReloadSummary};
use crate::finance::FinanceSummary;
use crate::kpi::FleetKpis;
use crate::lanes::{LaneSummary, RankBy, RankedLane};
use crate::models::{Basis, Timegrain};
use crate::state::DashboardFilters;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct LanesResponse {
    pub rows: Vec<RankedLane>,
    pub fleet_revenue: f64,
    pub fleet_loads: u32,
}

impl LanesResponse {
    pub fn ranked(s: &LaneSummary, rank_by: RankBy) -> Self {
        Self {
            rows: s.ranked(rank_by),
            fleet_revenue: s.fleet_revenue,
            fleet_loads: s.fleet_loads(),
        }
    }
}

#[derive(Serialize)]
pub struct LaneQueryFilters {
    pub basis: Basis,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub drivers: Vec<String>,
    pub rank_by: RankBy,
}

impl From<LaneQuery> for LaneQueryFilters {
    fn from(q: LaneQuery) -> Self {
        Self {
            basis: q.opts.basis,
            start: q.opts.start,
            end: q.opts.end,
            drivers: q.opts.driver_ids,
            rank_by: q.rank_by,
        }
    }
}

#[derive(Serialize)]
pub struct LaneQueryResponse {
    pub filters: LaneQueryFilters,
    #[serde(flatten)]
    pub lanes: LanesResponse,
}

#[derive(Serialize)]
pub struct FinanceResponse {
    pub timegrain: Timegrain,
    #[serde(flatten)]
    pub summary: FinanceSummary,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: impl ToString) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: error.to_string() }))
}

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Deserialize)]
pub struct FinanceQuery {
    pub timegrain: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

pub type AppState = Arc<AnalyticsService>;

/// GET /api/v1/health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /api/lanes?basis&start&end&drivers[]&rank_by
pub async fn query_lanes(
    State(service): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<LaneQueryResponse>, ApiError> {
    let query = lane_options_from_query(&params).map_err(bad_request)?;
    let summary = service.query_lanes(&query.opts);
    Ok(Json(LaneQueryResponse {
        lanes: LanesResponse::ranked(&summary, query.rank_by),
        filters: LaneQueryFilters::from(query),
    }))
}

/// GET /api/v1/lanes
pub async fn get_lanes(State(service): State<AppState>) -> Json<LanesResponse> {
    Json(LanesResponse::ranked(service.lanes().as_ref(), RankBy::Revenue))
}

/// GET /api/v1/finance?timegrain=day|week|month
pub async fn get_finance(
    State(service): State<AppState>,
    Query(params): Query<FinanceQuery>,
) -> Result<Json<FinanceResponse>, ApiError> {
    let timegrain = match params.timegrain.as_deref() {
        None => Timegrain::default(),
        Some(raw) => Timegrain::parse(raw)
            .ok_or_else(|| bad_request(format!("invalid timegrain '{}', expected day, week or month", raw)))?,
    };
    let summary = service.finance(timegrain);
    Ok(Json(FinanceResponse {
        timegrain,
        summary: summary.as_ref().clone(),
    }))
}

/// GET /api/v1/kpi
pub async fn get_kpis(State(service): State<AppState>) -> Json<FleetKpis> {
    Json(service.kpis().as_ref().clone())
}

/// GET /api/v1/filters
pub async fn get_filters(State(service): State<AppState>) -> Json<DashboardFilters> {
    Json(service.filters())
}

/// PUT /api/v1/filters
pub async fn put_filters(
    State(service): State<AppState>,
    Json(filters): Json<DashboardFilters>,
) -> Json<DashboardFilters> {
    Json(service.set_filters(filters))
}

/// POST /api/v1/reload
pub async fn reload(State(service): State<AppState>) -> Result<Json<ReloadSummary>, ApiError> {
    match service.reload().await {
        Ok(summary) => Ok(Json(summary)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error: format!("{:#}", e) }),
        )),
    }
}
