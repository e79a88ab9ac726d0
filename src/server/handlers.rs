//! HTTP request handlers for the read API.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;

use super::response::{ApiResponse, IndexResponse, PagedResponse};
use super::router::ENDPOINTS;
use super::state::AppState;
use crate::analyzers::ranking::rank_zones;
use crate::analyzers::types::RankedZone;
use crate::error::QueryError;
use crate::services::{
    BoroughSummary, DaySummary, HourSummary, RouteSummary, StatValue, TripFilter, TripQueries,
    TripRow,
};
use crate::zones::Zone;

pub const DEFAULT_TRIP_LIMIT: i64 = 100;
pub const DEFAULT_ROUTE_LIMIT: i64 = 10;
/// Number of zones returned by `/api/zone-rankings`.
pub const ZONE_RANKING_SIZE: usize = 20;

type ApiResult<T> = Result<Json<ApiResponse<T>>, QueryError>;

#[derive(Debug, Default, Deserialize)]
pub struct TripsParams {
    pub borough: Option<String>,
    pub time_of_day: Option<String>,
    pub day: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BoroughParams {
    pub borough: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<String>,
}

/// Runs a store query on the blocking pool.
async fn run_query<T, F>(state: &AppState, query: F) -> Result<T, QueryError>
where
    T: Send + 'static,
    F: FnOnce(&dyn TripQueries) -> Result<T, QueryError> + Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || query(store.as_ref())).await?
}

fn params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, QueryError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| QueryError::BadRequest(rejection.body_text()))
}

/// Empty query values count as absent.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parses a non-negative integer parameter, falling back to `default` when absent.
pub fn parse_count(name: &str, value: Option<String>, default: i64) -> Result<i64, QueryError> {
    let Some(raw) = present(value) else {
        return Ok(default);
    };
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(QueryError::BadRequest(format!(
            "{name} must be a non-negative integer, got {raw:?}"
        ))),
    }
}

/// GET / - API description
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "NYC Taxi Explorer API".to_string(),
        version: "1.0.0".to_string(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    })
}

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<BTreeMap<String, StatValue>> {
    let rows = run_query(&state, |store| store.summary_stats()).await?;
    Ok(Json(ApiResponse::ok(rows.into_iter().collect())))
}

/// GET /api/boroughs
pub async fn boroughs(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let rows = run_query(&state, |store| store.boroughs()).await?;
    Ok(Json(ApiResponse::ok(rows)))
}

/// GET /api/trips?borough=&time_of_day=&day=&limit=&offset=
pub async fn trips(
    State(state): State<AppState>,
    query: Result<Query<TripsParams>, QueryRejection>,
) -> Result<Json<PagedResponse<TripRow>>, QueryError> {
    let params = params(query)?;
    let limit = parse_count("limit", params.limit, DEFAULT_TRIP_LIMIT)?;
    let offset = parse_count("offset", params.offset, 0)?;
    let filter = TripFilter {
        borough: present(params.borough),
        time_of_day: present(params.time_of_day),
        day: present(params.day),
    };

    let page = run_query(&state, move |store| store.trips(&filter, limit, offset)).await?;
    Ok(Json(PagedResponse {
        success: true,
        total: page.total,
        limit,
        offset,
        data: page.rows,
    }))
}

/// GET /api/trips/by-borough
pub async fn trips_by_borough(State(state): State<AppState>) -> ApiResult<Vec<BoroughSummary>> {
    let rows = run_query(&state, |store| store.trips_by_borough()).await?;
    Ok(Json(ApiResponse::ok(rows)))
}

/// GET /api/trips/by-hour?borough=
pub async fn trips_by_hour(
    State(state): State<AppState>,
    query: Result<Query<BoroughParams>, QueryRejection>,
) -> ApiResult<Vec<HourSummary>> {
    let borough = present(params(query)?.borough);
    let rows = run_query(&state, move |store| store.trips_by_hour(borough.as_deref())).await?;
    Ok(Json(ApiResponse::ok(rows)))
}

/// GET /api/trips/by-day
pub async fn trips_by_day(State(state): State<AppState>) -> ApiResult<Vec<DaySummary>> {
    let rows = run_query(&state, |store| store.trips_by_day()).await?;
    Ok(Json(ApiResponse::ok(rows)))
}

/// GET /api/trips/top-routes?limit=
pub async fn top_routes(
    State(state): State<AppState>,
    query: Result<Query<LimitParams>, QueryRejection>,
) -> ApiResult<Vec<RouteSummary>> {
    let limit = parse_count("limit", params(query)?.limit, DEFAULT_ROUTE_LIMIT)?;
    let rows = run_query(&state, move |store| store.top_routes(limit)).await?;
    Ok(Json(ApiResponse::ok(rows)))
}

/// GET /api/zones?borough=
pub async fn zones(
    State(state): State<AppState>,
    query: Result<Query<BoroughParams>, QueryRejection>,
) -> ApiResult<Vec<Zone>> {
    let borough = present(params(query)?.borough);
    let rows = run_query(&state, move |store| store.zones(borough.as_deref())).await?;
    Ok(Json(ApiResponse::ok(rows)))
}

/// GET /api/zone-rankings
pub async fn zone_rankings(State(state): State<AppState>) -> ApiResult<Vec<RankedZone>> {
    let stats = run_query(&state, |store| store.zone_stats()).await?;
    let mut ranked = rank_zones(stats)?;
    ranked.truncate(ZONE_RANKING_SIZE);
    Ok(Json(ApiResponse::ok(ranked)))
}
