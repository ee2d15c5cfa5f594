// rates-core/src/api/handlers.rs

use axum::extract::{Path, Query, State};
use axum::Json;
use std::sync::Arc;
use tracing::debug;

use super::dto::{AggregateCoinResponse, CoinResponse, HealthResponse, TitlesQuery};
use super::error::ApiError;
use crate::service::RatesService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RatesService>,
}

/// POST /api/v1/coins/actual?titles=BTC,ETH
pub async fn actual_rates(
    State(state): State<AppState>,
    Query(query): Query<TitlesQuery>,
) -> Result<Json<Vec<CoinResponse>>, ApiError> {
    let titles = parse_titles(query.titles.as_deref())?;
    debug!(?titles, "actual rates requested");

    let coins = state.service.get_latest_rates(&titles).await?;
    Ok(Json(coins.into_iter().map(CoinResponse::from).collect()))
}

/// POST /api/v1/coins/aggregate/:agg_func?titles=BTC,ETH
pub async fn aggregate_rates(
    State(state): State<AppState>,
    Path(agg_func): Path<String>,
    Query(query): Query<TitlesQuery>,
) -> Result<Json<Vec<AggregateCoinResponse>>, ApiError> {
    let titles = parse_titles(query.titles.as_deref())?;
    debug!(?titles, %agg_func, "aggregate rates requested");

    let results = state.service.get_aggregate_rates(&titles, &agg_func).await?;
    Ok(Json(
        results.into_iter().map(AggregateCoinResponse::from).collect(),
    ))
}

/// GET /api/v1/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Split `A, B,,C` into `["A", "B", "C"]`. Absent or blank lists are rejected.
pub fn parse_titles(raw: Option<&str>) -> Result<Vec<String>, ApiError> {
    let titles: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    if titles.is_empty() {
        return Err(ApiError::bad_request("invalid param: titles not set"));
    }
    Ok(titles)
}
