//! Stored sqld stats per database.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::api_types::{StatsQueryParams, StatsResponse};
use crate::auth::CurrentUser;
use crate::error::DashboardError;
use crate::handlers::databases::managed_database;
use crate::state::AppState;

const DEFAULT_HISTORY: u32 = 24;
const MAX_HISTORY: u32 = 24 * 31;

/// `GET /api/cli/databases/{name}/stats`
pub async fn show(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(name): Path<String>,
    Query(params): Query<StatsQueryParams>,
) -> Result<Json<StatsResponse>, DashboardError> {
    let db = managed_database(&state, &user, &name).await?;
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY).clamp(1, MAX_HISTORY);

    let history = state.store().stats_history(db.id, limit).await?;
    Ok(Json(StatsResponse {
        database: db.name,
        latest: history.first().cloned(),
        history,
    }))
}

/// `POST /api/cli/databases/{name}/stats/refresh`: fetch from sqld now.
/// sqld errors are passed through with their status and body.
pub async fn refresh(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<StatsResponse>, DashboardError> {
    let db = managed_database(&state, &user, &name).await?;
    if db.is_archived() {
        return Err(DashboardError::NotFound(format!("database '{name}'")));
    }

    let latest = state.refresher().refresh_one(&db.name).await?;
    Ok(Json(StatsResponse {
        database: db.name,
        history: vec![latest.clone()],
        latest: Some(latest),
    }))
}
