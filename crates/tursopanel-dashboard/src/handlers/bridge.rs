use axum::{Json, extract::State};

use crate::api_types::BridgeDatabasesResponse;
use crate::auth::CurrentUser;
use crate::error::DashboardError;
use crate::state::AppState;

/// `GET /api/cli/bridge/databases`: database directories provisioned on disk,
/// as reported by the bridge. Bridge errors are passed through verbatim.
pub async fn list_databases(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<BridgeDatabasesResponse>, DashboardError> {
    let databases = state.bridge().list_databases().await?;
    Ok(Json(BridgeDatabasesResponse { databases }))
}
