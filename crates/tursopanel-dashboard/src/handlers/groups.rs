//! Database groups.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::api_types::{
    CreateGroupRequest, GroupDeletedResponse, GroupListResponse, GroupResponse,
};
use crate::auth::CurrentUser;
use crate::error::DashboardError;
use crate::state::AppState;
use crate::validation::FieldErrors;

/// `GET /api/cli/groups`
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<GroupListResponse>, DashboardError> {
    let store = state.store();
    let mut groups = Vec::new();
    for group in store.list_groups(user.owner_filter()).await? {
        let databases = store.group_members(group.id).await?;
        groups.push(GroupResponse { group, databases });
    }
    Ok(Json(GroupListResponse { groups }))
}

/// `POST /api/cli/groups`: create and attach member databases atomically.
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), DashboardError> {
    let store = state.store();
    let mut errors = FieldErrors::default();
    errors.check_name("name", &body.name);

    for member in &body.databases {
        match store.find_database_by_name(member).await? {
            Some(db) if !db.is_archived() => {
                if !user.can_manage(db.owner_id) {
                    return Err(DashboardError::Forbidden(format!(
                        "you do not own database '{member}'"
                    )));
                }
            }
            _ => errors.add("databases", format!("The database '{member}' does not exist.")),
        }
    }
    errors.into_result()?;

    let group = store.create_group(&body.name, user.0.id, &body.databases).await?;
    let databases = store.group_members(group.id).await?;
    Ok((StatusCode::CREATED, Json(GroupResponse { group, databases })))
}

/// `DELETE /api/cli/groups/{name}`: detaches members and removes the group's tokens.
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<GroupDeletedResponse>, DashboardError> {
    let store = state.store();
    let group = store
        .find_group_by_name(&name)
        .await?
        .ok_or_else(|| DashboardError::NotFound(format!("group '{name}'")))?;
    if !user.can_manage(group.owner_id) {
        return Err(DashboardError::Forbidden(format!("you do not own group '{name}'")));
    }

    let deletion = store
        .delete_group(&name)
        .await?
        .ok_or_else(|| DashboardError::NotFound(format!("group '{name}'")))?;

    Ok(Json(GroupDeletedResponse {
        message: format!("Group '{name}' deleted"),
        detached_databases: deletion.detached_databases,
        removed_tokens: deletion.removed_tokens,
    }))
}
