//! Database records: create, list, archive, restore, force delete.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tursopanel_store::{DatabaseRecord, NewDatabase};

use crate::api_types::{CreateDatabaseRequest, DatabaseListResponse, MessageResponse};
use crate::auth::CurrentUser;
use crate::error::DashboardError;
use crate::state::AppState;
use crate::validation::FieldErrors;

/// `GET /api/cli/databases`
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<DatabaseListResponse>, DashboardError> {
    let databases = state.store().list_databases(user.owner_filter()).await?;
    Ok(Json(DatabaseListResponse { databases }))
}

/// `GET /api/cli/databases/archived`
pub async fn archived(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<DatabaseListResponse>, DashboardError> {
    let databases = state.store().list_archived_databases(user.owner_filter()).await?;
    Ok(Json(DatabaseListResponse { databases }))
}

/// `POST /api/cli/databases`
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CreateDatabaseRequest>,
) -> Result<(StatusCode, Json<DatabaseRecord>), DashboardError> {
    let store = state.store();
    let mut errors = FieldErrors::default();
    errors.check_name("name", &body.name);
    if body.is_schema && body.schema.is_some() {
        errors.add("schema", "A schema database cannot attach to another schema.");
    }

    let mut group_id = None;
    if let Some(group_name) = &body.group {
        match store.find_group_by_name(group_name).await? {
            Some(group) if user.can_manage(group.owner_id) => group_id = Some(group.id),
            Some(_) => {
                return Err(DashboardError::Forbidden(format!(
                    "you do not own group '{group_name}'"
                )));
            }
            None => errors.add("group", format!("The group '{group_name}' does not exist.")),
        }
    }

    if let Some(schema_name) = &body.schema {
        match store.find_database_by_name(schema_name).await? {
            Some(schema) if schema.is_schema && !schema.is_archived() => {}
            _ => errors.add(
                "schema",
                format!("The schema database '{schema_name}' does not exist."),
            ),
        }
    }
    errors.into_result()?;

    let record = store
        .create_database(&NewDatabase {
            name: body.name,
            owner_id: user.0.id,
            group_id,
            is_schema: body.is_schema,
            schema_name: body.schema,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// `DELETE /api/cli/databases/{name}`: archive.
pub async fn archive(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, DashboardError> {
    let record = managed_database(&state, &user, &name).await?;
    if record.is_archived() || !state.store().archive_database(&name).await? {
        return Err(DashboardError::NotFound(format!("database '{name}'")));
    }
    tracing::info!(database = %name, by = %user.0.username, "archived database");
    Ok(Json(MessageResponse::new(format!("Database '{name}' archived"))))
}

/// `POST /api/cli/databases/{name}/restore`
pub async fn restore(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<DatabaseRecord>, DashboardError> {
    let record = managed_database(&state, &user, &name).await?;
    if !record.is_archived() || !state.store().restore_database(&name).await? {
        return Err(DashboardError::NotFound(format!("archived database '{name}'")));
    }
    tracing::info!(database = %name, by = %user.0.username, "restored database");

    let restored = state
        .store()
        .find_database(record.id)
        .await?
        .ok_or_else(|| DashboardError::NotFound(format!("database '{name}'")))?;
    Ok(Json(restored))
}

/// `DELETE /api/cli/databases/{name}/force`: permanent, removes tokens and stats.
pub async fn force_delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, DashboardError> {
    managed_database(&state, &user, &name).await?;
    if !state.store().force_delete_database(&name).await? {
        return Err(DashboardError::NotFound(format!("database '{name}'")));
    }
    Ok(Json(MessageResponse::new(format!("Database '{name}' deleted permanently"))))
}

/// Look up a database (archived or not) the user may manage.
pub(crate) async fn managed_database(
    state: &AppState,
    user: &CurrentUser,
    name: &str,
) -> Result<DatabaseRecord, DashboardError> {
    let record = state
        .store()
        .find_database_by_name(name)
        .await?
        .ok_or_else(|| DashboardError::NotFound(format!("database '{name}'")))?;

    if !user.can_manage(record.owner_id) {
        return Err(DashboardError::Forbidden(format!("you do not own database '{name}'")));
    }
    Ok(record)
}
