//! Access token issuance, listing, revocation and introspection.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use tursopanel_store::TokenRecord;
use tursopanel_token::{Expiry, TokenError};

use crate::api_types::{
    CreateTokenRequest, IntrospectRequest, IntrospectResponse, MessageResponse, TokenListResponse,
    TokenResponse,
};
use crate::auth::CurrentUser;
use crate::error::DashboardError;
use crate::issuance::{self, IssueRequest};
use crate::state::AppState;

/// `GET /api/cli/tokens`: live tokens the user created (all for admins).
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<TokenListResponse>, DashboardError> {
    let records = state.store().list_tokens(user.owner_filter()).await?;
    Ok(Json(TokenListResponse {
        tokens: records.iter().map(TokenResponse::from).collect(),
    }))
}

/// `POST /api/cli/tokens`
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), DashboardError> {
    let days = body
        .expiration_days
        .unwrap_or(state.config().signing.default_expiration_days);

    let record = issuance::issue(
        &state,
        &user,
        IssueRequest {
            target: body.target,
            grantee: body.grantee,
            expiry: Expiry::from_days(days),
            name: body.name,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(TokenResponse::from(&record))))
}

/// `DELETE /api/cli/tokens/{id}`: soft delete.
pub async fn revoke(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, DashboardError> {
    let record = state
        .store()
        .find_token(id)
        .await?
        .filter(|t| !t.is_revoked())
        .ok_or_else(|| DashboardError::NotFound(format!("token {id}")))?;

    if !user.can_manage(record.created_by) {
        return Err(DashboardError::Forbidden(format!("you did not create token {id}")));
    }
    if !state.store().revoke_token(id).await? {
        return Err(DashboardError::NotFound(format!("token {id}")));
    }
    Ok(Json(MessageResponse::new(format!("Token {id} revoked"))))
}

/// `POST /api/cli/tokens/introspect`
///
/// A token is active when its signature verifies against a published key,
/// it has not expired, its record exists and is not revoked, and the
/// database or group it grants access to still exists and is not archived.
pub async fn introspect(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(body): Json<IntrospectRequest>,
) -> Result<Json<IntrospectResponse>, DashboardError> {
    let verified = match state.verifier().verify(&body.token) {
        Ok(verified) => verified,
        Err(TokenError::TokenExpired) => return Ok(Json(IntrospectResponse::inactive("expired"))),
        Err(e) => {
            tracing::debug!(error = %e, "introspection: invalid token");
            return Ok(Json(IntrospectResponse::inactive("invalid")));
        }
    };

    let Some(record) = state.store().find_token_by_value(body.token.trim()).await? else {
        return Ok(Json(IntrospectResponse::inactive("unknown")));
    };
    if record.is_revoked() {
        return Ok(Json(IntrospectResponse {
            token_id: Some(record.id),
            ..IntrospectResponse::inactive("revoked")
        }));
    }
    if !subject_is_live(&state, &record).await? {
        return Ok(Json(IntrospectResponse {
            token_id: Some(record.id),
            ..IntrospectResponse::inactive("archived")
        }));
    }
    if !record.is_active_at(Utc::now()) {
        return Ok(Json(IntrospectResponse {
            token_id: Some(record.id),
            ..IntrospectResponse::inactive("expired")
        }));
    }

    Ok(Json(IntrospectResponse {
        active: true,
        reason: None,
        token_id: Some(record.id),
        access: Some(verified.claims.access_level()),
        is_group: Some(verified.is_group),
        claims: Some(verified.claims),
    }))
}

async fn subject_is_live(state: &AppState, record: &TokenRecord) -> Result<bool, DashboardError> {
    let store = state.store();
    let live = match (record.database_id, record.group_id) {
        (Some(id), _) => store.find_database(id).await?.is_some_and(|db| !db.is_archived()),
        (None, Some(id)) => store.find_group(id).await?.is_some(),
        (None, None) => false,
    };
    Ok(live)
}
