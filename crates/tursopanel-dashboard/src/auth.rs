//! Authentication for the CLI-facing API.
//!
//! Every `/api/cli` request must carry `X-Request-Source: CLI`. All routes
//! except login additionally need `Authorization: Bearer <session token>`,
//! where the token was handed out by [`login`].

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Duration;
use tursopanel_store::UserRecord;

use crate::api_types::{LoginRequest, LoginResponse, MessageResponse, UserSummary};
use crate::error::DashboardError;
use crate::state::AppState;
use crate::validation::FieldErrors;

/// Header identifying CLI traffic.
pub const REQUEST_SOURCE_HEADER: &str = "x-request-source";

/// Required value of [`REQUEST_SOURCE_HEADER`].
pub const CLI_SOURCE: &str = "CLI";

/// The authenticated user, placed in request extensions by [`require_session`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRecord);

impl CurrentUser {
    /// Admins bypass ownership checks.
    pub fn can_manage(&self, owner_id: i64) -> bool {
        self.0.is_admin || self.0.id == owner_id
    }

    /// Owner filter for list queries: `None` for admins.
    pub fn owner_filter(&self) -> Option<i64> {
        if self.0.is_admin { None } else { Some(self.0.id) }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = DashboardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(DashboardError::Unauthenticated)
    }
}

/// Reject requests that do not identify themselves as CLI traffic.
pub async fn require_cli_source(request: Request, next: Next) -> Result<Response, DashboardError> {
    let is_cli = request
        .headers()
        .get(REQUEST_SOURCE_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case(CLI_SOURCE));

    if !is_cli {
        return Err(DashboardError::MissingCliSource);
    }
    Ok(next.run(request).await)
}

/// Resolve the bearer session and attach [`CurrentUser`].
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, DashboardError> {
    let token = bearer_token(request.headers()).ok_or(DashboardError::Unauthenticated)?;
    let user = state
        .store()
        .resolve_session(token)
        .await?
        .ok_or(DashboardError::Unauthenticated)?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// `POST /api/cli/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, DashboardError> {
    let mut errors = FieldErrors::default();
    if body.username.trim().is_empty() {
        errors.add("username", "The username field is required.");
    }
    if body.password.is_empty() {
        errors.add("password", "The password field is required.");
    }
    errors.into_result()?;

    let Some(user) = state
        .store()
        .verify_credentials(body.username.trim(), &body.password)
        .await?
    else {
        tracing::info!(username = %body.username, "rejected login");
        return Err(DashboardError::Unauthenticated);
    };

    let ttl_hours = state.config().server.session_ttl_hours;
    let token = state
        .store()
        .create_session(user.id, Duration::hours(i64::from(ttl_hours)))
        .await?;

    tracing::info!(username = %user.username, "CLI login");
    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in_hours: ttl_hours,
        user: UserSummary::from(&user),
    }))
}

/// `POST /api/cli/logout`
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MessageResponse>, DashboardError> {
    if let Some(token) = bearer_token(&headers) {
        state.store().delete_session(token).await?;
    }
    tracing::info!(username = %user.username, "CLI logout");
    Ok(Json(MessageResponse::new("Logged out")))
}
