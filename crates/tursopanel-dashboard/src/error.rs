//! Error types for the dashboard crate.

use crate::validation::FieldErrors;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tursopanel_sqld::{RefreshError, UpstreamError};
use tursopanel_store::StoreError;
use tursopanel_token::TokenError;

/// Errors that can occur in the dashboard.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Failed to start the server.
    #[error("failed to start dashboard: {0}")]
    StartupFailed(String),

    /// A CLI route was called without `X-Request-Source: CLI`.
    #[error("missing X-Request-Source: CLI header")]
    MissingCliSource,

    /// Missing, unknown or expired bearer session.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Policy check failed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Request body failed validation.
    #[error("the given data was invalid")]
    Validation(FieldErrors),

    /// Non-2xx from sqld or the bridge, passed through verbatim.
    #[error("upstream returned {status}")]
    UpstreamStatus { status: u16, body: String },

    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("token error: {0}")]
    Token(TokenError),

    #[error("database error: {0}")]
    Store(StoreError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for DashboardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { kind, name } => {
                DashboardError::Conflict(format!("{kind} '{name}' already exists"))
            }
            StoreError::NotFound { kind, name } => {
                DashboardError::NotFound(format!("{kind} '{name}'"))
            }
            other => DashboardError::Store(other),
        }
    }
}

impl From<TokenError> for DashboardError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::UnknownSubject { kind, id } => {
                DashboardError::NotFound(format!("{kind} with id {id}"))
            }
            TokenError::ExpiryOutOfRange { days } => {
                let mut errors = FieldErrors::default();
                errors.add(
                    "expiration_days",
                    format!("An expiration of {days} days is out of range."),
                );
                DashboardError::Validation(errors)
            }
            other => DashboardError::Token(other),
        }
    }
}

impl From<UpstreamError> for DashboardError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status { status, body } => {
                DashboardError::UpstreamStatus { status, body }
            }
            other => DashboardError::UpstreamUnreachable(other.to_string()),
        }
    }
}

impl From<RefreshError> for DashboardError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Upstream(e) => e.into(),
            RefreshError::Store(e) => e.into(),
            RefreshError::UnknownDatabase(name) => {
                DashboardError::NotFound(format!("database '{name}'"))
            }
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            DashboardError::UpstreamStatus { status, body } => {
                let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
                return (status, body.clone()).into_response();
            }
            DashboardError::Validation(errors) => {
                let body = json!({
                    "error": "validation_failed",
                    "message": self.to_string(),
                    "errors": errors,
                });
                return (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response();
            }
            DashboardError::MissingCliSource => {
                (StatusCode::BAD_REQUEST, "bad_request", self.to_string())
            }
            DashboardError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                "invalid or missing bearer token".to_string(),
            ),
            DashboardError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden", self.to_string()),
            DashboardError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            DashboardError::Conflict(_) => (StatusCode::CONFLICT, "conflict", self.to_string()),
            DashboardError::UpstreamUnreachable(_) => {
                (StatusCode::BAD_GATEWAY, "upstream_unreachable", self.to_string())
            }
            DashboardError::StartupFailed(_)
            | DashboardError::Token(_)
            | DashboardError::Store(_)
            | DashboardError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_upstream_status_is_verbatim() {
        let err = DashboardError::from(UpstreamError::Status {
            status: 503,
            body: "sqld is starting".to_string(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_text(response).await, "sqld is starting");
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let mut errors = FieldErrors::default();
        errors.add("name", "The name field is required.");
        let response = DashboardError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["errors"]["name"][0], "The name field is required.");
    }

    #[test]
    fn test_store_conflict_maps_to_409() {
        let err = DashboardError::from(StoreError::Conflict {
            kind: "database",
            name: "orders".to_string(),
        });
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_unknown_subject_maps_to_404() {
        let err = DashboardError::from(TokenError::UnknownSubject { kind: "group", id: 9 });
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_out_of_range_expiry_maps_to_422() {
        let err = DashboardError::from(TokenError::ExpiryOutOfRange { days: u32::MAX });
        match &err {
            DashboardError::Validation(errors) => assert!(errors.get("expiration_days").is_some()),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
