//! Unauthenticated endpoints.

use crate::api_types::HealthResponse;
use crate::state::AppState;
use axum::{Json, extract::State};
use tursopanel_token::JwkSet;

/// `GET /healthz`
pub async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /.well-known/jwks.json`: the keys external verifiers accept tokens from.
pub async fn jwks(State(state): State<AppState>) -> Json<JwkSet> {
    Json(state.key_ring().jwks())
}
