//! Route definitions for the dashboard.

use crate::auth;
use crate::handlers::{bridge, databases, groups, public, stats, tokens};
use crate::state::AppState;
use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

/// Create the dashboard router.
pub fn create_router(state: AppState) -> Router {
    let authenticated = Router::new()
        .route("/logout", post(auth::logout))
        .route("/databases", get(databases::list).post(databases::create))
        .route("/databases/archived", get(databases::archived))
        .route("/databases/{name}", delete(databases::archive))
        .route("/databases/{name}/restore", post(databases::restore))
        .route("/databases/{name}/force", delete(databases::force_delete))
        .route("/databases/{name}/stats", get(stats::show))
        .route("/databases/{name}/stats/refresh", post(stats::refresh))
        .route("/groups", get(groups::list).post(groups::create))
        .route("/groups/{name}", delete(groups::delete))
        .route("/tokens", get(tokens::list).post(tokens::create))
        .route("/tokens/introspect", post(tokens::introspect))
        .route("/tokens/{id}", delete(tokens::revoke))
        .route("/bridge/databases", get(bridge::list_databases))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    let cli = Router::new()
        .route("/login", post(auth::login))
        .merge(authenticated)
        .route_layer(middleware::from_fn(auth::require_cli_source));

    Router::new()
        .route("/healthz", get(public::healthz))
        .route("/.well-known/jwks.json", get(public::jwks))
        .nest("/api/cli", cli)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
