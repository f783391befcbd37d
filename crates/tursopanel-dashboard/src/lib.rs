//! # tursopanel-dashboard
//!
//! JSON API of the tursopanel admin panel, as used by the `turso`-style CLI.
//!
//! - Session login/logout for CLI users
//! - Database and group records (create, archive, restore, force delete)
//! - Access token issuance, listing, revocation and introspection
//! - Stored and on-demand sqld stats
//! - Bridge listing of provisioned database directories
//! - Public key publication at `/.well-known/jwks.json`
//!
//! All `/api/cli` routes require `X-Request-Source: CLI`; everything but
//! login also requires a bearer session token.

pub mod api_types;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod issuance;
pub mod routes;
pub mod server;
pub mod state;
pub mod validation;

pub use error::DashboardError;
pub use routes::create_router;
pub use server::DashboardServer;
pub use state::AppState;
