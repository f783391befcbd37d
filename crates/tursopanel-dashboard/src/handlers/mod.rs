//! Request handlers for the CLI-facing API.

pub mod bridge;
pub mod databases;
pub mod groups;
pub mod public;
pub mod stats;
pub mod tokens;
