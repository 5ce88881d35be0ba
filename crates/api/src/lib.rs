//! REST API server and endpoints.
//!
//! This crate exposes the strategy lifecycle over HTTP:
//! - Strategy creation with synchronous validation
//! - Pause/resume controls
//! - Manual "execute now" triggers
//! - Ledger listing and reconciliation reports

/// Error types.
pub mod error;
/// Request handlers.
pub mod handlers;
/// API request/response models.
pub mod models;
/// Route definitions.
pub mod routes;
/// Server configuration and startup.
pub mod server;
/// Application state.
pub mod state;

pub use error::ApiError;
pub use server::{ApiServer, ServerConfig};
pub use state::AppState;
