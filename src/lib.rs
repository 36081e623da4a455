//! # Warden
//!
//! A super-admin back office: administrator accounts, role assignments, and
//! an append-only audit trail of privileged actions, served over a REST API.
//!
//! ## Overview
//!
//! Warden can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `warden-server` binary
//! 2. **As a library** - Mount the router inside your own axum application
//!
//! ## Request flow
//!
//! ```text
//! request -> access gate (bearer token -> identity -> role) -> handler
//!         -> audit interceptor (success only, fire-and-forget) -> response
//! ```
//!
//! The access gate lives in [`auth::middleware`]; audit recording is handed
//! off to a background writer in [`audit`], so responses are never delayed
//! by trail writes.
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden::{api, audit::AuditSink, auth::jwt::AuthService, db::Store, AppState};
//!
//! let config = Arc::new(warden::utils::config::Config::from_env()?);
//! let store = Arc::new(Store::new_local(&config.database.path).await?);
//! let auth = Arc::new(AuthService::from_config(&config.auth)?);
//! store.seed(&auth).await?;
//!
//! let state = AppState::new(config, store, auth);
//! let app = api::routes::create_router(state.clone()).with_state(state);
//! ```
//!
//! ## Configuration
//!
//! Everything comes from the environment (`.env` supported), read once at
//! startup: `JWT_SECRET` (required), `TOKEN_EXPIRY_HOURS`, `HASH_TIME_COST`,
//! `DATABASE_PATH`, `HOST`, `PORT`.

#![warn(missing_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Audit trail recording (sink, worker, interceptor middleware).
pub mod audit;
/// Authentication gate: password hashing, bearer tokens, middleware.
pub mod auth;
/// libsql/SQLite persistence.
pub mod db;
/// Core types (entities, requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use audit::AuditSink;
pub use auth::jwt::AuthService;
pub use db::Store;
pub use types::{AppError, Result};
pub use utils::config::Config;

use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Process configuration, built once at startup.
    pub config: Arc<Config>,
    /// Relational store.
    pub store: Arc<Store>,
    /// Password hashing and token service.
    pub auth: Arc<AuthService>,
    /// Handle to the background audit writer.
    pub audit: AuditSink,
    /// Process start time, for the diagnostics endpoint.
    pub started: Instant,
}

impl AppState {
    /// Wires up shared state and spawns the audit writer task.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(config: Arc<Config>, store: Arc<Store>, auth: Arc<AuthService>) -> Self {
        let audit = AuditSink::spawn(store.clone());

        Self {
            config,
            store,
            auth,
            audit,
            started: Instant::now(),
        }
    }
}
