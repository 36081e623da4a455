//! Database layer.
//!
//! A single libsql/SQLite store backs everything: administrator accounts,
//! roles and their assignments, and the append-only audit trail. Use
//! [`Store::new_local`] for a file-backed database or [`Store::new_memory`]
//! for an ephemeral one (tests, scratch development).

pub mod store;

pub use store::{AuditFilter, Store, SEED_ADMIN_EMAIL, SEED_ADMIN_PASSWORD, SUPERADMIN_ROLE};
