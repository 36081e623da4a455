//! HTTP request handlers.

pub mod analytics;
pub mod audit;
pub mod auth;
pub mod roles;
pub mod status;
pub mod users;
