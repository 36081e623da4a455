//! Authentication and authorization gate.
//!
//! Two layers make up the gate:
//!
//! - [`jwt`] - password hashing (Argon2id) and HS256 bearer tokens with a
//!   single configurable lifetime, behind [`jwt::AuthService`]
//! - [`middleware`] - axum middleware that verifies the token, loads the
//!   acting identity, and optionally enforces role membership before a
//!   request reaches its handler
//!
//! The gate is a short-circuiting chain: Unauthenticated -> (valid token,
//! live identity) -> Authenticated -> (role match) -> Authorized. Any
//! failure rejects immediately with a terminal 401/403 and the handler is
//! never invoked.

/// Token issue/verify and password hashing.
pub mod jwt;
/// Access-gate middleware and the actor extractor.
pub mod middleware;
