//! Common types: persisted entities, API request/response shapes, and error handling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============= Persisted Entities =============

/// A stored administrator account.
///
/// The password is only ever held as an argon2 PHC hash; this type is never
/// serialized directly into API responses.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// Unix timestamp of the last successful login, if any.
    pub last_login: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A named bundle of permission strings.
///
/// Membership (via the user-role association) is the authorization signal;
/// the permission list is stored and served but not evaluated per-operation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub permissions: Vec<String>,
}

/// An immutable audit trail entry for a privileged state-changing action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: i64,
    pub action: String,
    pub target_type: String,
    pub target_id: Option<i64>,
    pub details: Option<serde_json::Value>,
    pub actor_id: i64,
    /// The acting user resolved at display time; null when the account has
    /// since been deleted.
    pub actor: Option<ActorInfo>,
    pub timestamp: DateTime<Utc>,
}

/// Actor identity embedded in audit listings.
#[derive(Debug, Clone, Serialize)]
pub struct ActorInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
}

// ============= API Request/Response Types =============

/// User shape returned by the API (never includes the password hash).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub roles: Vec<Role>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

#[derive(Debug, Serialize)]
pub struct LoginUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
    /// When present, the password is rehashed; otherwise it is left untouched.
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateRoleRequest {
    pub name: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    pub user_id: i64,
    pub role_id: i64,
}

/// Page/limit query parameters, defaulting to 1/10.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        i64::from(self.page.unwrap_or(1).max(1))
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.limit.unwrap_or(10).max(1))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListResponse {
    pub users: Vec<UserView>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total_users: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub user_id: Option<i64>,
    pub action: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogResponse {
    pub audit_logs: Vec<AuditRecord>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total_logs: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_users: i64,
    pub total_roles: i64,
    pub recent_logins: i64,
}

// ============= Authentication Types =============

/// JWT claims carried by an issued bearer token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Database(msg) | AppError::Internal(msg) => {
                // Full detail stays server-side; callers get a generic message
                // outside of debug builds.
                tracing::error!("internal error: {}", msg);
                let message = if cfg!(debug_assertions) {
                    msg
                } else {
                    "Internal server error".to_string()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
