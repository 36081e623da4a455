//! User administration handlers.

use crate::{
    types::{
        AppError, CreateUserRequest, PageQuery, Result, UpdateUserRequest, User, UserListResponse,
        UserView,
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::DateTime;
use regex::Regex;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

fn validate_profile(name: &str, email: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(AppError::Validation(
            "A valid email address is required".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

async fn user_view(state: &AppState, user: User) -> Result<UserView> {
    let roles = state.store.roles_for_user(user.id).await?;

    Ok(UserView {
        id: user.id,
        name: user.name,
        email: user.email,
        last_login: user.last_login.and_then(|t| DateTime::from_timestamp(t, 0)),
        created_at: DateTime::from_timestamp(user.created_at, 0).unwrap_or_default(),
        roles,
    })
}

/// List users, paginated (page/limit default 1/10), roles included.
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserListResponse>> {
    let (page, limit) = (query.page(), query.limit());

    let total_users = state.store.count_users().await?;
    let mut users = Vec::new();
    for user in state.store.list_users(page, limit).await? {
        users.push(user_view(&state, user).await?);
    }

    Ok(Json(UserListResponse {
        users,
        total_pages: (total_users + limit - 1) / limit,
        current_page: page,
        total_users,
    }))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserView>> {
    let user = state
        .store
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user_view(&state, user).await?))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/api/v1/superadmin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already in use")
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserView>)> {
    validate_profile(&payload.name, &payload.email)?;
    validate_password(&payload.password)?;

    if state
        .store
        .get_user_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "A user with this email already exists".to_string(),
        ));
    }

    let password_hash = state.auth.hash_password(&payload.password)?;
    let id = state
        .store
        .create_user(payload.name.trim(), &payload.email, &password_hash)
        .await?;

    let user = state
        .store
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::Internal("Created user not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(user_view(&state, user).await?)))
}

/// Update a user's profile; the password is rehashed only when supplied.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserView>> {
    validate_profile(&payload.name, &payload.email)?;

    if state.store.get_user_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    // Email must stay unique across other accounts.
    if let Some(existing) = state.store.get_user_by_email(&payload.email).await? {
        if existing.id != id {
            return Err(AppError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }
    }

    let password_hash = match &payload.password {
        Some(password) => {
            validate_password(password)?;
            Some(state.auth.hash_password(password)?)
        }
        None => None,
    };

    state
        .store
        .update_user(id, payload.name.trim(), &payload.email, password_hash.as_deref())
        .await?;

    let user = state
        .store
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::Internal("Updated user not found".to_string()))?;

    Ok(Json(user_view(&state, user).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    if state.store.get_user_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    state.store.delete_user(id).await?;

    Ok(Json(serde_json::json!({
        "message": "User deleted successfully"
    })))
}
