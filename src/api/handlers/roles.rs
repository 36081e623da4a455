//! Role administration handlers.

use crate::{
    audit::middleware::AuditDetails,
    types::{AppError, AssignRoleRequest, CreateRoleRequest, Result, Role},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

fn validate_role_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Role name is required".to_string()));
    }
    Ok(())
}

pub async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<Role>>> {
    Ok(Json(state.store.list_roles().await?))
}

/// Create a role
#[utoipa::path(
    post,
    path = "/api/v1/superadmin/roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Role name already exists")
    ),
    tag = "roles"
)]
pub async fn create_role(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<Role>)> {
    validate_role_name(&payload.name)?;

    if state
        .store
        .get_role_by_name(payload.name.trim())
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Role with this name already exists".to_string(),
        ));
    }

    let id = state
        .store
        .create_role(payload.name.trim(), &payload.permissions)
        .await?;

    let role = state
        .store
        .get_role_by_id(id)
        .await?
        .ok_or_else(|| AppError::Internal("Created role not found".to_string()))?;

    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateRoleRequest>,
) -> Result<Json<Role>> {
    validate_role_name(&payload.name)?;

    if state.store.get_role_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("Role not found".to_string()));
    }

    // Renaming onto another role's name would break name uniqueness.
    if let Some(existing) = state.store.get_role_by_name(payload.name.trim()).await? {
        if existing.id != id {
            return Err(AppError::Conflict(
                "Role with this name already exists".to_string(),
            ));
        }
    }

    state
        .store
        .update_role(id, payload.name.trim(), &payload.permissions)
        .await?;

    let role = state
        .store
        .get_role_by_id(id)
        .await?
        .ok_or_else(|| AppError::Internal("Updated role not found".to_string()))?;

    Ok(Json(role))
}

/// Assign a role to a user. The audited target ids arrive in the body, so
/// the handler supplies them to the audit interceptor explicitly.
pub async fn assign_role(
    State(state): State<AppState>,
    Json(payload): Json<AssignRoleRequest>,
) -> Result<Response> {
    if state.store.get_user_by_id(payload.user_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    if state.store.get_role_by_id(payload.role_id).await?.is_none() {
        return Err(AppError::NotFound("Role not found".to_string()));
    }

    state
        .store
        .assign_role(payload.user_id, payload.role_id)
        .await?;

    let mut response = Json(serde_json::json!({
        "message": "Role assigned successfully"
    }))
    .into_response();

    response.extensions_mut().insert(AuditDetails(serde_json::json!({
        "userId": payload.user_id,
        "roleId": payload.role_id,
    })));

    Ok(response)
}
