use crate::{
    audit::AuditJob,
    auth::middleware::Actor,
    types::{AppError, LoginRequest, LoginResponse, LoginUser, Result},
    AppState,
};
use axum::{extract::State, Json};

const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful: token plus user info"),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    };

    // Unknown email and wrong password are deliberately indistinguishable.
    let user = state
        .store
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Auth(BAD_CREDENTIALS.to_string()))?;

    if !state
        .auth
        .verify_password(&password, &user.password_hash)?
    {
        return Err(AppError::Auth(BAD_CREDENTIALS.to_string()));
    }

    state.store.touch_last_login(user.id).await?;

    let roles = state.store.roles_for_user(user.id).await?;
    let token = state.auth.issue_token(user.id, &user.email)?;

    state.audit.record(AuditJob {
        action: "LOGIN",
        target_type: "User",
        target_id: Some(user.id),
        details: None,
        actor_id: user.id,
    });

    Ok(Json(LoginResponse {
        token,
        user: LoginUser {
            id: user.id,
            name: user.name,
            email: user.email,
            roles: roles.into_iter().map(|r| r.name).collect(),
        },
    }))
}

/// Who am I: the identity behind the presented token. Lets a client restore
/// its session without re-sending credentials.
pub async fn me(State(state): State<AppState>, Actor(user): Actor) -> Result<Json<LoginUser>> {
    let roles = state.store.roles_for_user(user.id).await?;

    Ok(Json(LoginUser {
        id: user.id,
        name: user.name,
        email: user.email,
        roles: roles.into_iter().map(|r| r.name).collect(),
    }))
}
