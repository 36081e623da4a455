use crate::types::AppError;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use futures::future::BoxFuture;

const NO_TOKEN: &str = "Access denied. No token provided.";
const BAD_TOKEN: &str = "Token is not valid.";

/// The authenticated identity attached to a request after the gate passes.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// Pulls the bearer token out of the authorization header.
fn bearer_token(req: &Request) -> Result<String, AppError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Auth(NO_TOKEN.to_string()))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| AppError::Auth(BAD_TOKEN.to_string()))
}

/// Resolves a bearer token into a [`CurrentUser`].
///
/// A malformed or expired token, a bad signature, and a subject that no
/// longer exists all collapse to the same 401; the caller cannot tell which
/// check failed.
async fn authenticate(state: &AppState, token: &str) -> Result<CurrentUser, AppError> {
    let claims = state
        .auth
        .verify_token(token)
        .map_err(|_| AppError::Auth(BAD_TOKEN.to_string()))?;

    let user = state
        .store
        .get_user_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Auth(BAD_TOKEN.to_string()))?;

    Ok(CurrentUser {
        id: user.id,
        name: user.name,
        email: user.email,
    })
}

/// Middleware requiring a valid bearer token. Attaches the resolved
/// [`CurrentUser`] to request extensions for downstream handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&req)?;
    let user = authenticate(&state, &token).await?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Middleware constructor requiring authentication plus membership of the
/// named role. The checks are sequential and short-circuiting: an
/// authentication failure never reaches the role lookup.
///
/// For use with `middleware::from_fn_with_state`.
pub fn require_role(
    role: &'static str,
) -> impl Fn(State<AppState>, Request, Next) -> BoxFuture<'static, Result<Response, AppError>> + Clone
{
    move |State(state), mut req, next| {
        Box::pin(async move {
            let token = bearer_token(&req)?;
            let user = authenticate(&state, &token).await?;

            let roles = state.store.roles_for_user(user.id).await?;
            if !roles.iter().any(|r| r.name == role) {
                return Err(AppError::Forbidden(format!(
                    "Access denied. {} role required.",
                    role
                )));
            }

            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        })
    }
}

/// Extractor for the authenticated actor inside handlers.
pub struct Actor(pub CurrentUser);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(Actor)
            .ok_or_else(|| AppError::Auth(NO_TOKEN.to_string()))
    }
}
