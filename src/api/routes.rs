use crate::api::handlers::{analytics, audit, auth, roles, status, users};
use crate::audit::middleware::observe;
use crate::auth::middleware::require_role;
use crate::db::SUPERADMIN_ROLE;
use crate::AppState;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

/// Assembles the full route tree.
///
/// Every route under `/api/v1/superadmin` sits behind the superadmin gate;
/// state-changing routes additionally carry the audit interceptor, which runs
/// inside the gate so the acting identity is already resolved.
pub fn create_router(state: AppState) -> Router<AppState> {
    let sink = state.audit.clone();

    let superadmin = Router::new()
        // Users
        .route("/users", get(users::list_users))
        .route(
            "/users",
            post(users::create_user).route_layer(middleware::from_fn(observe(
                sink.clone(),
                "CREATE_USER",
                "User",
            ))),
        )
        .route("/users/{id}", get(users::get_user))
        .route(
            "/users/{id}",
            put(users::update_user).route_layer(middleware::from_fn(observe(
                sink.clone(),
                "UPDATE_USER",
                "User",
            ))),
        )
        .route(
            "/users/{id}",
            delete(users::delete_user).route_layer(middleware::from_fn(observe(
                sink.clone(),
                "DELETE_USER",
                "User",
            ))),
        )
        // Roles
        .route("/roles", get(roles::list_roles))
        .route(
            "/roles",
            post(roles::create_role).route_layer(middleware::from_fn(observe(
                sink.clone(),
                "CREATE_ROLE",
                "Role",
            ))),
        )
        .route(
            "/roles/{id}",
            put(roles::update_role).route_layer(middleware::from_fn(observe(
                sink.clone(),
                "UPDATE_ROLE",
                "Role",
            ))),
        )
        .route(
            "/assign-role",
            post(roles::assign_role).route_layer(middleware::from_fn(observe(
                sink.clone(),
                "ASSIGN_ROLE",
                "User",
            ))),
        )
        // Audit trail and analytics
        .route("/audit-logs", get(audit::list_audit_logs))
        .route("/analytics/summary", get(analytics::get_summary))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_role(SUPERADMIN_ROLE),
        ));

    let api = Router::new()
        .route("/auth/login", post(auth::login))
        .route(
            "/auth/me",
            get(auth::me).route_layer(middleware::from_fn_with_state(
                state.clone(),
                crate::auth::middleware::require_auth,
            )),
        )
        .route("/debug/db-status", get(status::db_status))
        .route("/debug/server-status", get(status::server_status))
        .nest("/superadmin", superadmin);

    Router::new()
        .route("/health", get(status::health))
        .nest("/api/v1", api)
        .fallback(status::not_found)
}
