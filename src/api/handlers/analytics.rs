//! Back-office analytics.

use crate::{
    types::{AnalyticsSummary, Result},
    AppState,
};
use axum::{extract::State, Json};
use chrono::{Duration, Utc};

/// Headline counts for the dashboard
#[utoipa::path(
    get,
    path = "/api/v1/superadmin/analytics/summary",
    responses(
        (status = 200, description = "Totals and recent login count", body = AnalyticsSummary)
    ),
    tag = "analytics"
)]
pub async fn get_summary(State(state): State<AppState>) -> Result<Json<AnalyticsSummary>> {
    let week_ago = (Utc::now() - Duration::days(7)).timestamp();

    Ok(Json(AnalyticsSummary {
        total_users: state.store.count_users().await?,
        total_roles: state.store.count_roles().await?,
        recent_logins: state.store.count_recent_logins(week_ago).await?,
    }))
}
