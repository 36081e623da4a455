//! Audit trail query handler.

use crate::{
    db::AuditFilter,
    types::{AppError, AuditLogResponse, AuditQuery, Result},
    AppState,
};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate};

/// Parses a filter boundary as either RFC 3339 or a plain `YYYY-MM-DD` day.
/// Day-granularity bounds are inclusive: the end date covers its whole day.
fn parse_date(input: &str, end_of_day: bool) -> Result<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.timestamp());
    }

    let day = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date: {}", input)))?;

    let time = if end_of_day {
        day.and_hms_opt(23, 59, 59)
    } else {
        day.and_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| AppError::Validation(format!("Invalid date: {}", input)))?;

    Ok(time.and_utc().timestamp())
}

/// List audit records, newest first, filtered by actor, action tag, and an
/// inclusive date range.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<AuditLogResponse>> {
    let page = i64::from(query.page.unwrap_or(1).max(1));
    let limit = i64::from(query.limit.unwrap_or(10).max(1));

    let filter = AuditFilter {
        actor_id: query.user_id,
        action: query.action.clone(),
        from: query
            .start_date
            .as_deref()
            .map(|d| parse_date(d, false))
            .transpose()?,
        to: query
            .end_date
            .as_deref()
            .map(|d| parse_date(d, true))
            .transpose()?,
    };

    let total_logs = state.store.count_audit(&filter).await?;
    let audit_logs = state.store.list_audit(&filter, page, limit).await?;

    Ok(Json(AuditLogResponse {
        audit_logs,
        total_pages: (total_logs + limit - 1) / limit,
        current_page: page,
        total_logs,
    }))
}
