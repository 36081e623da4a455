use crate::audit::{AuditJob, AuditSink};
use crate::auth::middleware::CurrentUser;
use axum::{
    extract::{RawPathParams, Request},
    middleware::Next,
    response::Response,
};
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::warn;

/// Handler-supplied audit payload.
///
/// A handler that knows more about its target than the path reveals (e.g.
/// role assignment, where the interesting ids arrive in the body) inserts
/// this into its response extensions; it takes precedence over the default
/// path-parameter details.
#[derive(Debug, Clone)]
pub struct AuditDetails(pub Value);

/// Builds middleware that appends one audit record, bound to `action` and
/// `target_type`, whenever the wrapped handler responds with a success
/// status (< 400). Failed operations append nothing.
///
/// The `id` path parameter, when present, becomes the record's target id.
/// Must run inside the access gate: the acting user is read from request
/// extensions.
///
/// For use with `middleware::from_fn`.
pub fn observe(
    sink: AuditSink,
    action: &'static str,
    target_type: &'static str,
) -> impl Fn(RawPathParams, Request, Next) -> BoxFuture<'static, Response> + Clone {
    move |params: RawPathParams, req: Request, next: Next| {
        let sink = sink.clone();
        Box::pin(async move {
            // Capture actor and route parameters before the handler consumes
            // the request.
            let actor = req.extensions().get::<CurrentUser>().cloned();

            let target_id = params
                .iter()
                .find(|(name, _)| *name == "id")
                .and_then(|(_, value)| value.parse::<i64>().ok());

            let mut param_map = serde_json::Map::new();
            for (name, value) in params.iter() {
                param_map.insert(name.to_string(), Value::String(value.to_string()));
            }

            let response = next.run(req).await;

            if response.status().as_u16() >= 400 {
                return response;
            }

            let Some(actor) = actor else {
                warn!(action, "no authenticated actor on audited route; skipping record");
                return response;
            };

            let details = response
                .extensions()
                .get::<AuditDetails>()
                .map(|d| d.0.clone())
                .or_else(|| {
                    if param_map.is_empty() {
                        None
                    } else {
                        Some(Value::Object(param_map))
                    }
                });

            sink.record(AuditJob {
                action,
                target_type,
                target_id,
                details,
                actor_id: actor.id,
            });

            response
        })
    }
}
