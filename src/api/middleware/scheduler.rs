//! Scheduler trigger authentication.
//!
//! The external cron-style scheduler authenticates with a process-wide
//! shared secret in `X-Scheduler-Secret`. No tenant is resolved; the
//! trigger endpoints operate across all clinics.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// Require the shared scheduler secret, compared in constant time.
pub async fn require_scheduler_secret(
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    match require_secret_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_secret_inner(
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let provided = req
        .headers()
        .get("X-Scheduler-Secret")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::SchedulerSecretInvalid)?;

    let matches: bool = provided
        .as_bytes()
        .ct_eq(ctx.scheduler_secret.as_bytes())
        .into();
    if !matches {
        return Err(ApiError::SchedulerSecretInvalid);
    }

    Ok(next.run(req).await)
}
