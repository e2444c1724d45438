//! Per-clinic API key authentication.
//!
//! Extracts `X-Api-Key`, resolves it to a clinic, and injects
//! `ClinicContext` into request extensions for downstream handlers.
//! The key doubles as the tenant selector: every repository call a
//! handler makes is scoped by the clinic id resolved here.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ClinicContext};
use crate::db;

/// Require a valid per-clinic API key.
///
/// Accesses `ApiContext` from request extensions (injected by the
/// Extension layer). On success: injects `ClinicContext`.
pub async fn require_clinic(
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    match require_clinic_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_clinic_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let key = req
        .headers()
        .get("X-Api-Key")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    // Constant-time scan over all clinic keys. Clinics number in the tens,
    // so the extra comparisons cost nothing next to the request itself.
    let clinic = {
        let conn = ctx.open_db()?;
        db::get_all_clinics(&conn)?
            .into_iter()
            .find(|c| bool::from(c.api_key.as_bytes().ct_eq(key.as_bytes())))
            .ok_or(ApiError::Unauthorized)?
    }; // Connection dropped here, before any .await

    req.extensions_mut().insert(ClinicContext {
        clinic_id: clinic.id,
        clinic_name: clinic.name,
    });

    Ok(next.run(req).await)
}
