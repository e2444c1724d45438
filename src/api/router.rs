//! HTTP router.
//!
//! Returns a composable `Router` with all routes nested under `/api/`.
//!
//! Route groups (each with its own middleware):
//! - clinic back-office CRUD, gated by `X-Api-Key`;
//! - scheduler trigger, gated by `X-Scheduler-Secret`;
//! - unauthenticated health probe.
//!
//! Middleware uses `Extension<ApiContext>` (injected as the outermost
//! layer). Endpoint handlers use `State<ApiContext>` (via `with_state`).

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the API router.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    // Clinic-scoped routes. The auth middleware resolves X-Api-Key to a
    // ClinicContext, so every handler below sees exactly one tenant.
    //
    // Layers are applied from bottom (innermost) to top (outermost):
    //   Extension (outermost) → Auth → Handler
    let clinic = Router::new()
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:id",
            put(endpoints::patients::update).delete(endpoints::patients::remove),
        )
        .route(
            "/patients/:id/treatments",
            get(endpoints::treatments::list_for_patient).post(endpoints::treatments::create),
        )
        .route("/treatments", get(endpoints::treatments::list))
        .route("/treatments/:id", delete(endpoints::treatments::remove))
        .route(
            "/rules",
            get(endpoints::rules::list).post(endpoints::rules::create),
        )
        .route(
            "/rules/:id",
            put(endpoints::rules::update).delete(endpoints::rules::remove),
        )
        .route(
            "/expenses",
            get(endpoints::expenses::list).post(endpoints::expenses::create),
        )
        .route("/expenses/:id", delete(endpoints::expenses::remove))
        .route(
            "/invoices",
            get(endpoints::invoices::list).post(endpoints::invoices::create),
        )
        .route("/invoices/:id/paid", post(endpoints::invoices::mark_paid))
        .route(
            "/settings",
            get(endpoints::settings::profile).put(endpoints::settings::update),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_clinic))
        .layer(axum::Extension(ctx.clone()));

    // Scheduler trigger routes, shared-secret gated.
    let scheduler = Router::new()
        .route(
            "/scheduler/recall",
            get(endpoints::scheduler::pending).post(endpoints::scheduler::run),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(
            middleware::scheduler::require_scheduler_secret,
        ))
        .layer(axum::Extension(ctx.clone()));

    // Unauthenticated liveness probe.
    let open = Router::new()
        .route("/health", get(endpoints::health::check))
        .with_state(ctx);

    Router::new()
        .nest("/api", clinic)
        .nest("/api", scheduler)
        .nest("/api", open)
}
