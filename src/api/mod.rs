//! HTTP surface of the back-office.
//!
//! Routes are nested under `/api/` in three groups: clinic-scoped CRUD
//! behind the `X-Api-Key` middleware, the scheduler trigger behind the
//! `X-Scheduler-Secret` middleware, and an open health probe.
//!
//! The router is composable: `api_router()` returns a `Router` that can
//! be mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;
