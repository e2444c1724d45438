//! Request authentication middleware.
//!
//! Two independent gates:
//! 1. Clinic routes resolve the tenant from `X-Api-Key`.
//! 2. Scheduler routes check the shared `X-Scheduler-Secret`.
//!
//! Both compare secrets in constant time.

pub mod auth;
pub mod scheduler;
