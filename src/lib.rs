//! Recalla: multi-tenant back-office for aesthetic clinics, built
//! around a rule-driven patient recall engine.
//!
//! Clinics record treatments; reminder rules say how many days after a
//! treatment a patient should be called back. An external scheduler
//! hits the API on its own cadence, and the engine works out who is
//! due, renders the clinic's message template, and sends it over the
//! configured notification channel. Everything is tenant-scoped by an
//! API key per clinic.
//!
//! Module map:
//! - [`models`]: domain types shared by storage, engine, and API;
//! - [`db`]: SQLite access and per-table repositories;
//! - [`recall`]: due-pair evaluation, template rendering, dispatch;
//! - [`notify`]: outbound channels (Telegram, or disabled);
//! - [`api`]: axum HTTP surface and auth middleware;
//! - [`config`]: environment-driven startup configuration.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod notify;
pub mod recall;
