//! API endpoint handlers.
//!
//! The scheduler module drives the recall engine; the rest is the thin
//! clinic back-office surface, tenant-scoped by the auth middleware.

pub mod expenses;
pub mod health;
pub mod invoices;
pub mod patients;
pub mod rules;
pub mod scheduler;
pub mod settings;
pub mod treatments;
