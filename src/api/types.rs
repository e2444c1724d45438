//! Shared types for the HTTP layer.

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;

use crate::db::{self, DatabaseError};
use crate::models::ClinicId;
use crate::recall::RecallEngine;

/// Shared context for all API routes and middleware.
///
/// Handlers open their own short-lived connection per request via
/// [`ApiContext::open_db`]; WAL mode keeps readers and the dispatch
/// coordinator from blocking each other.
#[derive(Clone)]
pub struct ApiContext {
    pub db_path: Arc<PathBuf>,
    pub scheduler_secret: Arc<String>,
    pub engine: Arc<RecallEngine>,
}

impl ApiContext {
    pub fn new(db_path: PathBuf, scheduler_secret: String, engine: RecallEngine) -> Self {
        Self {
            db_path: Arc::new(db_path),
            scheduler_secret: Arc::new(scheduler_secret),
            engine: Arc::new(engine),
        }
    }

    /// Open a connection for the current request.
    pub fn open_db(&self) -> Result<Connection, DatabaseError> {
        db::open_database(&self.db_path)
    }
}

/// Authenticated clinic, injected into request extensions by the API-key
/// middleware after the key resolved to a tenant.
#[derive(Debug, Clone)]
pub struct ClinicContext {
    pub clinic_id: ClinicId,
    pub clinic_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DispatchConfig;
    use crate::notify::testing::RecordingChannel;

    fn test_context(path: PathBuf) -> ApiContext {
        let engine = RecallEngine::new(
            path.clone(),
            Arc::new(RecordingChannel::new()),
            DispatchConfig::default(),
        );
        ApiContext::new(path, "secret".into(), engine)
    }

    #[test]
    fn open_db_creates_and_migrates() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = test_context(tmp.path().join("api.db"));

        let conn = ctx.open_db().unwrap();
        assert!(db::count_tables(&conn).unwrap() > 0);
    }

    #[test]
    fn clones_share_the_engine() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = test_context(tmp.path().join("api.db"));
        let other = ctx.clone();
        assert!(Arc::ptr_eq(&ctx.engine, &other.engine));
    }
}
