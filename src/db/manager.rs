//! Connection pool lifecycle management.
//!
//! Owns the single active `PgPool` and supports hot replacement while
//! serving: a candidate pool is probed before it is accepted, the swap is a
//! single slot write (readers always see a complete old or new handle), and
//! the displaced pool is closed after the swap so in-flight queries finish.

use crate::error::{DbError, DbResult};
use crate::models::{ConnectionInfo, ConnectionSummary, StatusReport};
use crate::store::ConfigStore;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Liveness probe issued against every candidate pool and by the status
/// reporter.
const PROBE_SQL: &str = "SELECT now()";

/// Handle to the active pool, cloned out to callers.
///
/// `PgPool` is internally reference-counted, so clones observe the same pool.
#[derive(Debug, Clone)]
pub struct PoolHandle {
    pool: PgPool,
    info: Arc<ConnectionInfo>,
}

impl PoolHandle {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn info(&self) -> &ConnectionInfo {
        &self.info
    }
}

/// Owns the lifecycle of exactly one active connection pool.
///
/// An injectable component, not module-level state; tests instantiate
/// independent managers with their own config stores.
pub struct PoolManager {
    active: RwLock<Option<PoolHandle>>,
    /// Serializes configure calls. Held around build/probe/swap only, never
    /// around query execution.
    reconfigure: Mutex<()>,
    store: Arc<dyn ConfigStore>,
}

impl PoolManager {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            active: RwLock::new(None),
            reconfigure: Mutex::new(()),
            store,
        }
    }

    /// Replace the active pool with one built from `info`.
    ///
    /// All-or-nothing: the candidate is probed first, and on failure the
    /// previously active pool (if any) is untouched. On success the new pool
    /// becomes active, the old one is closed in the background, and the
    /// connection record is handed to the config store. A persistence failure
    /// is logged but does not roll back the swap.
    pub async fn configure(&self, info: ConnectionInfo) -> DbResult<ConnectionSummary> {
        let _guard = self.reconfigure.lock().await;

        info!(target = %info.masked_dsn(), "Configuring database connection");

        let candidate = build_pool(&info);
        if let Err(err) = sqlx::query(PROBE_SQL).execute(&candidate).await {
            candidate.close().await;
            let err = DbError::from(err);
            warn!(target = %info.masked_dsn(), error = %err, "Candidate pool failed liveness probe");
            return Err(match err {
                DbError::Query { message, .. } => DbError::connection(message),
                other => DbError::connection(other.to_string()),
            });
        }

        let summary = info.summary();
        let handle = PoolHandle {
            pool: candidate,
            info: Arc::new(info.clone()),
        };

        let previous = {
            let mut slot = self.active.write().await;
            slot.replace(handle)
        };

        if let Some(old) = previous {
            info!(target = %old.info.masked_dsn(), "Closing replaced connection pool");
            // Close after the swap; waits for checked-out connections to be
            // returned, so in-flight queries complete.
            tokio::spawn(async move {
                old.pool.close().await;
            });
        }

        if let Err(err) = self.store.save(&info) {
            warn!(error = %err, "Connection accepted but persisting the configuration failed");
        }

        info!(target = %info.masked_dsn(), "Database connection established");
        Ok(summary)
    }

    /// The active pool handle, or None if never configured.
    pub async fn current(&self) -> Option<PoolHandle> {
        self.active.read().await.clone()
    }

    /// The active pool, or `NotConfigured`.
    pub async fn pool(&self) -> DbResult<PgPool> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|handle| handle.pool.clone())
            .ok_or(DbError::NotConfigured)
    }

    /// Probe the active pool and report its state with a redacted summary.
    ///
    /// Short-circuits to `not_configured` without touching the database when
    /// no pool is active.
    pub async fn status(&self) -> StatusReport {
        let Some(handle) = self.current().await else {
            return StatusReport::not_configured();
        };

        match sqlx::query(PROBE_SQL).execute(&handle.pool).await {
            Ok(_) => StatusReport::connected(handle.info.summary()),
            Err(err) => StatusReport::error(DbError::from(err).to_string()),
        }
    }

    /// Gracefully close the active pool. Idempotent; safe with no active pool.
    pub async fn shutdown(&self) {
        let previous = {
            let mut slot = self.active.write().await;
            slot.take()
        };

        if let Some(handle) = previous {
            info!(target = %handle.info.masked_dsn(), "Closing connection pool");
            handle.pool.close().await;
        }
    }
}

impl std::fmt::Debug for PoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolManager").finish_non_exhaustive()
    }
}

/// Build a lazily-connecting pool from the connection record. The liveness
/// probe in `configure` establishes the first real connection.
fn build_pool(info: &ConnectionInfo) -> PgPool {
    let mut options = PgConnectOptions::new()
        .host(&info.host)
        .port(info.port)
        .database(&info.database)
        .username(&info.user)
        .ssl_mode(if info.ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Disable
        });
    if let Some(password) = &info.password {
        options = options.password(password);
    }

    PgPoolOptions::new()
        .max_connections(info.max_pool_size)
        .idle_timeout(Some(info.idle_timeout()))
        .acquire_timeout(info.connect_timeout())
        .connect_lazy_with(options)
}
