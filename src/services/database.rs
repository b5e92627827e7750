// Relational database checker

use async_trait::async_trait;
use http::StatusCode;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement};
use std::sync::Arc;
use std::time::Duration;

use super::{StatusCheck, StatusReport};
use crate::error::{HealthCheckError, HealthCheckResult};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a small pool for status checks.
///
/// Sea-ORM connects eagerly, so an unreachable server fails here.
pub async fn connect_database(url: &str) -> HealthCheckResult<DatabaseConnection> {
    let mut opts = ConnectOptions::new(url.to_string());
    opts.max_connections(2)
        .min_connections(1)
        .connect_timeout(CONNECT_TIMEOUT)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .sqlx_logging(false);

    Database::connect(opts)
        .await
        .map_err(|e| HealthCheckError::Database(e.to_string()))
}

/// Runs `SELECT 1` against a pooled connection on every check
pub struct DatabaseChecker {
    conn: Arc<DatabaseConnection>,
}

impl DatabaseChecker {
    /// Rejects embedded SQLite connections, which have no server to query
    pub fn new(conn: impl Into<Arc<DatabaseConnection>>) -> HealthCheckResult<Self> {
        let conn = conn.into();
        if conn.get_database_backend() == DbBackend::Sqlite {
            return Err(HealthCheckError::Config(
                "Status check is not supported for SQLite backend".to_string(),
            ));
        }

        Ok(Self { conn })
    }
}

#[async_trait]
impl StatusCheck for DatabaseChecker {
    async fn check(&self) -> StatusReport {
        let backend = self.conn.get_database_backend();
        match self
            .conn
            .execute(Statement::from_string(backend, "SELECT 1".to_string()))
            .await
        {
            Ok(_) => StatusReport::message(StatusCode::OK, "OK"),
            Err(e) => {
                tracing::warn!("Database check failed: {}", e);
                StatusReport::message(StatusCode::SERVICE_UNAVAILABLE, "DB Not available")
            }
        }
    }
}
