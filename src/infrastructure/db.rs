//! PostgreSQL connection management and schema bootstrap

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::config::{AppConfig, DatabaseConfig};
use crate::domain::DomainError;

/// SQLSTATE codes the repositories map onto distinct domain errors
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const CHECK_VIOLATION: &str = "23514";
const SERIALIZATION_FAILURE: &str = "40001";
const LOCK_NOT_AVAILABLE: &str = "55P03";

/// Handle to the PostgreSQL connection pool.
///
/// The pool is the shared resource; each repository call checks out one
/// connection per unit of work. Transactions are caller-owned: the
/// repositories never begin or commit one themselves.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool using the given configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        info!("PostgreSQL connection established");

        Ok(Self::new(pool))
    }

    /// Open a pool from `AppConfig::load()`, honoring `.env` and `APP__`
    /// environment overrides
    pub async fn from_env() -> Result<Self, DomainError> {
        let config = AppConfig::load()?;
        Self::connect(&config.database).await
    }

    /// Begin a new database transaction.
    ///
    /// The caller owns the transaction's lifetime; locking finders require
    /// one so the acquired row locks survive until the caller commits.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin transaction", e))
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the idempotent schema DDL for teams and members
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure schema", e))?;
        }

        info!("Schema ensured");

        Ok(())
    }
}

const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS teams (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS members (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        age INTEGER NOT NULL CHECK (age >= 0),
        team_id BIGINT REFERENCES teams(id) ON DELETE RESTRICT,
        version BIGINT NOT NULL DEFAULT 0,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_members_name ON members(name)",
    "CREATE INDEX IF NOT EXISTS idx_members_age ON members(age)",
    "CREATE INDEX IF NOT EXISTS idx_members_team_id ON members(team_id)",
];

/// Map an sqlx error onto the domain error taxonomy.
///
/// SQLSTATE class 23 (integrity violations) surfaces as `Conflict`,
/// serialization failures as `StaleData`, lock-wait failures as
/// `LockTimeout`. Everything else is an opaque storage failure.
pub(crate) fn map_sqlx_error(context: &str, error: sqlx::Error) -> DomainError {
    match &error {
        sqlx::Error::RowNotFound => DomainError::not_found(format!("{}: row not found", context)),
        sqlx::Error::Database(db_error) => match db_error.code().as_deref() {
            Some(UNIQUE_VIOLATION) | Some(FOREIGN_KEY_VIOLATION) | Some(CHECK_VIOLATION) => {
                DomainError::conflict(format!("{}: {}", context, db_error.message()))
            }
            Some(SERIALIZATION_FAILURE) => {
                DomainError::stale_data(format!("{}: {}", context, db_error.message()))
            }
            Some(LOCK_NOT_AVAILABLE) => {
                DomainError::lock_timeout(format!("{}: {}", context, db_error.message()))
            }
            _ => DomainError::storage(format!("{}: {}", context, db_error.message())),
        },
        _ => DomainError::storage(format!("{}: {}", context, error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    /// Database error carrying only a SQLSTATE code
    #[derive(Debug)]
    struct StubDbError(&'static str);

    impl std::fmt::Display for StubDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "SQLSTATE {}", self.0)
        }
    }

    impl std::error::Error for StubDbError {}

    impl sqlx::error::DatabaseError for StubDbError {
        fn message(&self) -> &str {
            "constraint failed"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    fn db_error(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(StubDbError(code)))
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let mapped = map_sqlx_error("get member", sqlx::Error::RowNotFound);
        assert!(mapped.is_not_found());
    }

    #[test]
    fn test_integrity_violations_map_to_conflict() {
        for code in [UNIQUE_VIOLATION, FOREIGN_KEY_VIOLATION, CHECK_VIOLATION] {
            let mapped = map_sqlx_error("save member", db_error(code));
            assert!(matches!(mapped, DomainError::Conflict { .. }), "{}", code);
        }
    }

    #[test]
    fn test_serialization_failure_maps_to_stale_data() {
        let mapped = map_sqlx_error("save member", db_error(SERIALIZATION_FAILURE));
        assert!(matches!(mapped, DomainError::StaleData { .. }));
    }

    #[test]
    fn test_lock_wait_failure_maps_to_lock_timeout() {
        let mapped = map_sqlx_error("find members locked", db_error(LOCK_NOT_AVAILABLE));
        assert!(matches!(mapped, DomainError::LockTimeout { .. }));
    }

    #[test]
    fn test_unknown_sqlstate_maps_to_storage() {
        let mapped = map_sqlx_error("save member", db_error("42601"));
        assert!(matches!(mapped, DomainError::Storage { .. }));
    }

    #[test]
    fn test_other_errors_map_to_storage() {
        let mapped = map_sqlx_error("get member", sqlx::Error::PoolClosed);
        assert!(matches!(mapped, DomainError::Storage { .. }));
    }
}
