use anyhow::Result;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::result::QueryResult;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Embedded database migrations — compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const MEMORY_DATABASE: &str = ":memory:";
const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Pragmas applied to every connection the pool opens.
#[derive(Debug)]
struct ConnectionOptions {
    enable_wal: bool,
}

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> std::result::Result<(), r2d2::Error> {
        let mut pragmas = format!("PRAGMA busy_timeout = {};", BUSY_TIMEOUT_MS);
        if self.enable_wal {
            pragmas.push_str(" PRAGMA journal_mode = WAL;");
        }
        conn.batch_execute(&pragmas).map_err(r2d2::Error::QueryError)
    }
}

pub fn create_pool(database_url: &str, pool_size: u32) -> Result<DbPool> {
    // Every in-memory connection is its own database, so share exactly one.
    let in_memory = database_url == MEMORY_DATABASE;
    let max_size = if in_memory { 1 } else { pool_size.max(1) };

    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(ConnectionOptions {
            enable_wal: !in_memory,
        }))
        .build(manager)
        .map_err(|e| anyhow::anyhow!("Failed to create pool for {}: {}", database_url, e))?;
    Ok(pool)
}

/// Run pending database migrations. Returns the list of applied migration names.
pub fn run_migrations(pool: &DbPool) -> Result<Vec<String>> {
    let mut conn = pool.get()?;
    let applied: Vec<String> = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?
        .iter()
        .map(|m| m.to_string())
        .collect();
    Ok(applied)
}

/// Storage access for a single request.
///
/// Extracting a session only clones the pool handle. The pooled connection is
/// checked out inside [`DbSession::run`], after every other extractor has
/// accepted the request, and goes back to the pool when `run` returns.
pub struct DbSession(DbPool);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for DbSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(DbSession(state.db_pool.clone()))
    }
}

impl DbSession {
    /// Checks out a connection and runs `f` against it on the blocking thread pool.
    pub async fn run<T, F>(self, f: F) -> std::result::Result<T, ApiError>
    where
        F: FnOnce(&mut SqliteConnection) -> QueryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.0;
        tokio::task::spawn_blocking(move || -> std::result::Result<T, ApiError> {
            let mut conn: DbConn = pool.get()?;
            Ok(f(&mut *conn)?)
        })
        .await?
    }
}

/// Fresh in-memory database with all migrations applied.
#[cfg(test)]
pub fn test_pool() -> DbPool {
    let pool = create_pool(MEMORY_DATABASE, 1).unwrap();
    run_migrations(&pool).unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_applied_once() {
        let pool = create_pool(MEMORY_DATABASE, 4).unwrap();
        assert_eq!(pool.max_size(), 1);

        let first = run_migrations(&pool).unwrap();
        assert_eq!(first.len(), 1);
        let second = run_migrations(&pool).unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn session_returns_connection_to_pool() {
        let pool = test_pool();
        let state = Arc::new(AppState {
            db_pool: pool.clone(),
            max_list_limit: 10,
        });

        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let session = DbSession::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(pool.state().idle_connections, 1);

        let count = session
            .run(crate::repository::count_items)
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(pool.state().idle_connections, 1);
    }

    #[tokio::test]
    async fn session_returns_connection_after_storage_error() {
        let pool = test_pool();
        let state = Arc::new(AppState {
            db_pool: pool.clone(),
            max_list_limit: 10,
        });

        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let session = DbSession::from_request_parts(&mut parts, &state)
            .await
            .unwrap();

        let result = session
            .run(|conn| -> QueryResult<()> {
                conn.batch_execute("SELECT * FROM missing_table;")
            })
            .await;
        assert!(matches!(result, Err(ApiError::Storage(_))));
        assert_eq!(pool.state().idle_connections, 1);
    }
}
