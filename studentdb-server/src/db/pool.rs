//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits. A `ConnectionProvider`
//! owns at most one pool per profile and hands out transactions from it.

use std::future::Future;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{PgPool, Postgres, Transaction};
use studentdb_core::config::Credentials;
use studentdb_core::{ConnectionProfile, DatabaseConfig};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::{DbError, DbResult};

/// Default maximum connections for the pool.
/// Kept low for single-user tooling.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Connection attempts made while a freshly provisioned database settles.
pub const PROVISIONING_ATTEMPTS: u32 = 3;

/// Pause between provisioning connection attempts.
pub const PROVISIONING_BACKOFF: Duration = Duration::from_secs(2);

/// Connection options for one set of credentials.
pub fn connect_options(config: &DatabaseConfig, credentials: Credentials<'_>) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(credentials.user)
        .password(credentials.password)
        .database(credentials.database)
}

/// Create a PostgreSQL connection pool.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/student_management").await?;
/// ```
pub async fn create_pool(database_url: &str) -> DbResult<PgPool> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS).await
}

/// Create a PostgreSQL connection pool with custom options.
pub async fn create_pool_with_options(database_url: &str, max_connections: u32) -> DbResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Open a unit of work.
///
/// The transaction commits only through `commit()`; dropping it (including
/// on an early `?` return) rolls everything back.
pub async fn unit_of_work(pool: &PgPool) -> DbResult<Transaction<'static, Postgres>> {
    Ok(pool.begin().await?)
}

/// Run `op` until it succeeds, fails with a non-transient error, or has been
/// tried `attempts` times. Sleeps `backoff` between tries.
pub async fn retry_transient<T, F, Fut>(attempts: u32, backoff: Duration, mut op: F) -> DbResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = DbResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= attempts || !err.is_transient() => return Err(err),
            Err(err) => {
                warn!(attempt, attempts, error = %err, "connection failed, retrying in {:?}", backoff);
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
        }
    }
}

/// Connect, retrying transient failures with a fixed backoff.
pub async fn connect_with_retry(
    options: PgConnectOptions,
    max_connections: u32,
    attempts: u32,
    backoff: Duration,
) -> DbResult<PgPool> {
    retry_transient(attempts, backoff, || {
        let options = options.clone();
        async move {
            PgPoolOptions::new()
                .max_connections(max_connections)
                .connect_with(options)
                .await
                .map_err(DbError::from)
        }
    })
    .await
}

/// Lazily opened pool bound to one connection profile
pub struct ConnectionProvider {
    options: PgConnectOptions,
    profile: ConnectionProfile,
    max_connections: u32,
    pool: Mutex<Option<PgPool>>,
}

impl ConnectionProvider {
    pub fn new(config: &DatabaseConfig, profile: ConnectionProfile) -> Self {
        Self {
            options: connect_options(config, config.credentials(profile)),
            profile,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            pool: Mutex::new(None),
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    pub fn profile(&self) -> ConnectionProfile {
        self.profile
    }

    /// Pool for this profile, opening it on first use.
    ///
    /// Concurrent callers share a single pool.
    pub async fn connect(&self) -> DbResult<PgPool> {
        let mut slot = self.pool.lock().await;
        if let Some(pool) = slot.as_ref().filter(|p| !p.is_closed()) {
            return Ok(pool.clone());
        }

        debug!(profile = %self.profile, "opening connection pool");
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .connect_with(self.options.clone())
            .await?;
        info!(profile = %self.profile, max_connections = self.max_connections, "connection pool ready");

        *slot = Some(pool.clone());
        Ok(pool)
    }

    /// Begin a transaction on this profile's pool.
    pub async fn unit_of_work(&self) -> DbResult<Transaction<'static, Postgres>> {
        let pool = self.connect().await?;
        unit_of_work(&pool).await
    }

    /// Close the pool if one is open. Safe to call repeatedly.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.lock().await.take() {
            pool.close().await;
            info!(profile = %self.profile, "connection pool closed");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.pool
            .lock()
            .await
            .as_ref()
            .is_some_and(|p| !p.is_closed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p studentdb-server -- --ignored

    #[tokio::test]
    async fn close_without_connect_is_noop() {
        let provider = ConnectionProvider::new(&DatabaseConfig::default(), ConnectionProfile::App);
        provider.close().await;
        provider.close().await;
        assert!(!provider.is_connected().await);
        assert_eq!(provider.profile(), ConnectionProfile::App);
    }

    fn refused_options() -> PgConnectOptions {
        // Port 1 on loopback refuses connections
        PgConnectOptions::new().host("127.0.0.1").port(1).username("nobody")
    }

    #[tokio::test]
    async fn unreachable_host_exhausts_attempts() {
        let tries = AtomicU32::new(0);
        let result = retry_transient(3, Duration::from_millis(1), || {
            tries.fetch_add(1, Ordering::SeqCst);
            async {
                PgPoolOptions::new()
                    .max_connections(1)
                    .acquire_timeout(Duration::from_millis(200))
                    .connect_with(refused_options())
                    .await
                    .map_err(DbError::from)
            }
        })
        .await;

        let err = result.expect_err("nothing listens on port 1");
        assert!(err.is_connection(), "unexpected error: {err}");
        assert!(err.is_transient());
        assert_eq!(tries.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_error_is_not_retried() {
        let tries = AtomicU32::new(0);
        let result: DbResult<()> = retry_transient(3, Duration::from_millis(1), || {
            tries.fetch_add(1, Ordering::SeqCst);
            async {
                Err(DbError::from(sqlx::Error::Configuration(
                    "password authentication failed".into(),
                )))
            }
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.is_connection());
        assert!(!err.is_transient());
        assert_eq!(tries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_error_then_success() {
        let tries = AtomicU32::new(0);
        let result = retry_transient(3, Duration::from_millis(1), || {
            let attempt = tries.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(DbError::from(sqlx::Error::PoolTimedOut))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(tries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_acquires_connection() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");

        let result: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query failed");

        assert_eq!(result.0, 1);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn dropped_unit_of_work_rolls_back() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");

        {
            let mut tx = unit_of_work(&pool).await.expect("begin failed");
            sqlx::query("CREATE TABLE IF NOT EXISTS uow_rollback_probe (n int)")
                .execute(&mut *tx)
                .await
                .expect("create failed");
            // dropped without commit
        }

        let exists: (bool,) = sqlx::query_as("SELECT to_regclass('uow_rollback_probe') IS NOT NULL")
            .fetch_one(&pool)
            .await
            .expect("query failed");
        assert!(!exists.0);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn concurrent_pool_access() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    let result: (i32,) = sqlx::query_as("SELECT $1::int")
                        .bind(i)
                        .fetch_one(&pool)
                        .await
                        .expect("concurrent query failed");
                    result.0
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.await.expect("task panicked");
            assert_eq!(result, i as i32);
        }
    }
}
