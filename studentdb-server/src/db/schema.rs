//! Schema provisioning
//!
//! Creates the application database, the least-privilege application role,
//! the `students` table with its indexes and `updated_at` trigger, and the
//! grants the role needs. Every step checks before it creates, so running
//! provisioning again is a no-op.

use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgExecutor, PgPool};
use studentdb_core::{ConnectionProfile, DatabaseConfig};
use tracing::{debug, info};

use super::error::{DbError, DbResult};
use super::pool::{
    connect_options, connect_with_retry, unit_of_work, ConnectionProvider, PROVISIONING_ATTEMPTS,
    PROVISIONING_BACKOFF,
};

/// Provisioning never needs more than one connection.
const PROVISIONING_MAX_CONNECTIONS: u32 = 1;

/// One column of the provisioned `students` table
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub max_length: Option<i32>,
    pub default_value: Option<String>,
}

/// Runs the provisioning steps against the configured server
pub struct SchemaManager {
    config: DatabaseConfig,
}

impl SchemaManager {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    /// Run every provisioning step in order.
    pub async fn provision(&self) -> DbResult<()> {
        info!(database = %self.config.app_db_name, "Provisioning student database...");

        self.create_database().await?;
        self.create_app_role().await?;
        self.create_student_table().await?;
        self.grant_privileges().await?;

        info!("Provisioning complete");
        Ok(())
    }

    /// Create the application database if absent. Returns `true` when created.
    pub async fn create_database(&self) -> DbResult<bool> {
        let pool = self.admin_pool().await?;

        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
                .bind(&self.config.app_db_name)
                .fetch_one(&pool)
                .await?;

        if exists {
            debug!(database = %self.config.app_db_name, "database already exists");
            pool.close().await;
            return Ok(false);
        }

        // Not allowed inside a transaction block; sent as a simple query
        let sql = format!("CREATE DATABASE {}", quote_ident(&self.config.app_db_name));
        sqlx::raw_sql(&sql).execute(&pool).await?;
        pool.close().await;

        info!(database = %self.config.app_db_name, "Created database");
        Ok(true)
    }

    /// Create the application login role if absent. Returns `true` when created.
    ///
    /// Skipped when the admin and application users are the same role.
    pub async fn create_app_role(&self) -> DbResult<bool> {
        if self.config.app_role_is_admin() {
            debug!(role = %self.config.app_user, "application role is the admin role, skipping");
            return Ok(false);
        }

        let pool = self.admin_pool().await?;
        let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_roles WHERE rolname = $1)")
            .bind(&self.config.app_user)
            .fetch_one(&pool)
            .await?;

        if exists {
            debug!(role = %self.config.app_user, "role already exists");
            pool.close().await;
            return Ok(false);
        }

        let sql = format!(
            "CREATE ROLE {} LOGIN PASSWORD {}",
            quote_ident(&self.config.app_user),
            quote_literal(&self.config.app_password)
        );
        sqlx::raw_sql(&sql).execute(&pool).await?;
        pool.close().await;

        info!(role = %self.config.app_user, "Created application role");
        Ok(true)
    }

    /// Create the `students` table, indexes and trigger in the application
    /// database. Retries while a just-created database becomes visible.
    pub async fn create_student_table(&self) -> DbResult<()> {
        let pool = self.admin_app_db_pool().await?;
        let result = create_student_table_on(&pool).await;
        pool.close().await;
        result
    }

    /// Grant the application role schema usage and DML on `students`.
    pub async fn grant_privileges(&self) -> DbResult<()> {
        if self.config.app_role_is_admin() {
            debug!("application role is the admin role, no grants needed");
            return Ok(());
        }

        let pool = self.admin_app_db_pool().await?;
        let role = quote_ident(&self.config.app_user);
        let grants = [
            format!("GRANT USAGE ON SCHEMA public TO {role}"),
            format!("GRANT SELECT, INSERT, UPDATE, DELETE ON students TO {role}"),
            format!("GRANT USAGE, SELECT ON SEQUENCE students_id_seq TO {role}"),
        ];

        let mut tx = unit_of_work(&pool).await?;
        for grant in &grants {
            sqlx::raw_sql(grant).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        pool.close().await;

        info!(role = %self.config.app_user, "Granted privileges on students");
        Ok(())
    }

    /// Columns of the `students` table as the application role sees them.
    pub async fn table_columns(&self) -> DbResult<Vec<ColumnInfo>> {
        let provider = ConnectionProvider::new(&self.config, ConnectionProfile::App)
            .with_max_connections(PROVISIONING_MAX_CONNECTIONS);

        let columns = async {
            let mut tx = provider.unit_of_work().await?;
            let columns = fetch_columns(&mut *tx).await?;
            tx.commit().await?;
            Ok::<_, DbError>(columns)
        }
        .await;
        provider.close().await;
        columns
    }

    async fn admin_pool(&self) -> DbResult<PgPool> {
        let options = connect_options(&self.config, self.config.credentials(ConnectionProfile::Admin));
        let pool = PgPoolOptions::new()
            .max_connections(PROVISIONING_MAX_CONNECTIONS)
            .connect_with(options)
            .await?;
        Ok(pool)
    }

    async fn admin_app_db_pool(&self) -> DbResult<PgPool> {
        connect_with_retry(
            connect_options(&self.config, self.config.admin_on_app_db()),
            PROVISIONING_MAX_CONNECTIONS,
            PROVISIONING_ATTEMPTS,
            PROVISIONING_BACKOFF,
        )
        .await
    }
}

/// Create the `students` table and its companions on an existing pool.
///
/// Objects land in the first schema of the connection's `search_path`, which
/// lets tests provision into an isolated schema.
pub async fn create_student_table_on(pool: &PgPool) -> DbResult<()> {
    let mut tx = unit_of_work(pool).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            id SERIAL PRIMARY KEY,
            student_id VARCHAR(100) NOT NULL UNIQUE,
            name VARCHAR(100) NOT NULL,
            gender VARCHAR(10) CHECK (gender IN ('male', 'female', 'other')),
            date_of_birth DATE NOT NULL,
            enrollment_date DATE NOT NULL DEFAULT CURRENT_DATE,
            major VARCHAR(100) NOT NULL,
            class_name VARCHAR(50) NOT NULL,
            email VARCHAR(100) UNIQUE,
            phone VARCHAR(20),
            address TEXT,
            gpa NUMERIC(3,2) CHECK (gpa >= 0.00 AND gpa <= 4.00),
            status VARCHAR(20) NOT NULL DEFAULT 'active'
                CHECK (status IN ('active', 'graduated', 'suspended', 'withdrawn')),
            scholarship_amount NUMERIC(10,2) NOT NULL DEFAULT 0.00
                CHECK (scholarship_amount >= 0),
            emergency_contact_name VARCHAR(50),
            emergency_contact_phone VARCHAR(20),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    for index in [
        "CREATE INDEX IF NOT EXISTS idx_students_major ON students(major)",
        "CREATE INDEX IF NOT EXISTS idx_students_class ON students(class_name)",
        "CREATE INDEX IF NOT EXISTS idx_students_gpa ON students(gpa DESC)",
        "CREATE INDEX IF NOT EXISTS idx_students_status ON students(status)",
    ] {
        sqlx::query(index).execute(&mut *tx).await?;
    }

    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION update_updated_at_column()
        RETURNS TRIGGER AS $$
        BEGIN
            NEW.updated_at = NOW();
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(&mut *tx)
    .await?;

    let (has_trigger,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM pg_trigger
            WHERE tgname = 'trigger_update_updated_at'
              AND tgrelid = 'students'::regclass
        )
        "#,
    )
    .fetch_one(&mut *tx)
    .await?;

    if !has_trigger {
        sqlx::query(
            r#"
            CREATE TRIGGER trigger_update_updated_at
                BEFORE UPDATE ON students
                FOR EACH ROW
                EXECUTE FUNCTION update_updated_at_column()
            "#,
        )
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!("students table ready");
    Ok(())
}

/// Read the `students` columns visible through `pool`.
pub async fn table_columns_on(pool: &PgPool) -> DbResult<Vec<ColumnInfo>> {
    fetch_columns(pool).await
}

async fn fetch_columns<'e, E>(executor: E) -> DbResult<Vec<ColumnInfo>>
where
    E: PgExecutor<'e>,
{
    let columns = sqlx::query_as::<_, ColumnInfo>(
        r#"
        SELECT
            column_name::text AS name,
            data_type::text AS data_type,
            (is_nullable = 'YES') AS is_nullable,
            character_maximum_length::int4 AS max_length,
            column_default::text AS default_value
        FROM information_schema.columns
        WHERE table_name = 'students'
          AND table_schema = current_schema()
        ORDER BY ordinal_position
        "#,
    )
    .fetch_all(executor)
    .await?;
    Ok(columns)
}

/// Quote an SQL identifier (database or role name).
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote an SQL string literal for statements that take no bind parameters.
fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("student_management"), "\"student_management\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn quotes_literals() {
        assert_eq!(quote_literal("student_secure_pass"), "'student_secure_pass'");
        assert_eq!(quote_literal("it's"), "'it''s'");
    }
}
