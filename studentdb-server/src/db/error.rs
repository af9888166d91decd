//! Database error type
//!
//! sqlx errors are classified on the way in so callers can tell a lost
//! connection from a constraint the data broke.

use studentdb_core::ValidationErrors;

/// Postgres SQLSTATEs that mean "could not reach or log into the database".
const CONNECTION_SQLSTATES: &[&str] = &[
    "08000", // connection_exception
    "08001", // sqlclient_unable_to_establish_sqlconnection
    "08004", // sqlserver_rejected_establishment_of_sqlconnection
    "08006", // connection_failure
    "28000", // invalid_authorization_specification
    "28P01", // invalid_password
    "3D000", // invalid_catalog_name (database does not exist)
    "57P03", // cannot_connect_now
];

/// SQLSTATEs worth retrying while a freshly created database becomes visible.
const TRANSIENT_SQLSTATES: &[&str] = &["3D000", "57P03"];

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[source] sqlx::Error),

    /// Host unreachable, credentials rejected, or pool unavailable
    #[error("connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// Unique, check, or foreign key constraint rejected the write
    #[error("constraint violation on {}: {message}", constraint.as_deref().unwrap_or("unknown constraint"))]
    Constraint {
        constraint: Option<String>,
        message: String,
    },

    /// Stored value could not be mapped onto the typed record
    #[error("invalid {column} value in database: {reason}")]
    Decode { column: &'static str, reason: String },

    /// Value rejected before any statement was sent
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// True for failures the provisioning retry loop should wait out.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(sqlx::Error::Io(_)) | Self::Connection(sqlx::Error::PoolTimedOut) => {
                true
            }
            Self::Connection(sqlx::Error::Database(db)) => sqlstate_in(db.code(), TRANSIENT_SQLSTATES),
            _ => false,
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() || db.is_check_violation() || db.is_foreign_key_violation() {
                return Self::Constraint {
                    constraint: db.constraint().map(str::to_owned),
                    message: db.message().to_owned(),
                };
            }
            if sqlstate_in(db.code(), CONNECTION_SQLSTATES) {
                return Self::Connection(e);
            }
        }

        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => Self::Connection(e),
            other => Self::Sqlx(other),
        }
    }
}

fn sqlstate_in(code: Option<std::borrow::Cow<'_, str>>, set: &[&str]) -> bool {
    code.is_some_and(|code| set.iter().any(|s| *s == code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use studentdb_core::ValidationError;

    #[test]
    fn io_errors_are_connection_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = DbError::from(sqlx::Error::Io(io));
        assert!(err.is_connection());
        assert!(err.is_transient());
    }

    #[test]
    fn pool_closed_is_not_transient() {
        let err = DbError::from(sqlx::Error::PoolClosed);
        assert!(err.is_connection());
        assert!(!err.is_transient());
    }

    #[test]
    fn row_not_found_stays_generic() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::Sqlx(sqlx::Error::RowNotFound)));
    }

    #[test]
    fn constraint_display_names_constraint() {
        let err = DbError::Constraint {
            constraint: Some("students_email_key".into()),
            message: "duplicate key value violates unique constraint".into(),
        };
        assert_eq!(
            err.to_string(),
            "constraint violation on students_email_key: duplicate key value violates unique constraint"
        );
    }

    #[test]
    fn validation_converts() {
        let err: DbError = ValidationErrors::from(ValidationError::Missing { field: "gpa" }).into();
        assert!(matches!(err, DbError::Validation(_)));
    }
}
