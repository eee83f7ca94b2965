use thiserror::Error;

/// Errors a repository can return.
///
/// Constraint violations keep the constraint and table names so callers can tell a duplicate
/// slug from a replayed payment session without parsing messages.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Entity not found")]
    NotFound,

    #[error("Unique constraint violation on {}", constraint.as_deref().unwrap_or("unknown constraint"))]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    #[error("Foreign key constraint violation on {}", constraint.as_deref().unwrap_or("unknown constraint"))]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Raised by the CHECK constraints on recipe numbers
    #[error("Check constraint violation on {}", constraint.as_deref().unwrap_or("unknown constraint"))]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DbError {
    /// Name of the violated constraint, if this is a constraint violation.
    pub fn constraint(&self) -> Option<&str> {
        match self {
            DbError::UniqueViolation { constraint, .. }
            | DbError::ForeignKeyViolation { constraint, .. }
            | DbError::CheckViolation { constraint, .. } => constraint.as_deref(),
            DbError::NotFound | DbError::Other(_) => None,
        }
    }

    /// True for a unique violation of exactly `constraint`.
    pub fn is_unique_violation_of(&self, constraint: &str) -> bool {
        matches!(self, DbError::UniqueViolation { .. }) && self.constraint() == Some(constraint)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let sqlx::Error::Database(db_err) = &err else {
            return match err {
                sqlx::Error::RowNotFound => DbError::NotFound,
                other => DbError::Other(other.into()),
            };
        };

        let constraint = db_err.constraint().map(str::to_string);
        let table = db_err.table().map(str::to_string);
        let message = db_err.message().to_string();

        if db_err.is_unique_violation() {
            DbError::UniqueViolation { constraint, table, message }
        } else if db_err.is_foreign_key_violation() {
            DbError::ForeignKeyViolation { constraint, table, message }
        } else if db_err.is_check_violation() {
            DbError::CheckViolation { constraint, table, message }
        } else {
            DbError::Other(err.into())
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
