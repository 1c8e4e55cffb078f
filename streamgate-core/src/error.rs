use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Storage failure that is not a plain driver error, including local state
    /// left stale after the ingest server already acted on a command.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No active session: {0}")]
    NoActiveSession(String),

    #[error("Control server unreachable: {0}")]
    ControlUnreachable(String),

    #[error("Control server rejected request with status {status}: {body}")]
    ControlRejected { status: u16, body: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the failure originated in the storage layer
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Persistence(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().unwrap_or_default();
                match code.as_ref() {
                    // PostgreSQL unique_violation
                    "23505" => {
                        let constraint = db_err.constraint().unwrap_or_default();
                        if constraint.starts_with("live_sessions") {
                            Self::Conflict("Stream is already live".to_string())
                        } else if constraint.starts_with("marathons") {
                            Self::Conflict("Marathon already exists".to_string())
                        } else if constraint.starts_with("streams") {
                            Self::Conflict("Stream already exists".to_string())
                        } else {
                            Self::Conflict("Resource already exists".to_string())
                        }
                    }
                    // PostgreSQL foreign_key_violation
                    "23503" => Self::NotFound("Referenced resource not found".to_string()),
                    // PostgreSQL check_violation
                    "23514" => Self::InvalidInput("Constraint check failed".to_string()),
                    // PostgreSQL not_null_violation
                    "23502" => Self::InvalidInput("Required field is missing".to_string()),
                    _ => Self::Database(err),
                }
            }
            _ => Self::Database(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
