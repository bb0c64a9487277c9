//! Repository error taxonomy.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Error raised by repository, session and store operations.
#[derive(Debug)]
pub enum RepoError {
    /// Caller broke an API contract (e.g. re-assigning an entity identifier).
    PreconditionViolation(String),
    /// Store execution failed; carries the underlying message only.
    QueryFailure(String),
    /// An expected entity is absent.
    NotFound { entity: String, id: String },
    /// Caller-supplied input cannot be used (bad page number, NaN radius, ...).
    InvalidArgument(String),
    /// Entity could not be converted to or from a stored document body.
    Serialization(String),
    /// Connection bootstrap or transaction failure.
    Db(DbError),
}

impl RepoError {
    /// Builds the `"<entity> with id: <id> is not registered"` error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreconditionViolation(message) => write!(f, "precondition violated: {message}"),
            Self::QueryFailure(message) => write!(f, "{message}"),
            Self::NotFound { entity, id } => {
                write!(f, "{entity} with id: {id} is not registered")
            }
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::Serialization(message) => write!(f, "invalid document body: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}
