//! Use-case services over the document repository.
//!
//! # Responsibility
//! - Orchestrate one session per use-case call and translate absent
//!   documents into `ServiceError::NotFound`.
//! - Keep transport layers (CLI, HTTP hosts) decoupled from storage details.
//!
//! # Invariants
//! - Every session opened by a service is released on every exit path.

pub mod company_service;
pub mod person_service;

use crate::repo::error::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for person/company use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Target or referenced document does not exist.
    NotFound { entity: String, id: String },
    /// Use-case input cannot be accepted.
    InvalidInput(String),
    /// Repository or storage failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, id } => write!(f, "{entity} with id: {id} is not registered"),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::InvalidArgument(message) => Self::InvalidInput(message),
            other => Self::Repo(other),
        }
    }
}
