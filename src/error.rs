use serde::Serialize;
use thiserror::Error;

use crate::models::Action;

/* -------------------------
   Engine
--------------------------*/

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("action \"{action}\" is not defined for status \"{from}\"")]
    InvalidTransition { from: String, action: Action },
}

/* -------------------------
   Host adapters
--------------------------*/

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("appointment {0} not found")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("appointment {0} not found")]
    NotFound(String),
    #[error("{role} may not {action} appointment {id}")]
    NotPermitted {
        id: String,
        role: String,
        action: Action,
    },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::NotPermitted { .. } => "FORBIDDEN",
            ServiceError::Transition(_) => "INVALID_TRANSITION",
            ServiceError::Repository(RepositoryError::NotFound(_)) => "NOT_FOUND",
            ServiceError::Repository(_) => "INTERNAL",
        }
    }
}

/// `{"error": {"code": ..., "message": ...}}`, the shape hosts print.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorObject,
}

#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub code: String,
    pub message: String,
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        ErrorResponse {
            error: ErrorObject {
                code: err.code().to_string(),
                message: err.to_string(),
            },
        }
    }
}
