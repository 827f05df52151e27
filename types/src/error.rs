//! Parse errors for the shared enums.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("unknown complexity: {0}")]
    UnknownComplexity(String),

    #[error("unknown trade role: {0}")]
    UnknownRole(String),

    #[error("unknown verification method: {0}")]
    UnknownMethod(String),
}
