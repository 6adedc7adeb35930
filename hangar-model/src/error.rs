use std::fmt::{self, Display};

/// Errors produced by model constructors and parsing routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    EmptyId,
    InvalidStatus(String),
    InvalidAction(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::EmptyId => write!(f, "installation id must not be empty"),
            ModelError::InvalidStatus(raw) => {
                write!(f, "invalid installation status: {raw}")
            }
            ModelError::InvalidAction(raw) => {
                write!(f, "invalid status action: {raw}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
