use hangar_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HangarError {
    #[error("Installation not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, HangarError>;
