use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Conflict {0}")]
    Conflict(String),

    #[error("No purchasable options for product {0}")]
    NoSpecifications(String),

    #[error("Service error {0}")]
    Service(String),

    #[error("Storage error")]
    Io(#[from] std::io::Error),

    #[error("Serialization error")]
    Serde(#[from] serde_json::Error),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;
