use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("invalid reference pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
