use std::result::Result as StdResult;

use thiserror::Error;

use crate::statement::StatementError;

/// Unified error type for the engine's domain, service, and storage layers.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Category not found: {0}")]
    CategoryNotFound(String),
    #[error("Card not found: {0}")]
    CardNotFound(String),
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),
    #[error("Charge not found: {0}")]
    ChargeNotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Statement error: {0}")]
    Statement(#[from] StatementError),
    #[error("Persistence error: {0}")]
    Storage(String),
}

pub type Result<T> = StdResult<T, EngineError>;

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Storage(err.to_string())
    }
}
