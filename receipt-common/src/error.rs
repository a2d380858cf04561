//! Common error types for the receipt services

use thiserror::Error;

/// Common result type for receipt operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the receipt services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Insert rejected because a document with the same natural key exists
    #[error("Duplicate document: {0}")]
    Duplicate(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
