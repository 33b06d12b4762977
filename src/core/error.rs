use rusqlite;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("SQLite error: {0}")]
    RusqliteError(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Malformed descriptor content: {0}")]
    FormatError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    Conflict(String),
    #[error("No history: {0}")]
    StaleHistory(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Cancelled: {0}")]
    Cancelled(String),
}
