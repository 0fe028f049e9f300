use crate::page::PageError;
use crate::storage::base::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Page error: {0}")]
    PageError(#[from] PageError),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Browser error: {0}")]
    BrowserError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Task error: {0}")]
    TaskError(String),
}

pub type ScraperResult<T> = Result<T, ScraperError>;
