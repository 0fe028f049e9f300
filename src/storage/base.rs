use crate::model::{ListingRecord, RowTag};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Spreadsheet error: {0}")]
    XlsxError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<rust_xlsxwriter::XlsxError> for StorageError {
    fn from(error: rust_xlsxwriter::XlsxError) -> Self {
        StorageError::XlsxError(error.to_string())
    }
}

/// Ordered, append-only table of output rows.
///
/// After `flush` returns, every row appended so far is on disk.
pub trait RecordSink: Send {
    fn append(&mut self, record: &ListingRecord, tag: RowTag) -> Result<(), StorageError>;
    fn flush(&mut self) -> Result<(), StorageError>;
    /// Data rows appended so far, header excluded.
    fn row_count(&self) -> usize;
    fn location(&self) -> Option<&Path> {
        None
    }
}
