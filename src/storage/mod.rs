pub mod base;
pub mod memory;
pub mod xlsx;

pub use base::{RecordSink, StorageError};
pub use memory::MemorySink;
pub use xlsx::XlsxSink;
