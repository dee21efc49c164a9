use std::io;

use crate::schema::ValidationError;

/// Misuse of the reader/writer or schema API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaUsageError {
    #[error("no stream is open")]
    NoStream,
    #[error("unknown primitive type tag {0}")]
    UnknownPrimitive(u8),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Open/read/write failure of the underlying file. Aborts the operation.
    #[error("stream error: {0}")]
    Stream(#[from] io::Error),
    /// The document does not fit the binary layout. Nothing is written.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    SchemaUsage(#[from] SchemaUsageError),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
