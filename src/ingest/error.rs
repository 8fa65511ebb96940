//! Ingest error types.

use thiserror::Error;

use crate::db::DbError;

/// Why an upload stopped before its last row
#[derive(Debug, Error)]
pub enum AbortCause {
    #[error("CSV decode error: {0}")]
    Decode(#[from] csv::Error),

    #[error("CSV file has no header row")]
    MissingHeader,

    #[error("Persistence error: {0}")]
    Persistence(#[from] DbError),
}

#[derive(Debug, Error)]
pub enum IngestError {
    /// The upload record itself could not be created
    #[error("Could not start upload: {0}")]
    Start(#[source] DbError),

    #[error("Upload {upload_id} failed after {rows_parsed} rows ({rows_loaded} loaded): {cause}")]
    Aborted {
        upload_id: i64,
        rows_parsed: u64,
        rows_loaded: u64,
        #[source]
        cause: AbortCause,
    },
}

impl IngestError {
    pub fn upload_id(&self) -> Option<i64> {
        match self {
            IngestError::Start(_) => None,
            IngestError::Aborted { upload_id, .. } => Some(*upload_id),
        }
    }
}
