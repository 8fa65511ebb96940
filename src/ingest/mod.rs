//! CSV ingestion
//!
//! Normalizes uploaded patient CSV files and persists them as patients, an observation
//! log and a per-patient vitals summary.

pub mod coordinator;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod repository;
pub mod schema;

pub use coordinator::{ObservationClock, UpsertCoordinator};
pub use error::{AbortCause, IngestError};
pub use normalizer::{normalize_row, NormalizedRecord, RawRecord};
pub use pipeline::{ingest_csv, IngestSummary};
pub use repository::IngestRepository;
pub use schema::{Dataset, DatasetSchema, Encoding, NameColumns, SexCoding, VitalColumn};
