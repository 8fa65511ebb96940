//! Data models
//!
//! Rust structs representing database entities.

mod observation;
mod patient;
mod upload;
mod vital_field;
mod vitals_summary;

pub use observation::{Observation, ObservationCreate, ObservationValue};
pub use patient::{Demographics, Patient, Sex};
pub use upload::{Upload, UploadStatus};
pub use vital_field::{round2, SummaryKind, VitalField};
pub use vitals_summary::VitalsSummary;
