//! Persistence seam for the ingest pipeline.
//!
//! The pipeline only talks to storage through [`IngestRepository`]. Every call is one
//! statement (or one batch) and commits on its own; there is no transaction spanning
//! rows.

use crate::db::{Database, DbResult};
use crate::models::{Demographics, Observation, ObservationCreate, Patient, Upload, VitalField, VitalsSummary};

pub trait IngestRepository {
    /// Record a new upload in `processing` state
    fn start_upload(&self, user_id: i64, filename: &str) -> DbResult<i64>;

    fn complete_upload(&self, upload_id: i64, rows_parsed: u64, rows_loaded: u64) -> DbResult<()>;

    /// Mark the upload failed, keeping the progress reached
    fn fail_upload(
        &self,
        upload_id: i64,
        rows_parsed: u64,
        rows_loaded: u64,
        error: &str,
    ) -> DbResult<()>;

    fn find_patient_id(&self, patient_uid: &str) -> DbResult<Option<i64>>;

    fn insert_patient(&self, patient_uid: &str, demographics: &Demographics) -> DbResult<i64>;

    fn update_patient(&self, patient_id: i64, demographics: &Demographics) -> DbResult<()>;

    fn insert_observations(&self, batch: &[ObservationCreate]) -> DbResult<()>;

    /// Overwrite the supplied summary fields, leaving the others untouched
    fn upsert_vitals_summary(&self, patient_id: i64, values: &[(VitalField, f64)]) -> DbResult<()>;
}

impl IngestRepository for Database {
    fn start_upload(&self, user_id: i64, filename: &str) -> DbResult<i64> {
        self.with_conn(|conn| Upload::start(conn, user_id, filename))
    }

    fn complete_upload(&self, upload_id: i64, rows_parsed: u64, rows_loaded: u64) -> DbResult<()> {
        self.with_conn(|conn| Upload::complete(conn, upload_id, rows_parsed, rows_loaded))
    }

    fn fail_upload(
        &self,
        upload_id: i64,
        rows_parsed: u64,
        rows_loaded: u64,
        error: &str,
    ) -> DbResult<()> {
        self.with_conn(|conn| Upload::fail(conn, upload_id, rows_parsed, rows_loaded, error))
    }

    fn find_patient_id(&self, patient_uid: &str) -> DbResult<Option<i64>> {
        self.with_conn(|conn| Patient::find_id_by_uid(conn, patient_uid))
    }

    fn insert_patient(&self, patient_uid: &str, demographics: &Demographics) -> DbResult<i64> {
        self.with_conn(|conn| Patient::insert(conn, patient_uid, demographics))
    }

    fn update_patient(&self, patient_id: i64, demographics: &Demographics) -> DbResult<()> {
        self.with_conn(|conn| Patient::update(conn, patient_id, demographics))
    }

    fn insert_observations(&self, batch: &[ObservationCreate]) -> DbResult<()> {
        self.with_conn_mut(|conn| Observation::insert_batch(conn, batch))?;
        Ok(())
    }

    fn upsert_vitals_summary(&self, patient_id: i64, values: &[(VitalField, f64)]) -> DbResult<()> {
        self.with_conn(|conn| VitalsSummary::upsert(conn, patient_id, values))
    }
}
