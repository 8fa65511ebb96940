//! Upsert coordinator
//!
//! Persists normalized records for one upload: find-or-create the patient, append one
//! observation per extracted vital, then merge the numeric vitals into the patient's
//! summary row.

use std::collections::HashSet;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use tracing::debug;

use crate::db::DbResult;
use crate::ingest::normalizer::NormalizedRecord;
use crate::ingest::repository::IngestRepository;
use crate::models::ObservationCreate;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Wall-clock ingestion timestamps, strictly increasing within one upload
#[derive(Debug, Default)]
pub struct ObservationClock {
    last: Option<DateTime<Utc>>,
}

impl ObservationClock {
    pub fn tick(&mut self) -> String {
        let mut now = Utc::now().trunc_subsecs(6);
        if let Some(last) = self.last {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last = Some(now);
        now.format(TIMESTAMP_FORMAT).to_string()
    }
}

pub struct UpsertCoordinator<'r, R: IngestRepository + ?Sized> {
    repo: &'r R,
    upload_id: i64,
    clock: ObservationClock,
    patients: HashSet<i64>,
}

impl<'r, R: IngestRepository + ?Sized> UpsertCoordinator<'r, R> {
    pub fn new(repo: &'r R, upload_id: i64) -> Self {
        Self {
            repo,
            upload_id,
            clock: ObservationClock::default(),
            patients: HashSet::new(),
        }
    }

    /// Persist one record and return the patient's internal id
    pub fn persist(&mut self, record: &NormalizedRecord) -> DbResult<i64> {
        let patient_id = match self.repo.find_patient_id(&record.identity_key)? {
            Some(id) => {
                self.repo.update_patient(id, &record.demographics)?;
                id
            }
            None => self
                .repo
                .insert_patient(&record.identity_key, &record.demographics)?,
        };

        let observed_at = self.clock.tick();
        let batch: Vec<ObservationCreate> = record
            .vitals
            .iter()
            .map(|(field, value)| ObservationCreate {
                patient_id,
                field: *field,
                value: value.clone(),
                unit: field.unit().to_string(),
                observed_at: observed_at.clone(),
                source_upload_id: self.upload_id,
            })
            .collect();
        self.repo.insert_observations(&batch)?;

        self.repo
            .upsert_vitals_summary(patient_id, &record.numeric_vitals())?;

        debug!(
            row = record.row_number,
            patient_uid = %record.identity_key,
            patient_id,
            observations = batch.len(),
            "row persisted"
        );

        self.patients.insert(patient_id);
        Ok(patient_id)
    }

    /// Distinct patients touched so far
    pub fn patients_processed(&self) -> usize {
        self.patients.len()
    }
}
