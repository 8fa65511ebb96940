//! Observation model
//!
//! Append-only time series of vital measurements. Each entry carries either a numeric
//! value or, when the source text was not a number, the raw text.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::models::VitalField;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObservationValue {
    Numeric(f64),
    Text(String),
}

impl ObservationValue {
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            ObservationValue::Numeric(v) => Some(*v),
            ObservationValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ObservationValue::Numeric(_) => None,
            ObservationValue::Text(s) => Some(s),
        }
    }
}

/// Data for appending an observation
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationCreate {
    pub patient_id: i64,
    pub field: VitalField,
    pub value: ObservationValue,
    pub unit: String,
    pub observed_at: String,
    pub source_upload_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub id: i64,
    pub patient_id: i64,
    pub obs_type: String,
    pub value_num: Option<f64>,
    pub value_text: Option<String>,
    pub unit: String,
    pub observed_at: String,
    pub source_upload_id: Option<i64>,
}

impl Observation {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            patient_id: row.get("patient_id")?,
            obs_type: row.get("obs_type")?,
            value_num: row.get("value_num")?,
            value_text: row.get("value_text")?,
            unit: row.get("unit")?,
            observed_at: row.get("observed_at")?,
            source_upload_id: row.get("source_upload_id")?,
        })
    }

    pub fn field(&self) -> Option<VitalField> {
        VitalField::from_str(&self.obs_type)
    }

    /// Append a batch of observations in one transaction
    pub fn insert_batch(conn: &mut Connection, batch: &[ObservationCreate]) -> DbResult<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO patient_observations
                    (patient_id, obs_type, value_num, value_text, unit, observed_at, source_upload_id)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for obs in batch {
                stmt.execute(params![
                    obs.patient_id,
                    obs.field.as_str(),
                    obs.value.as_numeric(),
                    obs.value.as_text(),
                    obs.unit,
                    obs.observed_at,
                    obs.source_upload_id,
                ])?;
            }
        }
        tx.commit()?;

        Ok(batch.len())
    }

    /// Observations for a patient in insertion order
    pub fn list_for_patient(
        conn: &Connection,
        patient_id: i64,
        field: Option<VitalField>,
    ) -> DbResult<Vec<Self>> {
        let observations = match field {
            Some(f) => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM patient_observations WHERE patient_id = ?1 AND obs_type = ?2 ORDER BY id",
                )?;
                let rows = stmt
                    .query_map(params![patient_id, f.as_str()], Self::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM patient_observations WHERE patient_id = ?1 ORDER BY id",
                )?;
                let rows = stmt
                    .query_map([patient_id], Self::from_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        Ok(observations)
    }

    pub fn count(conn: &Connection) -> DbResult<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM patient_observations", [], |row| row.get(0))?)
    }
}
