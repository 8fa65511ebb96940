//! Vitals summary model
//!
//! Denormalized latest-known value per vital field, one row per patient. Writes touch
//! only the columns supplied; everything else keeps its previous value.

use std::collections::BTreeMap;

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbResult;
use crate::models::{SummaryKind, VitalField};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalsSummary {
    pub patient_id: i64,
    pub values: BTreeMap<VitalField, f64>,
    pub updated_at: String,
}

impl VitalsSummary {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let mut values = BTreeMap::new();
        for field in VitalField::ALL {
            let value: Option<f64> = row.get(field.summary_column())?;
            if let Some(v) = value {
                values.insert(field, v);
            }
        }

        Ok(Self {
            patient_id: row.get("patient_id")?,
            values,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn value(&self, field: VitalField) -> Option<f64> {
        self.values.get(&field).copied()
    }

    /// Insert the patient's summary row or update the supplied columns of the existing
    /// one. Later entries for the same field win.
    pub fn upsert(conn: &Connection, patient_id: i64, values: &[(VitalField, f64)]) -> DbResult<()> {
        let merged: BTreeMap<VitalField, f64> = values.iter().copied().collect();

        let mut columns = vec!["patient_id".to_string()];
        let mut placeholders = vec!["?1".to_string()];
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(patient_id)];

        for (field, value) in &merged {
            let column = field.summary_column();
            columns.push(column.to_string());
            placeholders.push(format!("?{}", params_vec.len() + 1));
            updates.push(format!("{column} = excluded.{column}"));

            let stored = field.summary_value(*value);
            match field.summary_kind() {
                SummaryKind::Integer => params_vec.push(Box::new(stored as i64)),
                SummaryKind::Decimal => params_vec.push(Box::new(stored)),
            }
        }

        let conflict = if updates.is_empty() {
            "DO NOTHING".to_string()
        } else {
            updates.push("updated_at = datetime('now')".to_string());
            format!("DO UPDATE SET {}", updates.join(", "))
        };

        let sql = format!(
            "INSERT INTO patient_vitals_summary ({}) VALUES ({}) ON CONFLICT(patient_id) {}",
            columns.join(", "),
            placeholders.join(", "),
            conflict
        );

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Ok(())
    }

    pub fn get(conn: &Connection, patient_id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM patient_vitals_summary WHERE patient_id = ?1")?;
        Ok(stmt.query_row([patient_id], Self::from_row).optional()?)
    }
}
