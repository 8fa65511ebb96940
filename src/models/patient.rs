//! Patient model
//!
//! One row per distinct subject, keyed by the external `patient_uid`. Demographics are
//! overwritten on every sighting; only vitals keep history.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Patient sex as stored (`M`, `F`, `O`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    #[default]
    Other,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Other => "O",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "M" => Sex::Male,
            "F" => Sex::Female,
            _ => Sex::Other,
        }
    }
}

/// Demographic fields written on insert and on every update
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Demographics {
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub sex: Sex,
    pub phone: String,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub patient_uid: String,
    pub first_name: String,
    pub last_name: String,
    pub age: i64,
    pub sex: Sex,
    pub contact_phone: String,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

impl Patient {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let sex: String = row.get("sex")?;
        Ok(Self {
            id: row.get("id")?,
            patient_uid: row.get("patient_uid")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            age: row.get("age")?,
            sex: Sex::from_str(&sex),
            contact_phone: row.get("contact_phone")?,
            height_cm: row.get("height_cm")?,
            weight_kg: row.get("weight_kg")?,
            bmi: row.get("bmi")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// "First Last", trimmed
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Internal id for a `patient_uid`, if the patient exists
    pub fn find_id_by_uid(conn: &Connection, patient_uid: &str) -> DbResult<Option<i64>> {
        let id = conn
            .query_row(
                "SELECT id FROM patients WHERE patient_uid = ?1",
                [patient_uid],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Insert a patient and return its id.
    ///
    /// A row created concurrently under the same `patient_uid` is updated instead of
    /// violating the unique key.
    pub fn insert(conn: &Connection, patient_uid: &str, data: &Demographics) -> DbResult<i64> {
        let id = conn.query_row(
            r#"
            INSERT INTO patients (
                patient_uid, first_name, last_name, age, sex, contact_phone,
                height_cm, weight_kg, bmi
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(patient_uid) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                age = excluded.age,
                sex = excluded.sex,
                contact_phone = excluded.contact_phone,
                height_cm = excluded.height_cm,
                weight_kg = excluded.weight_kg,
                bmi = excluded.bmi,
                updated_at = datetime('now')
            RETURNING id
            "#,
            params![
                patient_uid,
                data.first_name,
                data.last_name,
                data.age,
                data.sex.as_str(),
                data.phone,
                data.height_cm,
                data.weight_kg,
                data.bmi,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Overwrite every demographic field of an existing patient
    pub fn update(conn: &Connection, id: i64, data: &Demographics) -> DbResult<()> {
        let rows = conn.execute(
            r#"
            UPDATE patients SET
                first_name = ?1,
                last_name = ?2,
                age = ?3,
                sex = ?4,
                contact_phone = ?5,
                height_cm = ?6,
                weight_kg = ?7,
                bmi = ?8,
                updated_at = datetime('now')
            WHERE id = ?9
            "#,
            params![
                data.first_name,
                data.last_name,
                data.age,
                data.sex.as_str(),
                data.phone,
                data.height_cm,
                data.weight_kg,
                data.bmi,
                id,
            ],
        )?;

        if rows == 0 {
            return Err(DbError::NotFound { entity: "patient", id });
        }
        Ok(())
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM patients WHERE id = ?1")?;
        Ok(stmt.query_row([id], Self::from_row).optional()?)
    }

    pub fn get_by_uid(conn: &Connection, patient_uid: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM patients WHERE patient_uid = ?1")?;
        Ok(stmt.query_row([patient_uid], Self::from_row).optional()?)
    }

    /// List patients, newest first
    pub fn list(conn: &Connection, limit: i64, offset: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM patients ORDER BY id DESC LIMIT ?1 OFFSET ?2")?;
        let patients = stmt
            .query_map([limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(patients)
    }

    pub fn count(conn: &Connection) -> DbResult<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_database;

    fn demographics(first: &str, age: i64) -> Demographics {
        Demographics {
            first_name: first.to_string(),
            last_name: "Doe".to_string(),
            age,
            sex: Sex::Female,
            phone: "555-0100".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_insert_and_find() {
        let (_dir, db) = test_database();
        db.with_conn(|conn| {
            let id = Patient::insert(conn, "P-1", &demographics("Jane", 41))?;
            assert_eq!(Patient::find_id_by_uid(conn, "P-1")?, Some(id));
            assert_eq!(Patient::find_id_by_uid(conn, "P-2")?, None);

            let patient = Patient::get_by_id(conn, id)?.unwrap();
            assert_eq!(patient.display_name(), "Jane Doe");
            assert_eq!(patient.sex, Sex::Female);
            assert_eq!(patient.age, 41);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_insert_existing_uid_updates_in_place() {
        let (_dir, db) = test_database();
        db.with_conn(|conn| {
            let first = Patient::insert(conn, "P-1", &demographics("Jane", 41))?;
            let second = Patient::insert(conn, "P-1", &demographics("Janet", 42))?;
            assert_eq!(first, second);
            assert_eq!(Patient::count(conn)?, 1);

            let patient = Patient::get_by_uid(conn, "P-1")?.unwrap();
            assert_eq!(patient.first_name, "Janet");
            assert_eq!(patient.age, 42);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_update_overwrites_blank_fields() {
        let (_dir, db) = test_database();
        db.with_conn(|conn| {
            let id = Patient::insert(conn, "P-1", &demographics("Jane", 41))?;
            Patient::update(conn, id, &Demographics::default())?;

            let patient = Patient::get_by_id(conn, id)?.unwrap();
            assert_eq!(patient.display_name(), "");
            assert_eq!(patient.sex, Sex::Other);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_update_missing_patient() {
        let (_dir, db) = test_database();
        let result = db.with_conn(|conn| Patient::update(conn, 99, &Demographics::default()));
        assert!(matches!(result, Err(DbError::NotFound { entity: "patient", id: 99 })));
    }

    #[test]
    fn test_list_newest_first() {
        let (_dir, db) = test_database();
        db.with_conn(|conn| {
            for uid in ["A", "B", "C"] {
                Patient::insert(conn, uid, &demographics(uid, 30))?;
            }
            let page = Patient::list(conn, 2, 0)?;
            let uids: Vec<_> = page.iter().map(|p| p.patient_uid.as_str()).collect();
            assert_eq!(uids, vec!["C", "B"]);

            let rest = Patient::list(conn, 2, 2)?;
            assert_eq!(rest.len(), 1);
            assert_eq!(rest[0].patient_uid, "A");
            Ok(())
        })
        .unwrap();
    }
}
