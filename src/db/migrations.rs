//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- CSV UPLOADS
        -- One row per ingestion attempt
        -- ============================================
        CREATE TABLE csv_uploads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,            -- initiator, owned by the auth layer
            filename TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'processing'
                CHECK(status IN ('processing', 'completed', 'failed')),
            rows_parsed INTEGER NOT NULL DEFAULT 0,
            rows_loaded INTEGER NOT NULL DEFAULT 0,
            error_msg TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_csv_uploads_status ON csv_uploads(status);

        -- ============================================
        -- PATIENTS
        -- Demographics are overwritten on every sighting
        -- ============================================
        CREATE TABLE patients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_uid TEXT NOT NULL UNIQUE,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            age INTEGER NOT NULL DEFAULT 0,
            sex TEXT NOT NULL DEFAULT 'O' CHECK(sex IN ('M', 'F', 'O')),
            contact_phone TEXT NOT NULL DEFAULT '',
            height_cm REAL,
            weight_kg REAL,
            bmi REAL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_patients_age ON patients(age);
        CREATE INDEX idx_patients_sex ON patients(sex);

        -- ============================================
        -- PATIENT OBSERVATIONS
        -- Append-only time series
        -- ============================================
        CREATE TABLE patient_observations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id INTEGER NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
            obs_type TEXT NOT NULL,
            value_num REAL,
            value_text TEXT,
            unit TEXT NOT NULL DEFAULT '',
            observed_at TEXT NOT NULL,
            source_upload_id INTEGER REFERENCES csv_uploads(id),

            CHECK (value_num IS NOT NULL OR value_text IS NOT NULL)
        );

        CREATE INDEX idx_observations_patient ON patient_observations(patient_id, obs_type);
        CREATE INDEX idx_observations_upload ON patient_observations(source_upload_id);

        -- ============================================
        -- PATIENT VITALS SUMMARY
        -- Latest known value per field, one row per patient
        -- ============================================
        CREATE TABLE patient_vitals_summary (
            patient_id INTEGER PRIMARY KEY REFERENCES patients(id) ON DELETE CASCADE,

            -- General vitals
            systolic_bp INTEGER,                 -- mmHg
            diastolic_bp INTEGER,                -- mmHg
            heart_rate INTEGER,                  -- bpm
            temperature REAL,                    -- degrees C
            oxygen_saturation INTEGER,           -- %
            glucose INTEGER,                     -- mg/dL
            bmi REAL,

            -- Shared
            cholesterol INTEGER,                 -- mg/dL

            -- Heart disease dataset
            chest_pain_type INTEGER,             -- 0-3
            resting_bp INTEGER,                  -- mmHg
            fasting_bs INTEGER,                  -- 1 if > 120 mg/dL
            resting_ecg INTEGER,                 -- 0-2
            max_heart_rate INTEGER,
            exercise_angina INTEGER,             -- 1 = yes
            st_depression REAL,
            st_slope INTEGER,                    -- 0-2
            num_vessels INTEGER,
            thalassemia INTEGER,                 -- 0-3
            target INTEGER,                      -- heart disease, 1 = yes

            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_vitals_target ON patient_vitals_summary(target);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}
