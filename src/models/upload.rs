//! Upload model
//!
//! One row per ingestion attempt. Created as `processing` and moved exactly once to
//! `completed` or `failed`.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Processing,
    Completed,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Processing => "processing",
            UploadStatus::Completed => "completed",
            UploadStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(UploadStatus::Processing),
            "completed" => Some(UploadStatus::Completed),
            "failed" => Some(UploadStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, UploadStatus::Processing)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
    pub id: i64,
    pub user_id: i64,
    pub filename: String,
    pub status: UploadStatus,
    pub rows_parsed: i64,
    pub rows_loaded: i64,
    pub error_msg: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Upload {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let status: String = row.get("status")?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            filename: row.get("filename")?,
            status: UploadStatus::from_str(&status).unwrap_or(UploadStatus::Failed),
            rows_parsed: row.get("rows_parsed")?,
            rows_loaded: row.get("rows_loaded")?,
            error_msg: row.get("error_msg")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Record a new upload in `processing` state and return its id
    pub fn start(conn: &Connection, user_id: i64, filename: &str) -> DbResult<i64> {
        conn.execute(
            "INSERT INTO csv_uploads (user_id, filename, status) VALUES (?1, ?2, 'processing')",
            params![user_id, filename],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn complete(
        conn: &Connection,
        id: i64,
        rows_parsed: u64,
        rows_loaded: u64,
    ) -> DbResult<()> {
        Self::finish(conn, id, UploadStatus::Completed, rows_parsed, rows_loaded, None)
    }

    pub fn fail(
        conn: &Connection,
        id: i64,
        rows_parsed: u64,
        rows_loaded: u64,
        error_msg: &str,
    ) -> DbResult<()> {
        Self::finish(
            conn,
            id,
            UploadStatus::Failed,
            rows_parsed,
            rows_loaded,
            Some(error_msg),
        )
    }

    /// Terminal transition; only applies to uploads still `processing`
    fn finish(
        conn: &Connection,
        id: i64,
        status: UploadStatus,
        rows_parsed: u64,
        rows_loaded: u64,
        error_msg: Option<&str>,
    ) -> DbResult<()> {
        let rows = conn.execute(
            r#"
            UPDATE csv_uploads SET
                status = ?1,
                rows_parsed = ?2,
                rows_loaded = ?3,
                error_msg = ?4,
                updated_at = datetime('now')
            WHERE id = ?5 AND status = 'processing'
            "#,
            params![
                status.as_str(),
                rows_parsed as i64,
                rows_loaded as i64,
                error_msg,
                id
            ],
        )?;

        if rows == 0 {
            return Err(DbError::NotFound { entity: "processing upload", id });
        }
        Ok(())
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM csv_uploads WHERE id = ?1")?;
        Ok(stmt.query_row([id], Self::from_row).optional()?)
    }
}
