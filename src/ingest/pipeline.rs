//! CSV ingest pipeline
//!
//! Runs one upload end to end on the calling thread: open the upload record, decode the
//! file, normalize and persist rows in file order, then mark the upload `completed` or
//! `failed`. Rows committed before a failure stay committed.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::IngestConfig;
use crate::ingest::coordinator::UpsertCoordinator;
use crate::ingest::error::{AbortCause, IngestError};
use crate::ingest::normalizer::{normalize_row, RawRecord};
use crate::ingest::repository::IngestRepository;

/// Result handed back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub upload_id: i64,
    pub rows_parsed: u64,
    pub rows_loaded: u64,
    pub patients_processed: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Progress {
    rows_parsed: u64,
    rows_loaded: u64,
}

pub fn ingest_csv<R: IngestRepository + ?Sized>(
    repo: &R,
    user_id: i64,
    filename: &str,
    bytes: &[u8],
    config: &IngestConfig,
) -> Result<IngestSummary, IngestError> {
    let upload_id = repo
        .start_upload(user_id, filename)
        .map_err(IngestError::Start)?;
    info!(
        upload_id,
        user_id,
        filename,
        dataset = config.dataset.as_str(),
        bytes = bytes.len(),
        "upload started"
    );

    let mut coordinator = UpsertCoordinator::new(repo, upload_id);
    let mut progress = Progress::default();

    let outcome = load_rows(&mut coordinator, &mut progress, upload_id, bytes, config)
        .and_then(|()| {
            repo.complete_upload(upload_id, progress.rows_parsed, progress.rows_loaded)
                .map_err(AbortCause::from)
        });

    match outcome {
        Ok(()) => {
            let summary = IngestSummary {
                upload_id,
                rows_parsed: progress.rows_parsed,
                rows_loaded: progress.rows_loaded,
                patients_processed: coordinator.patients_processed() as u64,
            };
            info!(
                upload_id,
                rows_parsed = summary.rows_parsed,
                rows_loaded = summary.rows_loaded,
                patients = summary.patients_processed,
                "upload completed"
            );
            Ok(summary)
        }
        Err(cause) => {
            let message = cause.to_string();
            warn!(
                upload_id,
                rows_parsed = progress.rows_parsed,
                rows_loaded = progress.rows_loaded,
                error = %message,
                "upload failed"
            );
            if let Err(e) =
                repo.fail_upload(upload_id, progress.rows_parsed, progress.rows_loaded, &message)
            {
                error!(upload_id, error = %e, "could not mark upload failed");
            }
            Err(IngestError::Aborted {
                upload_id,
                rows_parsed: progress.rows_parsed,
                rows_loaded: progress.rows_loaded,
                cause,
            })
        }
    }
}

fn load_rows<R: IngestRepository + ?Sized>(
    coordinator: &mut UpsertCoordinator<'_, R>,
    progress: &mut Progress,
    upload_id: i64,
    bytes: &[u8],
    config: &IngestConfig,
) -> Result<(), AbortCause> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&*text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(AbortCause::MissingHeader);
    }

    for result in reader.records() {
        progress.rows_parsed += 1;
        let row = result?;

        let mut record = RawRecord::with_capacity(headers.len());
        for (name, value) in headers.iter().zip(row.iter()) {
            record
                .entry(name.to_string())
                .or_insert_with(|| value.to_string());
        }

        let normalized = normalize_row(&record, upload_id, progress.rows_parsed, config);
        coordinator.persist(&normalized)?;
        progress.rows_loaded += 1;
    }

    Ok(())
}
