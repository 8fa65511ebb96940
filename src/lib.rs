//! AegisCare ingest library
//!
//! Patient CSV ingestion into SQLite: upload bookkeeping, row normalization and
//! patient / observation / vitals-summary persistence.

pub mod build_info;
pub mod config;
pub mod db;
pub mod ingest;
pub mod models;
