//! Runtime configuration
//!
//! Read from the environment:
//! - `AEGIS_DATABASE_PATH`: SQLite file (default `<project>/data/aegiscare.db`)
//! - `AEGIS_DATASET`: `heart_disease` (default) or `general`
//! - `AEGIS_SEX_CODING`: `first_letter` or `binary`; defaults to the dataset's coding

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::ingest::{Dataset, DatasetSchema, SexCoding};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown dataset '{0}' (expected heart_disease or general)")]
    UnknownDataset(String),

    #[error("unknown sex coding '{0}' (expected first_letter or binary)")]
    UnknownSexCoding(String),
}

/// Per-deployment ingest settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestConfig {
    pub dataset: Dataset,
    pub sex_coding: SexCoding,
}

impl IngestConfig {
    /// Dataset with its own sex coding
    pub fn for_dataset(dataset: Dataset) -> Self {
        Self {
            dataset,
            sex_coding: dataset.schema().sex_coding,
        }
    }

    pub fn with_sex_coding(mut self, sex_coding: SexCoding) -> Self {
        self.sex_coding = sex_coding;
        self
    }

    pub fn schema(&self) -> &'static DatasetSchema {
        self.dataset.schema()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dataset = match lookup("AEGIS_DATASET").filter(|v| !v.trim().is_empty()) {
            Some(name) => {
                Dataset::from_str(name.trim()).ok_or(ConfigError::UnknownDataset(name))?
            }
            None => Dataset::HeartDisease,
        };

        let mut config = Self::for_dataset(dataset);
        if let Some(coding) = lookup("AEGIS_SEX_CODING").filter(|v| !v.trim().is_empty()) {
            let parsed =
                SexCoding::from_str(coding.trim()).ok_or(ConfigError::UnknownSexCoding(coding))?;
            config = config.with_sex_coding(parsed);
        }

        Ok(config)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self::for_dataset(Dataset::HeartDisease)
    }
}

/// Get the database path from environment or use default
pub fn database_path() -> PathBuf {
    std::env::var("AEGIS_DATABASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let mut path = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));

            // Go up from target/release or target/debug to project root
            if path.ends_with("release") || path.ends_with("debug") {
                if let Some(parent) = path.parent() {
                    if let Some(grandparent) = parent.parent() {
                        path = grandparent.to_path_buf();
                    }
                }
            }

            path.push("data");
            path.push("aegiscare.db");
            path
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_to_heart_disease() {
        let config = IngestConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.dataset, Dataset::HeartDisease);
        assert_eq!(config.sex_coding, SexCoding::BinaryFemaleOne);
    }

    #[test]
    fn test_dataset_brings_its_sex_coding() {
        let config = IngestConfig::from_lookup(lookup(&[("AEGIS_DATASET", "general")])).unwrap();
        assert_eq!(config.dataset, Dataset::General);
        assert_eq!(config.sex_coding, SexCoding::FirstLetter);
    }

    #[test]
    fn test_sex_coding_override() {
        let config = IngestConfig::from_lookup(lookup(&[
            ("AEGIS_DATASET", "heart_disease"),
            ("AEGIS_SEX_CODING", "first_letter"),
        ]))
        .unwrap();
        assert_eq!(config.sex_coding, SexCoding::FirstLetter);
    }

    #[test]
    fn test_rejects_unknown_values() {
        assert_eq!(
            IngestConfig::from_lookup(lookup(&[("AEGIS_DATASET", "fhir")])),
            Err(ConfigError::UnknownDataset("fhir".to_string()))
        );
        assert_eq!(
            IngestConfig::from_lookup(lookup(&[("AEGIS_SEX_CODING", "ternary")])),
            Err(ConfigError::UnknownSexCoding("ternary".to_string()))
        );
    }
}
