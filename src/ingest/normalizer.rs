//! Row normalizer
//!
//! Turns one raw CSV record into a typed record: identity key, demographics and the
//! dataset's vital fields. Normalization never fails; a malformed field degrades to
//! missing (demographics) or to its raw text (vitals).

use std::collections::HashMap;

use serde::Serialize;

use crate::config::IngestConfig;
use crate::ingest::schema::{DatasetSchema, NameColumns, SexCoding};
use crate::models::{round2, Demographics, ObservationValue, Sex, VitalField};

/// Column name to raw cell text. Columns absent from the file are absent here.
pub type RawRecord = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    /// 1-based position among the file's data rows
    pub row_number: u64,
    pub identity_key: String,
    pub demographics: Demographics,
    /// Extracted vitals in schema order
    pub vitals: Vec<(VitalField, ObservationValue)>,
}

impl NormalizedRecord {
    pub fn vital(&self, field: VitalField) -> Option<&ObservationValue> {
        self.vitals.iter().find(|(f, _)| *f == field).map(|(_, v)| v)
    }

    /// Vitals with a numeric value, the ones that feed the summary
    pub fn numeric_vitals(&self) -> Vec<(VitalField, f64)> {
        self.vitals
            .iter()
            .filter_map(|(field, value)| value.as_numeric().map(|v| (*field, v)))
            .collect()
    }
}

/// Identity key synthesized for rows without one
pub fn synthesized_identity(upload_id: i64, row_number: u64) -> String {
    format!("auto_{}_{}", upload_id, row_number)
}

pub fn normalize_row(
    record: &RawRecord,
    upload_id: i64,
    row_number: u64,
    config: &IngestConfig,
) -> NormalizedRecord {
    let schema = config.schema();
    let cells = Cells { record, schema };

    let identity_key = cells
        .first(schema.identity_columns)
        .map(str::to_string)
        .unwrap_or_else(|| synthesized_identity(upload_id, row_number));

    let (first_name, last_name) = match schema.name_columns {
        NameColumns::Full(column) => split_name(cells.get(column).unwrap_or("")),
        NameColumns::Split { first, last } => (
            cells.get(first).unwrap_or("").to_string(),
            cells.get(last).unwrap_or("").to_string(),
        ),
    };

    let height_cm = cells.first(schema.height_columns).and_then(parse_number);
    let weight_kg = cells.first(schema.weight_columns).and_then(parse_number);
    let bmi = cells
        .first(schema.bmi_columns)
        .and_then(parse_number)
        .or_else(|| derive_bmi(height_cm, weight_kg));

    let demographics = Demographics {
        first_name,
        last_name,
        age: parse_age(cells.get(schema.age_column)),
        sex: parse_sex(cells.get(schema.sex_column), config.sex_coding),
        phone: cells.first(schema.phone_columns).unwrap_or("").to_string(),
        height_cm,
        weight_kg,
        bmi,
    };

    let mut vitals = Vec::with_capacity(schema.vital_columns.len() + 1);
    for column in schema.vital_columns {
        let Some(text) = cells.get(column.column) else {
            continue;
        };
        let value = match parse_number(text) {
            Some(n) => ObservationValue::Numeric(column.encoding.apply(n)),
            None => ObservationValue::Text(text.to_string()),
        };
        vitals.push((column.field, value));
    }
    if schema.bmi_is_vital {
        if let Some(bmi) = bmi {
            vitals.push((VitalField::Bmi, ObservationValue::Numeric(bmi)));
        }
    }

    NormalizedRecord {
        row_number,
        identity_key,
        demographics,
        vitals,
    }
}

/// Present, non-missing cells of one record
struct Cells<'a> {
    record: &'a RawRecord,
    schema: &'a DatasetSchema,
}

impl<'a> Cells<'a> {
    fn get(&self, column: &str) -> Option<&'a str> {
        let value = self.record.get(column)?.trim();
        if self.schema.is_missing(value) {
            None
        } else {
            Some(value)
        }
    }

    fn first(&self, columns: &[&str]) -> Option<&'a str> {
        columns.iter().find_map(|c| self.get(c))
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parsed as a float and truncated; anything unusable is 0
pub fn parse_age(value: Option<&str>) -> i64 {
    value.and_then(parse_number).map(|v| v.trunc() as i64).unwrap_or(0)
}

pub fn parse_sex(value: Option<&str>, coding: SexCoding) -> Sex {
    let Some(value) = value.map(str::trim) else {
        return Sex::Other;
    };
    match coding {
        SexCoding::FirstLetter => match value.chars().next().map(|c| c.to_ascii_uppercase()) {
            Some('M') => Sex::Male,
            Some('F') => Sex::Female,
            _ => Sex::Other,
        },
        SexCoding::BinaryFemaleOne => match value {
            "1" => Sex::Female,
            "0" => Sex::Male,
            _ => Sex::Other,
        },
    }
}

/// BMI from height in cm and weight in kg, rounded to 2 decimals
pub fn derive_bmi(height_cm: Option<f64>, weight_kg: Option<f64>) -> Option<f64> {
    match (height_cm, weight_kg) {
        (Some(h), Some(w)) if h > 0.0 => {
            let meters = h / 100.0;
            Some(round2(w / (meters * meters)))
        }
        _ => None,
    }
}

/// "First Middle Last" becomes ("First", "Middle Last")
fn split_name(full: &str) -> (String, String) {
    match full.trim().split_once(char::is_whitespace) {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (full.trim().to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::Dataset;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn heart() -> IngestConfig {
        IngestConfig::for_dataset(Dataset::HeartDisease)
    }

    fn general() -> IngestConfig {
        IngestConfig::for_dataset(Dataset::General)
    }

    #[test]
    fn test_identity_from_column() {
        let rec = record(&[("patient_uid", " HD-001 ")]);
        let out = normalize_row(&rec, 5, 1, &heart());
        assert_eq!(out.identity_key, "HD-001");
    }

    #[test]
    fn test_identity_falls_back_to_patient_id_column() {
        let rec = record(&[("patient_uid", ""), ("patient_id", "legacy-9")]);
        let out = normalize_row(&rec, 5, 1, &heart());
        assert_eq!(out.identity_key, "legacy-9");
    }

    #[test]
    fn test_identity_synthesized_per_row() {
        let rec = record(&[("age", "50")]);
        let a = normalize_row(&rec, 12, 1, &heart());
        let b = normalize_row(&rec, 12, 2, &heart());
        let c = normalize_row(&rec, 13, 1, &heart());
        assert_eq!(a.identity_key, "auto_12_1");
        assert_eq!(b.identity_key, "auto_12_2");
        assert_eq!(c.identity_key, "auto_13_1");
    }

    #[test]
    fn test_age_coercion() {
        assert_eq!(parse_age(Some("63.9")), 63);
        assert_eq!(parse_age(Some("abc")), 0);
        assert_eq!(parse_age(Some("inf")), 0);
        assert_eq!(parse_age(None), 0);

        let rec = record(&[("age", "abc")]);
        assert_eq!(normalize_row(&rec, 1, 1, &heart()).demographics.age, 0);
        let rec = record(&[("age", "-1")]);
        assert_eq!(normalize_row(&rec, 1, 1, &heart()).demographics.age, 0);
    }

    #[test]
    fn test_sex_binary_coding() {
        assert_eq!(parse_sex(Some("1"), SexCoding::BinaryFemaleOne), Sex::Female);
        assert_eq!(parse_sex(Some("0"), SexCoding::BinaryFemaleOne), Sex::Male);
        assert_eq!(parse_sex(Some("2"), SexCoding::BinaryFemaleOne), Sex::Other);
        assert_eq!(parse_sex(Some("F"), SexCoding::BinaryFemaleOne), Sex::Other);
        assert_eq!(parse_sex(None, SexCoding::BinaryFemaleOne), Sex::Other);
    }

    #[test]
    fn test_sex_first_letter_coding() {
        assert_eq!(parse_sex(Some("male"), SexCoding::FirstLetter), Sex::Male);
        assert_eq!(parse_sex(Some("Female"), SexCoding::FirstLetter), Sex::Female);
        assert_eq!(parse_sex(Some("x"), SexCoding::FirstLetter), Sex::Other);
        assert_eq!(parse_sex(Some("1"), SexCoding::FirstLetter), Sex::Other);
    }

    #[test]
    fn test_configured_coding_wins_over_dataset_default() {
        let rec = record(&[("sex", "F")]);
        let config = heart().with_sex_coding(SexCoding::FirstLetter);
        assert_eq!(normalize_row(&rec, 1, 1, &config).demographics.sex, Sex::Female);
        assert_eq!(normalize_row(&rec, 1, 1, &heart()).demographics.sex, Sex::Other);
    }

    #[test]
    fn test_bmi_derived_from_height_and_weight() {
        let rec = record(&[("height_cm", "170"), ("weight_kg", "70")]);
        let out = normalize_row(&rec, 1, 1, &general());
        assert_eq!(out.demographics.bmi, Some(24.22));
        assert_eq!(out.vital(VitalField::Bmi), Some(&ObservationValue::Numeric(24.22)));
    }

    #[test]
    fn test_supplied_bmi_is_kept() {
        let rec = record(&[("height_cm", "170"), ("weight_kg", "70"), ("bmi", "30.1")]);
        let out = normalize_row(&rec, 1, 1, &general());
        assert_eq!(out.demographics.bmi, Some(30.1));
    }

    #[test]
    fn test_bmi_not_derived_without_height() {
        assert_eq!(derive_bmi(Some(0.0), Some(70.0)), None);
        assert_eq!(derive_bmi(None, Some(70.0)), None);
        assert_eq!(derive_bmi(Some(170.0), None), None);

        let rec = record(&[("weight_kg", "70")]);
        let out = normalize_row(&rec, 1, 1, &general());
        assert_eq!(out.demographics.bmi, None);
        assert!(out.vital(VitalField::Bmi).is_none());
    }

    #[test]
    fn test_fasting_blood_sugar_encoded() {
        let high = normalize_row(&record(&[("Fasting Blood Sugar", "130")]), 1, 1, &heart());
        assert_eq!(high.vital(VitalField::FastingBs), Some(&ObservationValue::Numeric(1.0)));

        let low = normalize_row(&record(&[("Fasting Blood Sugar", "90")]), 1, 1, &heart());
        assert_eq!(low.vital(VitalField::FastingBs), Some(&ObservationValue::Numeric(0.0)));
    }

    #[test]
    fn test_vitals_skip_missing_and_keep_text() {
        let rec = record(&[
            ("Resting blood pressure", "145"),
            ("Serum cholesterol level (mg/dl).", "NaN"),
            ("Maximum Heart Rate Achieved", "-1"),
            ("Thalassemia", "fixed defect"),
            ("target", ""),
        ]);
        let out = normalize_row(&rec, 1, 1, &heart());

        assert_eq!(
            out.vitals,
            vec![
                (VitalField::RestingBp, ObservationValue::Numeric(145.0)),
                (VitalField::Thalassemia, ObservationValue::Text("fixed defect".into())),
            ]
        );
        assert_eq!(out.numeric_vitals(), vec![(VitalField::RestingBp, 145.0)]);
    }

    #[test]
    fn test_names_by_dataset() {
        let rec = record(&[("patient_name", "Ada  King Lovelace")]);
        let out = normalize_row(&rec, 1, 1, &heart());
        assert_eq!(out.demographics.first_name, "Ada");
        assert_eq!(out.demographics.last_name, "King Lovelace");

        let rec = record(&[("first_name", "Ada"), ("last_name", "Lovelace"), ("phone", "555")]);
        let out = normalize_row(&rec, 1, 1, &general());
        assert_eq!(out.demographics.first_name, "Ada");
        assert_eq!(out.demographics.last_name, "Lovelace");
        assert_eq!(out.demographics.phone, "555");
    }

    #[test]
    fn test_general_sentinels_allow_negative_one() {
        let rec = record(&[("temperature", "-1")]);
        let out = normalize_row(&rec, 1, 1, &general());
        assert_eq!(out.vital(VitalField::Temperature), Some(&ObservationValue::Numeric(-1.0)));
    }
}
