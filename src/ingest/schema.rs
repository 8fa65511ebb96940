//! Dataset schemas
//!
//! Each supported CSV layout is a fixed, versioned table: which columns identify the
//! patient, where demographics live, which sentinels mean "missing", and how source
//! columns map to canonical vital fields.

use serde::{Deserialize, Serialize};

use crate::models::VitalField;

/// How the sex column is coded in the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SexCoding {
    /// First letter of the value: `M`, `F`, anything else is other
    FirstLetter,
    /// `1` is female, `0` is male, anything else is other
    BinaryFemaleOne,
}

impl SexCoding {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "first_letter" | "letter" => Some(SexCoding::FirstLetter),
            "binary" | "binary_female_one" => Some(SexCoding::BinaryFemaleOne),
            _ => None,
        }
    }
}

/// Transformation applied to a numeric source value before it is stored
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Encoding {
    Raw,
    /// `1` when the raw value exceeds the threshold, else `0`
    AboveThreshold(f64),
}

impl Encoding {
    pub fn apply(&self, raw: f64) -> f64 {
        match self {
            Encoding::Raw => raw,
            Encoding::AboveThreshold(threshold) => {
                if raw > *threshold {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VitalColumn {
    pub column: &'static str,
    pub field: VitalField,
    pub encoding: Encoding,
}

const fn raw(column: &'static str, field: VitalField) -> VitalColumn {
    VitalColumn {
        column,
        field,
        encoding: Encoding::Raw,
    }
}

/// Where the patient's name comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameColumns {
    /// One column holding "First Last"
    Full(&'static str),
    Split {
        first: &'static str,
        last: &'static str,
    },
}

#[derive(Debug)]
pub struct DatasetSchema {
    pub name: &'static str,
    pub version: u32,
    /// Checked in order; the first non-missing value is the identity key
    pub identity_columns: &'static [&'static str],
    pub name_columns: NameColumns,
    pub phone_columns: &'static [&'static str],
    pub age_column: &'static str,
    pub sex_column: &'static str,
    pub sex_coding: SexCoding,
    pub height_columns: &'static [&'static str],
    pub weight_columns: &'static [&'static str],
    pub bmi_columns: &'static [&'static str],
    /// Whether a supplied or derived BMI is also reported as the `BMI` vital
    pub bmi_is_vital: bool,
    /// Trimmed values treated as missing
    pub missing_sentinels: &'static [&'static str],
    pub vital_columns: &'static [VitalColumn],
}

impl DatasetSchema {
    pub fn is_missing(&self, value: &str) -> bool {
        self.missing_sentinels.contains(&value.trim())
    }
}

pub static HEART_DISEASE: DatasetSchema = DatasetSchema {
    name: "heart_disease",
    version: 1,
    identity_columns: &["patient_uid", "patient_id"],
    name_columns: NameColumns::Full("patient_name"),
    phone_columns: &["phone", "contact_phone"],
    age_column: "age",
    sex_column: "sex",
    sex_coding: SexCoding::BinaryFemaleOne,
    height_columns: &[],
    weight_columns: &[],
    bmi_columns: &[],
    bmi_is_vital: false,
    missing_sentinels: &["", "NaN", "nan", "-1"],
    vital_columns: &[
        raw("chest pain type", VitalField::ChestPainType),
        raw("Resting blood pressure", VitalField::RestingBp),
        raw("Serum cholesterol level (mg/dl).", VitalField::Cholesterol),
        VitalColumn {
            column: "Fasting Blood Sugar",
            field: VitalField::FastingBs,
            encoding: Encoding::AboveThreshold(120.0),
        },
        raw("Resting Electrocardiogram Results", VitalField::RestingEcg),
        raw("Maximum Heart Rate Achieved", VitalField::MaxHeartRate),
        raw("Exercise-Induced Angina", VitalField::ExerciseAngina),
        raw("ST Depression Induced by Exercise", VitalField::StDepression),
        raw("Slope of the Peak Exercise ST Segment", VitalField::StSlope),
        raw("Number of Major Vessels Colored by Fluoroscopy", VitalField::NumVessels),
        raw("Thalassemia", VitalField::Thalassemia),
        raw("target", VitalField::HeartDisease),
    ],
};

pub static GENERAL_VITALS: DatasetSchema = DatasetSchema {
    name: "general",
    version: 1,
    identity_columns: &["patient_uid", "patient_id"],
    name_columns: NameColumns::Split {
        first: "first_name",
        last: "last_name",
    },
    phone_columns: &["contact_phone", "phone"],
    age_column: "age",
    sex_column: "sex",
    sex_coding: SexCoding::FirstLetter,
    height_columns: &["height_cm", "height"],
    weight_columns: &["weight_kg", "weight"],
    bmi_columns: &["bmi"],
    bmi_is_vital: true,
    missing_sentinels: &["", "NaN", "nan"],
    vital_columns: &[
        raw("systolic_bp", VitalField::SystolicBp),
        raw("diastolic_bp", VitalField::DiastolicBp),
        raw("heart_rate", VitalField::HeartRate),
        raw("temperature", VitalField::Temperature),
        raw("oxygen_saturation", VitalField::O2Saturation),
        raw("cholesterol", VitalField::Cholesterol),
        raw("glucose", VitalField::Glucose),
    ],
};

/// Supported CSV layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    HeartDisease,
    General,
}

impl Dataset {
    pub fn schema(&self) -> &'static DatasetSchema {
        match self {
            Dataset::HeartDisease => &HEART_DISEASE,
            Dataset::General => &GENERAL_VITALS,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "heart_disease" | "heart" => Some(Dataset::HeartDisease),
            "general" | "vitals" => Some(Dataset::General),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.schema().name
    }
}
