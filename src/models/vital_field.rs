//! Vital field model
//!
//! Canonical names for every vital sign the ingest pipeline recognises, across all
//! supported dataset schemas. Each field is an observation type tag and a column of
//! the per-patient vitals summary.

use serde::{Deserialize, Serialize};

/// How a field's value is stored in the vitals summary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryKind {
    /// Truncated to an integer
    Integer,
    /// Rounded to two decimal places
    Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VitalField {
    SystolicBp,
    DiastolicBp,
    HeartRate,
    Temperature,
    O2Saturation,
    Glucose,
    Bmi,
    Cholesterol,
    ChestPainType,
    RestingBp,
    FastingBs,
    RestingEcg,
    MaxHeartRate,
    ExerciseAngina,
    StDepression,
    StSlope,
    NumVessels,
    Thalassemia,
    HeartDisease,
}

impl VitalField {
    pub const ALL: [VitalField; 19] = [
        VitalField::SystolicBp,
        VitalField::DiastolicBp,
        VitalField::HeartRate,
        VitalField::Temperature,
        VitalField::O2Saturation,
        VitalField::Glucose,
        VitalField::Bmi,
        VitalField::Cholesterol,
        VitalField::ChestPainType,
        VitalField::RestingBp,
        VitalField::FastingBs,
        VitalField::RestingEcg,
        VitalField::MaxHeartRate,
        VitalField::ExerciseAngina,
        VitalField::StDepression,
        VitalField::StSlope,
        VitalField::NumVessels,
        VitalField::Thalassemia,
        VitalField::HeartDisease,
    ];

    /// Observation type tag
    pub fn as_str(&self) -> &'static str {
        match self {
            VitalField::SystolicBp => "SYSTOLIC_BP",
            VitalField::DiastolicBp => "DIASTOLIC_BP",
            VitalField::HeartRate => "HEART_RATE",
            VitalField::Temperature => "TEMPERATURE",
            VitalField::O2Saturation => "O2_SATURATION",
            VitalField::Glucose => "GLUCOSE",
            VitalField::Bmi => "BMI",
            VitalField::Cholesterol => "CHOLESTEROL",
            VitalField::ChestPainType => "CHEST_PAIN_TYPE",
            VitalField::RestingBp => "RESTING_BP",
            VitalField::FastingBs => "FASTING_BS",
            VitalField::RestingEcg => "RESTING_ECG",
            VitalField::MaxHeartRate => "MAX_HEART_RATE",
            VitalField::ExerciseAngina => "EXERCISE_ANGINA",
            VitalField::StDepression => "ST_DEPRESSION",
            VitalField::StSlope => "ST_SLOPE",
            VitalField::NumVessels => "NUM_VESSELS",
            VitalField::Thalassemia => "THALASSEMIA",
            VitalField::HeartDisease => "HEART_DISEASE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str().eq_ignore_ascii_case(s))
    }

    /// Column in `patient_vitals_summary`
    pub fn summary_column(&self) -> &'static str {
        match self {
            VitalField::SystolicBp => "systolic_bp",
            VitalField::DiastolicBp => "diastolic_bp",
            VitalField::HeartRate => "heart_rate",
            VitalField::Temperature => "temperature",
            VitalField::O2Saturation => "oxygen_saturation",
            VitalField::Glucose => "glucose",
            VitalField::Bmi => "bmi",
            VitalField::Cholesterol => "cholesterol",
            VitalField::ChestPainType => "chest_pain_type",
            VitalField::RestingBp => "resting_bp",
            VitalField::FastingBs => "fasting_bs",
            VitalField::RestingEcg => "resting_ecg",
            VitalField::MaxHeartRate => "max_heart_rate",
            VitalField::ExerciseAngina => "exercise_angina",
            VitalField::StDepression => "st_depression",
            VitalField::StSlope => "st_slope",
            VitalField::NumVessels => "num_vessels",
            VitalField::Thalassemia => "thalassemia",
            VitalField::HeartDisease => "target",
        }
    }

    pub fn summary_kind(&self) -> SummaryKind {
        match self {
            VitalField::Temperature | VitalField::Bmi | VitalField::StDepression => {
                SummaryKind::Decimal
            }
            _ => SummaryKind::Integer,
        }
    }

    /// Unit recorded on observations; empty for coded values
    pub fn unit(&self) -> &'static str {
        match self {
            VitalField::SystolicBp | VitalField::DiastolicBp | VitalField::RestingBp => "mmHg",
            VitalField::HeartRate | VitalField::MaxHeartRate => "bpm",
            VitalField::Temperature => "C",
            VitalField::O2Saturation => "%",
            VitalField::Glucose | VitalField::Cholesterol => "mg/dL",
            VitalField::Bmi => "kg/m2",
            VitalField::StDepression => "mm",
            _ => "",
        }
    }

    /// Value as stored in the vitals summary
    pub fn summary_value(&self, value: f64) -> f64 {
        match self.summary_kind() {
            SummaryKind::Integer => value.trunc(),
            SummaryKind::Decimal => round2(value),
        }
    }
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
