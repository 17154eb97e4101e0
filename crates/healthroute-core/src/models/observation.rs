//! Lab observation models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Clinical status of a measurement against its reference range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NutrientStatus {
    /// Within [min, max], boundaries included
    Normal,
    /// Strictly below min
    Deficient,
    /// Strictly above max
    Excess,
    /// No reference range was available
    Unknown,
}

impl NutrientStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            NutrientStatus::Normal => "normal",
            NutrientStatus::Deficient => "deficient",
            NutrientStatus::Excess => "excess",
            NutrientStatus::Unknown => "unknown",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(NutrientStatus::Normal),
            "deficient" => Some(NutrientStatus::Deficient),
            "excess" => Some(NutrientStatus::Excess),
            "unknown" => Some(NutrientStatus::Unknown),
            _ => None,
        }
    }

    /// Whether the value needs the user's attention.
    pub fn is_concern(self) -> bool {
        matches!(self, NutrientStatus::Deficient | NutrientStatus::Excess)
    }
}

/// How an observation entered the system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ObservationSource {
    /// Spreadsheet rows
    Import,
    /// Extracted from report text
    Report,
    Manual,
}

impl ObservationSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ObservationSource::Import => "import",
            ObservationSource::Report => "report",
            ObservationSource::Manual => "manual",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "import" => Some(ObservationSource::Import),
            "report" => Some(ObservationSource::Report),
            "manual" => Some(ObservationSource::Manual),
            _ => None,
        }
    }
}

/// A normalized, classified lab measurement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NutrientObservation {
    pub id: String,
    pub measured_at: DateTime<Utc>,
    /// Canonical nutrient name
    pub nutrient: String,
    pub value: f64,
    /// Canonical unit, empty when unknown
    pub unit: String,
    /// Range as reported alongside the value (e.g. "30-100 ng/mL")
    pub reference_range: Option<String>,
    pub status: NutrientStatus,
    pub user_id: String,
    pub file_name: Option<String>,
    pub source: ObservationSource,
}

impl NutrientObservation {
    /// Create an observation with a fresh id.
    pub fn new(
        user_id: String,
        nutrient: String,
        value: f64,
        unit: String,
        status: NutrientStatus,
        measured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            measured_at,
            nutrient,
            value,
            unit,
            reference_range: None,
            status,
            user_id,
            file_name: None,
            source: ObservationSource::Manual,
        }
    }
}
