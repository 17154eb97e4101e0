//! Reference range models.

use serde::{Deserialize, Serialize};

/// Biological sex a reference range applies to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Any,
}

impl Sex {
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Any => "any",
        }
    }

    /// Parse a sex label, case-insensitively.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" => Some(Sex::Male),
            "female" => Some(Sex::Female),
            "any" => Some(Sex::Any),
            _ => None,
        }
    }
}

/// Inclusive [min, max] bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RangeBounds {
    pub min: f64,
    pub max: f64,
}

impl RangeBounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// Reference range for a canonical nutrient, keyed by (nutrient, sex).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceRange {
    /// Canonical nutrient name
    pub nutrient: String,
    #[serde(alias = "optimal_min")]
    pub min: f64,
    #[serde(alias = "optimal_max")]
    pub max: f64,
    pub unit: String,
    #[serde(default)]
    pub sex: Sex,
}

impl ReferenceRange {
    /// Create a range that applies to any sex.
    pub fn new(nutrient: String, min: f64, max: f64, unit: String) -> Self {
        Self {
            nutrient,
            min,
            max,
            unit,
            sex: Sex::Any,
        }
    }

    pub fn bounds(&self) -> RangeBounds {
        RangeBounds::new(self.min, self.max)
    }
}
