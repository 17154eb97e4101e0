//! Manual health log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ObservationSource;

/// A manually logged set of health measurements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HealthEntry {
    pub id: String,
    pub user_id: String,
    pub measured_at: DateTime<Utc>,
    /// e.g. "120/80"
    pub blood_pressure: Option<String>,
    pub blood_sugar: Option<f64>,
    pub blood_sugar_unit: String,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub conditions: Vec<String>,
    /// Food allergies, fed into meal-plan requests
    pub allergens: Vec<String>,
    pub source: ObservationSource,
}

impl HealthEntry {
    /// Create an empty manual entry for a user.
    pub fn new(user_id: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            measured_at: Utc::now(),
            blood_pressure: None,
            blood_sugar: None,
            blood_sugar_unit: "mg/dL".to_string(),
            weight_kg: None,
            height_cm: None,
            conditions: Vec::new(),
            allergens: Vec::new(),
            source: ObservationSource::Manual,
        }
    }

    /// Body-mass index, when both weight and height are known.
    pub fn bmi(&self) -> Option<f64> {
        let weight = self.weight_kg?;
        let height_m = self.height_cm? / 100.0;
        if height_m <= 0.0 {
            return None;
        }
        Some(weight / (height_m * height_m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi() {
        let mut entry = HealthEntry::new("user-1".into());
        assert_eq!(entry.bmi(), None);

        entry.weight_kg = Some(70.0);
        entry.height_cm = Some(175.0);
        let bmi = entry.bmi().unwrap();
        assert!((bmi - 22.857).abs() < 0.01);

        entry.height_cm = Some(0.0);
        assert_eq!(entry.bmi(), None);
    }
}
