//! Lab observation export (JSON and CSV).

use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult};
use crate::models::NutrientObservation;

const CSV_HEADER: &str = "measured_at,nutrient,value,unit,reference_range,status,source,file_name\n";

/// One exported observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservationExportRow {
    pub measured_at: String,
    pub nutrient: String,
    pub value: f64,
    pub unit: String,
    pub reference_range: Option<String>,
    pub status: String,
    pub source: String,
    pub file_name: Option<String>,
}

impl From<&NutrientObservation> for ObservationExportRow {
    fn from(obs: &NutrientObservation) -> Self {
        Self {
            measured_at: obs.measured_at.to_rfc3339(),
            nutrient: obs.nutrient.clone(),
            value: obs.value,
            unit: obs.unit.clone(),
            reference_range: obs.reference_range.clone(),
            status: obs.status.as_str().to_string(),
            source: obs.source.as_str().to_string(),
            file_name: obs.file_name.clone(),
        }
    }
}

/// All observations of one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationExport {
    /// Export timestamp
    pub exported_at: String,
    pub user_id: String,
    pub rows: Vec<ObservationExportRow>,
}

impl ObservationExport {
    /// Build an export from observations, keeping their order.
    pub fn new(user_id: &str, observations: &[NutrientObservation]) -> Self {
        Self {
            exported_at: chrono::Utc::now().to_rfc3339(),
            user_id: user_id.to_string(),
            rows: observations.iter().map(ObservationExportRow::from).collect(),
        }
    }

    /// Load and export a user's observations, newest first.
    pub fn for_user(db: &Database, user_id: &str) -> DbResult<Self> {
        let observations = db.list_observations(user_id)?;
        Ok(Self::new(user_id, &observations))
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);

        for row in &self.rows {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{}\n",
                escape_csv(&row.measured_at),
                escape_csv(&row.nutrient),
                row.value,
                escape_csv(&row.unit),
                escape_csv(row.reference_range.as_deref().unwrap_or("")),
                row.status,
                row.source,
                escape_csv(row.file_name.as_deref().unwrap_or("")),
            ));
        }

        csv
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NutrientStatus, ObservationSource};
    use chrono::Utc;

    fn sample() -> NutrientObservation {
        let mut obs = NutrientObservation::new(
            "user-1".into(),
            "Iron (Serum)".into(),
            40.0,
            "µg/dL".into(),
            NutrientStatus::Deficient,
            Utc::now(),
        );
        obs.reference_range = Some("60-170 µg/dL".into());
        obs.file_name = Some("labs, march.xlsx".into());
        obs.source = ObservationSource::Import;
        obs
    }

    #[test]
    fn test_csv_export() {
        let export = ObservationExport::new("user-1", &[sample()]);
        let csv = export.to_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], CSV_HEADER.trim_end());
        assert!(lines[1].contains(",Iron (Serum),40,µg/dL,60-170 µg/dL,deficient,import,"));
        assert!(lines[1].ends_with("\"labs, march.xlsx\""));
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_json_export() {
        let export = ObservationExport::new("user-1", &[sample()]);
        let json = export.to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["user_id"], "user-1");
        assert_eq!(parsed["rows"][0]["status"], "deficient");
        assert_eq!(parsed["rows"][0]["value"], 40.0);
    }

    #[test]
    fn test_for_user_reads_store() {
        let db = Database::open_in_memory().unwrap();
        db.insert_observations(&[sample()]).unwrap();
        let export = ObservationExport::for_user(&db, "user-1").unwrap();
        assert_eq!(export.rows.len(), 1);
        assert!(ObservationExport::for_user(&db, "user-2").unwrap().rows.is_empty());
    }
}
