//! Extraction of lab findings from report text (PDF-to-text output).

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::classifier::BUILTIN_RANGES;

const UNITS: &str = r"ng/mL|mcg/dL|mg/dL|g/dL|IU/L|μg/dL|pg/mL|mIU/mL|μmol/L|pmol/L|nmol/L";

/// Name fragments that mark a row as nutrition-related.
pub const NUTRIENT_KEYWORDS: &[&str] = &[
    "vitamin", "iron", "ferritin", "calcium", "magnesium", "zinc", "folate", "b12", "b-12", "d3",
    "d-3", "hemoglobin", "protein", "albumin", "selenium", "copper", "iodine", "potassium",
    "sodium", "phosphorus", "manganese", "chromium",
];

lazy_static! {
    static ref TABLE_ROW: Regex = Regex::new(&format!(
        r"(?i)([A-Za-z0-9 \t,()%-]+?)\s+([\d.]+)\s*({units})(?:\s+(?:Reference\s+Range\s*:?\s*)?([0-9.-]+\s*(?:to|-|–)\s*[0-9.-]+\s*(?:{units})))?",
        units = UNITS
    ))
    .unwrap();

    /// One free-form pattern per built-in nutrient key.
    static ref FREE_FORM: Vec<(&'static str, Regex)> = BUILTIN_RANGES
        .iter()
        .map(|range| {
            let pattern = format!(
                r"(?i){}[\s:]*([\d.]+)\s*({})",
                regex::escape(range.key),
                UNITS
            );
            (range.key, Regex::new(&pattern).unwrap())
        })
        .collect();

    static ref PATIENT_NAME: Regex =
        Regex::new(r"(?i)Patient(?:\s*name)?(?:\s*:)?[ \t]*([A-Za-z \t]+?)(?:\n|,|;|$)").unwrap();
    static ref PATIENT_ID: Regex =
        Regex::new(r"(?i)(?:Patient\s+ID|ID|MRN)(?:\s*:)?[ \t]*([A-Za-z0-9-]+)(?:\n|,|;|$)").unwrap();
    static ref REPORT_DATE: Regex = Regex::new(
        r"(?i)(?:Report\s+Date|Date\s+of\s+Report|Collection\s+Date)(?:\s*:)?[ \t]*([A-Za-z0-9 \t/-]+)(?:\n|,|;|$)"
    )
    .unwrap();
    static ref LAB_NAME: Regex = Regex::new(
        r"(?i)(?:Laboratory|Lab\s+Name|Facility)(?:\s*:)?[ \t]*([A-Za-z0-9 \t,/.&-]+)(?:\n|;|$)"
    )
    .unwrap();
}

/// Header details of a lab report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabInfo {
    pub patient_name: Option<String>,
    pub patient_id: Option<String>,
    pub report_date: Option<String>,
    pub lab_name: Option<String>,
}

/// A value found in report text, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFinding {
    /// Lower-cased name as printed
    pub name: String,
    pub value: f64,
    pub unit: String,
    pub reference_range: Option<String>,
}

/// Everything extracted from one report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabReport {
    pub info: LabInfo,
    pub findings: Vec<ReportFinding>,
}

/// Extract header details and nutrient findings from report text.
pub fn extract_report(text: &str) -> LabReport {
    let mut findings = table_findings(text);

    for (key, pattern) in FREE_FORM.iter() {
        if findings.iter().any(|f| f.name.contains(key)) {
            continue;
        }
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        let Ok(value) = caps[1].parse::<f64>() else {
            continue;
        };
        findings.push(ReportFinding {
            name: key.to_string(),
            value,
            unit: caps[2].to_string(),
            reference_range: None,
        });
    }

    debug!(count = findings.len(), "Extracted report findings");
    LabReport {
        info: extract_info(text),
        findings,
    }
}

/// Whether a lower-cased name is nutrition-related.
pub fn is_nutrient_of_interest(name: &str) -> bool {
    NUTRIENT_KEYWORDS.iter().any(|k| name.contains(k))
}

fn table_findings(text: &str) -> Vec<ReportFinding> {
    TABLE_ROW
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps[1].trim().to_lowercase();
            if !is_nutrient_of_interest(&name) {
                return None;
            }
            let value = caps[2].parse::<f64>().ok()?;
            Some(ReportFinding {
                name,
                value,
                unit: caps[3].to_string(),
                reference_range: caps.get(4).map(|m| m.as_str().trim().to_string()),
            })
        })
        .collect()
}

fn extract_info(text: &str) -> LabInfo {
    let capture = |re: &Regex| {
        re.captures(text)
            .map(|caps| caps[1].trim().to_string())
            .filter(|s| !s.is_empty())
    };
    LabInfo {
        patient_name: capture(&PATIENT_NAME),
        patient_id: capture(&PATIENT_ID),
        report_date: capture(&REPORT_DATE),
        lab_name: capture(&LAB_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = "\
Laboratory: Quest Diagnostics
Patient Name: Jane Doe
MRN: AB-1234
Report Date: 2024-02-10

Vitamin D, 25-Hydroxy 22 ng/mL Reference Range: 30-100 ng/mL
Ferritin 45 ng/mL 15-200 ng/mL
Glucose 90 mg/dL 70-99 mg/dL
Calcium 9.1 mg/dL
";

    #[test]
    fn test_table_rows() {
        let report = extract_report(REPORT);
        let names: Vec<&str> = report.findings.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"vitamin d, 25-hydroxy"));
        assert!(names.contains(&"ferritin"));
        assert!(!names.iter().any(|n| n.contains("glucose")));

        let vit_d = report
            .findings
            .iter()
            .find(|f| f.name.starts_with("vitamin d"))
            .unwrap();
        assert_eq!(vit_d.value, 22.0);
        assert_eq!(vit_d.unit, "ng/mL");
        assert_eq!(vit_d.reference_range.as_deref(), Some("30-100 ng/mL"));
    }

    #[test]
    fn test_last_line_without_range() {
        let report = extract_report(REPORT);
        let calcium = report.findings.iter().find(|f| f.name == "calcium").unwrap();
        assert_eq!(calcium.value, 9.1);
        assert_eq!(calcium.reference_range, None);
    }

    #[test]
    fn test_free_form_fallback() {
        let report = extract_report("Notes: zinc: 55 μg/dL was measured.");
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].name, "zinc");
        assert_eq!(report.findings[0].value, 55.0);
        assert_eq!(report.findings[0].unit, "μg/dL");
    }

    #[test]
    fn test_lab_info() {
        let info = extract_report(REPORT).info;
        assert_eq!(info.lab_name.as_deref(), Some("Quest Diagnostics"));
        assert_eq!(info.patient_name.as_deref(), Some("Jane Doe"));
        assert_eq!(info.patient_id.as_deref(), Some("AB-1234"));
        assert_eq!(info.report_date.as_deref(), Some("2024-02-10"));
    }

    #[test]
    fn test_no_findings() {
        let report = extract_report("Nothing measurable here.");
        assert!(report.findings.is_empty());
        assert_eq!(report.info, LabInfo::default());
    }
}
