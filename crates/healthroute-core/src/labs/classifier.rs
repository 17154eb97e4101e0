//! Classification of lab values against reference ranges.
//!
//! Lookup order:
//! 1. Range printed next to the value ("30-100 ng/mL", "8.5 to 10.5")
//! 2. Stored ranges for the requested sex, then for `any`
//! 3. Built-in table, matched by substring of the lower-cased name
//! 4. No range: `Unknown`, or `Normal` under the legacy policy

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{NutrientStatus, RangeBounds, ReferenceRange, Sex};

lazy_static! {
    static ref RANGE_TEXT: Regex = Regex::new(r"([0-9.]+)\s*(?:to|-|–)\s*([0-9.]+)").unwrap();
}

/// Built-in reference ranges, in lookup order.
pub const BUILTIN_RANGES: &[BuiltinRange] = &[
    BuiltinRange::new("vitamin d", 30.0, 100.0, "ng/mL"),
    BuiltinRange::new("vitamin b12", 200.0, 900.0, "pg/mL"),
    BuiltinRange::new("iron", 60.0, 170.0, "μg/dL"),
    BuiltinRange::new("ferritin", 15.0, 200.0, "ng/mL"),
    BuiltinRange::new("calcium", 8.5, 10.5, "mg/dL"),
    BuiltinRange::new("magnesium", 1.7, 2.2, "mg/dL"),
    BuiltinRange::new("zinc", 60.0, 120.0, "μg/dL"),
    BuiltinRange::new("folate", 2.7, 17.0, "ng/mL"),
    BuiltinRange::new("vitamin a", 20.0, 60.0, "μg/dL"),
    BuiltinRange::new("vitamin e", 5.5, 17.0, "mg/L"),
    BuiltinRange::new("vitamin k", 0.2, 3.2, "ng/mL"),
    BuiltinRange::new("vitamin c", 0.6, 2.0, "mg/dL"),
    BuiltinRange::new("hemoglobin", 12.0, 16.0, "g/dL"),
    BuiltinRange::new("protein", 6.0, 8.3, "g/dL"),
];

/// Static range keyed by a lower-case name fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuiltinRange {
    pub key: &'static str,
    pub min: f64,
    pub max: f64,
    pub unit: &'static str,
}

impl BuiltinRange {
    pub const fn new(key: &'static str, min: f64, max: f64, unit: &'static str) -> Self {
        Self { key, min, max, unit }
    }

    pub fn bounds(&self) -> RangeBounds {
        RangeBounds::new(self.min, self.max)
    }
}

/// Where the bounds used for a classification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeBasis {
    ReportedRange,
    StoredRange,
    BuiltinRange,
    NoRange,
}

/// Outcome of classifying one value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub status: NutrientStatus,
    pub bounds: Option<RangeBounds>,
    pub basis: RangeBasis,
}

/// Stored reference ranges keyed by (nutrient, sex).
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    ranges: HashMap<(String, Sex), RangeBounds>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from stored ranges. Later entries replace earlier ones.
    pub fn from_ranges<'a>(ranges: impl IntoIterator<Item = &'a ReferenceRange>) -> Self {
        let mut table = Self::new();
        for range in ranges {
            table.insert(range);
        }
        table
    }

    pub fn insert(&mut self, range: &ReferenceRange) {
        self.ranges
            .insert((range.nutrient.to_lowercase(), range.sex), range.bounds());
    }

    /// Bounds for a nutrient, preferring the given sex over `any`.
    pub fn lookup(&self, nutrient: &str, sex: Sex) -> Option<RangeBounds> {
        let key = nutrient.trim().to_lowercase();
        self.ranges
            .get(&(key.clone(), sex))
            .or_else(|| self.ranges.get(&(key, Sex::Any)))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Classifies values against reported, stored or built-in ranges.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    table: ReferenceTable,
    sex: Sex,
    unknown_as_normal: bool,
}

impl Classifier {
    /// Classifier with built-in ranges only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use stored ranges ahead of the built-in table.
    pub fn with_table(mut self, table: ReferenceTable) -> Self {
        self.table = table;
        self
    }

    /// Default sex for stored-range lookups.
    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = sex;
        self
    }

    /// Report `Normal` instead of `Unknown` when no range applies.
    pub fn unknown_as_normal(mut self, enabled: bool) -> Self {
        self.unknown_as_normal = enabled;
        self
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    /// Classify with the configured sex.
    pub fn classify(&self, nutrient: &str, value: f64, range_text: Option<&str>) -> Classification {
        self.classify_for_sex(nutrient, value, range_text, self.sex)
    }

    /// Classify a value for a specific sex.
    pub fn classify_for_sex(
        &self,
        nutrient: &str,
        value: f64,
        range_text: Option<&str>,
        sex: Sex,
    ) -> Classification {
        if let Some(text) = range_text.filter(|t| !t.trim().is_empty()) {
            match parse_range_text(text) {
                Some(bounds) => return Self::against(value, bounds, RangeBasis::ReportedRange),
                None => warn!(nutrient, range = text, "Unparseable reference range, ignoring"),
            }
        }

        if let Some(bounds) = self.table.lookup(nutrient, sex) {
            return Self::against(value, bounds, RangeBasis::StoredRange);
        }

        if let Some(builtin) = builtin_range(nutrient) {
            return Self::against(value, builtin.bounds(), RangeBasis::BuiltinRange);
        }

        debug!(nutrient, "No reference range");
        Classification {
            status: if self.unknown_as_normal {
                NutrientStatus::Normal
            } else {
                NutrientStatus::Unknown
            },
            bounds: None,
            basis: RangeBasis::NoRange,
        }
    }

    fn against(value: f64, bounds: RangeBounds, basis: RangeBasis) -> Classification {
        Classification {
            status: status_for(value, bounds),
            bounds: Some(bounds),
            basis,
        }
    }
}

/// Inclusive-bounds status: strictly outside is deficient or excess.
pub fn status_for(value: f64, bounds: RangeBounds) -> NutrientStatus {
    if value < bounds.min {
        NutrientStatus::Deficient
    } else if value > bounds.max {
        NutrientStatus::Excess
    } else {
        NutrientStatus::Normal
    }
}

/// Parse `<min> (to|-|–) <max>` out of free text.
pub fn parse_range_text(text: &str) -> Option<RangeBounds> {
    let caps = RANGE_TEXT.captures(text)?;
    let min = caps[1].parse::<f64>().ok()?;
    let max = caps[2].parse::<f64>().ok()?;
    Some(RangeBounds::new(min, max))
}

/// Find the built-in range for a nutrient name.
///
/// 25-hydroxy variants look up vitamin D and cobalamin variants look up
/// vitamin B12. Otherwise the first key contained in the name wins.
pub fn builtin_range(nutrient: &str) -> Option<&'static BuiltinRange> {
    let lower = nutrient.trim().to_lowercase();
    let lookup = if ["25-oh", "25 oh", "25-hydroxy"].iter().any(|k| lower.contains(k)) {
        "vitamin d"
    } else if ["b12", "b-12", "cobalamin"].iter().any(|k| lower.contains(k)) {
        "vitamin b12"
    } else {
        lower.as_str()
    };

    BUILTIN_RANGES.iter().find(|range| lookup.contains(range.key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_inclusive() {
        let bounds = RangeBounds::new(8.5, 10.5);
        assert_eq!(status_for(8.5, bounds), NutrientStatus::Normal);
        assert_eq!(status_for(10.5, bounds), NutrientStatus::Normal);
        assert_eq!(status_for(8.49, bounds), NutrientStatus::Deficient);
        assert_eq!(status_for(10.51, bounds), NutrientStatus::Excess);
    }

    #[test]
    fn test_parse_range_text() {
        assert_eq!(parse_range_text("30-100 ng/mL"), Some(RangeBounds::new(30.0, 100.0)));
        assert_eq!(parse_range_text("8.5 to 10.5"), Some(RangeBounds::new(8.5, 10.5)));
        assert_eq!(parse_range_text("0.2 – 3.2"), Some(RangeBounds::new(0.2, 3.2)));
        assert_eq!(parse_range_text("normal"), None);
        assert_eq!(parse_range_text("1.2.3-4"), None);
    }

    #[test]
    fn test_builtin_special_cases() {
        assert_eq!(builtin_range("Vitamin D – 25-OH").unwrap().key, "vitamin d");
        assert_eq!(builtin_range("25-Hydroxy D").unwrap().key, "vitamin d");
        assert_eq!(builtin_range("Cobalamin").unwrap().key, "vitamin b12");
        assert_eq!(builtin_range("Iron (Serum)").unwrap().key, "iron");
        assert_eq!(builtin_range("Total Protein").unwrap().key, "protein");
        assert!(builtin_range("Sodium").is_none());
    }

    #[test]
    fn test_reported_range_wins() {
        let classifier = Classifier::new();
        let result = classifier.classify("Calcium", 9.0, Some("9.5-11"));
        assert_eq!(result.status, NutrientStatus::Deficient);
        assert_eq!(result.basis, RangeBasis::ReportedRange);
    }

    #[test]
    fn test_bad_reported_range_falls_back() {
        let classifier = Classifier::new();
        let result = classifier.classify("Calcium", 9.8, Some("see note"));
        assert_eq!(result.status, NutrientStatus::Normal);
        assert_eq!(result.basis, RangeBasis::BuiltinRange);
    }

    #[test]
    fn test_stored_range_by_sex() {
        let mut female = ReferenceRange::new("Iron (Serum)".into(), 50.0, 150.0, "µg/dL".into());
        female.sex = Sex::Female;
        let any = ReferenceRange::new("Iron (Serum)".into(), 65.0, 175.0, "µg/dL".into());
        let table = ReferenceTable::from_ranges([&female, &any]);

        let classifier = Classifier::new().with_table(table);
        let as_female = classifier.classify_for_sex("Iron (Serum)", 55.0, None, Sex::Female);
        assert_eq!(as_female.status, NutrientStatus::Normal);
        assert_eq!(as_female.basis, RangeBasis::StoredRange);

        let as_male = classifier.classify_for_sex("Iron (Serum)", 55.0, None, Sex::Male);
        assert_eq!(as_male.status, NutrientStatus::Deficient);
        assert_eq!(as_male.bounds, Some(RangeBounds::new(65.0, 175.0)));
    }

    #[test]
    fn test_unknown_policy() {
        let strict = Classifier::new().classify("Selenium", 120.0, None);
        assert_eq!(strict.status, NutrientStatus::Unknown);
        assert_eq!(strict.basis, RangeBasis::NoRange);

        let legacy = Classifier::new().unknown_as_normal(true).classify("Selenium", 120.0, None);
        assert_eq!(legacy.status, NutrientStatus::Normal);
    }
}
