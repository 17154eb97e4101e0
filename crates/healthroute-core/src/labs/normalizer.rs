//! Nutrient name and unit normalizer.
//!
//! Handles:
//! - Name canonicalization (vitamin D 25-OH variants, iron/serum, ...)
//! - Default units for canonical nutrients
//! - Micro-sign and case cleanup of units (ug/dL→µg/dL, NG/ML→ng/mL)

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DASHES: Regex = Regex::new("[\u{2011}\u{2013}\u{2014}]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
    static ref MICRO: Regex = Regex::new(r"(?i)(?:ug|μg)/(ml|dl)").unwrap();

    /// Name rules in matching order; the first match wins.
    static ref NAME_RULES: Vec<NameRule> = vec![
        NameRule::new(r"(?i)^vitamin d.*1,?25\s*-?\s*oh", "Vitamin D – 1,25-OH"),
        NameRule::new(r"(?i)^vitamin d.*25\s*-?\s*oh", "Vitamin D – 25-OH"),
        NameRule::new(r"(?i)^iron(\s*\(serum\))?", "Iron (Serum)"),
        NameRule::new(r"(?i)^calcium$", "Calcium"),
        NameRule::new(r"(?i)^magnesium$", "Magnesium"),
        NameRule::new(r"(?i)^sodium$", "Sodium"),
        NameRule::new(r"(?i)^phosphorus$", "Phosphorus"),
        NameRule::new(r"(?i)^zinc$", "Zinc"),
        NameRule::new(r"(?i)^vitamin a$", "Vitamin A"),
        NameRule::new(r"(?i)^vitamin b12$", "Vitamin B12"),
        NameRule::new(r"(?i)^vitamin c$", "Vitamin C"),
        NameRule::new(r"(?i)^vitamin e$", "Vitamin E"),
        NameRule::new(r"(?i)^vitamin k$", "Vitamin K"),
    ];

    /// Full-match unit spellings rewritten to canonical casing.
    static ref UNIT_RULES: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(?i)^ng/?ml$").unwrap(), "ng/mL"),
        (Regex::new(r"(?i)^pg/?ml$").unwrap(), "pg/mL"),
        (Regex::new(r"(?i)^mg/?dl$").unwrap(), "mg/dL"),
        (Regex::new(r"(?i)^mmol/?l$").unwrap(), "mmol/L"),
        (Regex::new(r"(?i)^meq/?l$").unwrap(), "mEq/L"),
    ];
}

/// A pattern mapping name variants onto one canonical nutrient.
#[derive(Debug, Clone)]
pub struct NameRule {
    pattern: Regex,
    canonical: String,
}

impl NameRule {
    fn new(pattern: &str, canonical: &str) -> Self {
        Self {
            pattern: Regex::new(pattern).unwrap(),
            canonical: canonical.to_string(),
        }
    }

    /// Build a rule from a user-supplied pattern.
    pub fn try_new(pattern: &str, canonical: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            canonical: canonical.to_string(),
        })
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

/// Normalizer for nutrient names and units.
#[derive(Debug, Clone)]
pub struct Normalizer {
    /// Ordered name rules
    name_rules: Vec<NameRule>,
    /// Canonical nutrient → default unit
    default_units: HashMap<String, String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Create a new normalizer with the built-in tables.
    pub fn new() -> Self {
        Self {
            name_rules: NAME_RULES.clone(),
            default_units: Self::default_units(),
        }
    }

    /// Map a raw nutrient name to its canonical display name.
    ///
    /// Names matching no rule come back trimmed but otherwise unchanged.
    pub fn normalize_name(&self, name: &str) -> String {
        let dashed = DASHES.replace_all(name.trim(), "-");
        let cleaned = WHITESPACE.replace_all(&dashed, " ");

        self.name_rules
            .iter()
            .find(|rule| rule.pattern.is_match(&cleaned))
            .map(|rule| rule.canonical.clone())
            .unwrap_or_else(|| name.trim().to_string())
    }

    /// Normalize a unit for a canonical nutrient.
    ///
    /// A blank unit takes the nutrient's default (empty when it has none).
    pub fn normalize_unit(&self, unit: &str, canonical_name: &str) -> String {
        let unit = unit.trim();
        if unit.is_empty() {
            return self.default_unit(canonical_name).to_string();
        }

        let micro = MICRO.replace_all(unit, |caps: &regex::Captures| {
            let per = if caps[1].eq_ignore_ascii_case("ml") { "mL" } else { "dL" };
            format!("µg/{}", per)
        });

        UNIT_RULES
            .iter()
            .find(|(pattern, _)| pattern.is_match(&micro))
            .map(|(_, canonical)| canonical.to_string())
            .unwrap_or_else(|| micro.into_owned())
    }

    /// Default unit for a canonical nutrient, or "" when unknown.
    pub fn default_unit(&self, canonical_name: &str) -> &str {
        self.default_units
            .get(canonical_name)
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Append a name rule, checked after the built-in ones.
    pub fn add_name_rule(&mut self, rule: NameRule) {
        self.name_rules.push(rule);
    }

    /// Add or replace a default unit.
    pub fn add_default_unit(&mut self, canonical_name: &str, unit: &str) {
        self.default_units
            .insert(canonical_name.to_string(), unit.to_string());
    }

    /// Default units per canonical nutrient.
    fn default_units() -> HashMap<String, String> {
        let mut map = HashMap::new();

        // Electrolytes and minerals
        map.insert("Calcium".into(), "mg/dL".into());
        map.insert("Magnesium".into(), "mEq/L".into());
        map.insert("Sodium".into(), "mmol/L".into());
        map.insert("Phosphorus".into(), "mg/dL".into());
        map.insert("Zinc".into(), "µg/dL".into());
        map.insert("Iron (Serum)".into(), "µg/dL".into());

        // Vitamins
        map.insert("Vitamin A".into(), "µg/dL".into());
        map.insert("Vitamin B12".into(), "pg/mL".into());
        map.insert("Vitamin C".into(), "mg/dL".into());
        map.insert("Vitamin D – 1,25-OH".into(), "pg/mL".into());
        map.insert("Vitamin D – 25-OH".into(), "ng/mL".into());
        map.insert("Vitamin E".into(), "µg/mL".into());
        map.insert("Vitamin K".into(), "ng/mL".into());

        map
    }
}
