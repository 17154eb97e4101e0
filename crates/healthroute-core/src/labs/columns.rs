//! Column-role detection for heterogeneous lab sheets.

use serde::{Deserialize, Serialize};

use super::LabRow;

/// What a column holds, recognized from its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Name,
    Value,
    Unit,
    Date,
    Range,
    LowerBound,
    UpperBound,
}

impl ColumnRole {
    /// Roles in matching order. A header takes the first role whose
    /// synonyms contain it.
    pub const ALL: [ColumnRole; 7] = [
        ColumnRole::Name,
        ColumnRole::Value,
        ColumnRole::Unit,
        ColumnRole::Date,
        ColumnRole::Range,
        ColumnRole::LowerBound,
        ColumnRole::UpperBound,
    ];

    /// Lower-case header synonyms for this role.
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            ColumnRole::Name => &["substance", "analyte", "test", "nutrient", "component", "parameter"],
            ColumnRole::Value => &["value", "result", "reading", "level", "concentration"],
            ColumnRole::Unit => &["unit", "units"],
            ColumnRole::Date => &["date", "measured_at", "measured at", "collected_at"],
            ColumnRole::Range => &["reference range", "reference", "range", "ref range", "normal range"],
            ColumnRole::LowerBound => &["min", "minimum", "low", "lower"],
            ColumnRole::UpperBound => &["max", "maximum", "high", "upper"],
        }
    }

    /// Classify a header, case-insensitively.
    pub fn of_header(header: &str) -> Option<ColumnRole> {
        let lower = header.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|role| role.synonyms().contains(&lower.as_str()))
    }

    /// Min/max labels, never read as a measured value.
    pub fn is_bound(self) -> bool {
        matches!(self, ColumnRole::LowerBound | ColumnRole::UpperBound)
    }
}

/// How observations are laid out in a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableShape {
    /// Name, value and unit columns; one observation per row
    ExplicitTall,
    /// Name column only; the first numeric non-label cell is the value
    ImplicitTall,
    /// Nutrient names are the headers
    Wide,
}

impl TableShape {
    pub fn as_str(self) -> &'static str {
        match self {
            TableShape::ExplicitTall => "explicit_tall",
            TableShape::ImplicitTall => "implicit_tall",
            TableShape::Wide => "wide",
        }
    }
}

/// Columns found for each role, taken from the first row's headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnLayout {
    pub name: Option<String>,
    pub value: Option<String>,
    pub unit: Option<String>,
    pub date: Option<String>,
    pub range: Option<String>,
    pub lower: Option<String>,
    pub upper: Option<String>,
}

impl ColumnLayout {
    /// Detect column roles. The first header matching a role wins.
    pub fn detect(rows: &[LabRow]) -> Self {
        let mut layout = ColumnLayout::default();
        let Some(first) = rows.first() else {
            return layout;
        };

        for header in first.headers() {
            let Some(role) = ColumnRole::of_header(header) else {
                continue;
            };
            let slot = match role {
                ColumnRole::Name => &mut layout.name,
                ColumnRole::Value => &mut layout.value,
                ColumnRole::Unit => &mut layout.unit,
                ColumnRole::Date => &mut layout.date,
                ColumnRole::Range => &mut layout.range,
                ColumnRole::LowerBound => &mut layout.lower,
                ColumnRole::UpperBound => &mut layout.upper,
            };
            if slot.is_none() {
                *slot = Some(header.to_string());
            }
        }
        layout
    }

    /// Preferred shape for this layout.
    pub fn shape(&self) -> TableShape {
        match (&self.name, &self.value, &self.unit) {
            (Some(_), Some(_), Some(_)) => TableShape::ExplicitTall,
            (Some(_), _, _) => TableShape::ImplicitTall,
            _ => TableShape::Wide,
        }
    }

    /// Whether a header may hold the value in an implicit tall sheet.
    pub fn is_value_candidate(&self, header: &str) -> bool {
        let reserved = [&self.name, &self.unit, &self.date, &self.range];
        if reserved.iter().any(|col| col.as_deref() == Some(header)) {
            return false;
        }
        !matches!(ColumnRole::of_header(header), Some(role) if role.is_bound())
    }
}
