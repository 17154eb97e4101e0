//! Tabular row source: cells, rows and the numeric/date cell rules.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::warn;

use super::{ImportError, ImportResult};

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Render the cell as text. `Null` has no text.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Number(n) => Some(n.to_string()),
            Cell::Text(s) => Some(s.clone()),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }
}

impl From<&Value> for Cell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Null),
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// One record from a row source: headers paired with cells, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabRow {
    cells: Vec<(String, Cell)>,
}

impl LabRow {
    /// Build a row from header/cell pairs. Headers are trimmed.
    pub fn from_pairs<I, H, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (H, C)>,
        H: Into<String>,
        C: Into<Cell>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(h, c)| (h.into().trim().to_string(), c.into()))
                .collect(),
        }
    }

    /// Headers in column order.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    /// Cells in column order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(h, c)| (h.as_str(), c))
    }

    /// Look up a cell by header.
    pub fn get(&self, header: &str) -> Option<&Cell> {
        self.cells.iter().find(|(h, _)| h == header).map(|(_, c)| c)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Decode a JSON array of objects (sheet-to-JSON output) into rows.
pub fn rows_from_json(json: &str) -> ImportResult<Vec<LabRow>> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(items) = value else {
        return Err(ImportError::InvalidRows("expected a JSON array of rows".into()));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(LabRow::from_pairs(
                map.iter().map(|(k, v)| (k.as_str(), Cell::from(v))),
            )),
            _ => Err(ImportError::InvalidRows(format!("row {} is not an object", i))),
        })
        .collect()
}

/// Parse a cell as a number.
///
/// Numbers pass through. Text keeps only digits, `.` and `-` before parsing,
/// so "9.8 mg/dL" is 9.8. Null, booleans and text with nothing numeric left
/// are not numeric.
pub fn parse_numeric(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => {
            let stripped: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            if stripped.is_empty() {
                return None;
            }
            stripped.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

/// Parse a date cell, falling back to `now` when absent or unreadable.
pub fn parse_date_cell(cell: Option<&Cell>, now: DateTime<Utc>) -> DateTime<Utc> {
    let text = match cell {
        None | Some(Cell::Null) => return now,
        Some(Cell::Text(s)) => s.trim().to_string(),
        Some(other) => {
            warn!(cell = ?other, "Non-text date cell, using import time");
            return now;
        }
    };
    if text.is_empty() {
        return now;
    }

    match parse_date_text(&text) {
        Some(parsed) => parsed,
        None => {
            warn!(date = %text, "Unrecognized date format, using import time");
            now
        }
    }
}

fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    ["%Y-%m-%d", "%m/%d/%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric(&Cell::Number(25.0)), Some(25.0));
        assert_eq!(parse_numeric(&"9.8".into()), Some(9.8));
        assert_eq!(parse_numeric(&"9.8 mg/dL".into()), Some(9.8));
        assert_eq!(parse_numeric(&"<5".into()), Some(5.0));
        assert_eq!(parse_numeric(&"-1.5".into()), Some(-1.5));
        assert_eq!(parse_numeric(&"fasting".into()), None);
        assert_eq!(parse_numeric(&"".into()), None);
        assert_eq!(parse_numeric(&"1.2.3".into()), None);
        assert_eq!(parse_numeric(&"30-100".into()), None);
        assert_eq!(parse_numeric(&Cell::Null), None);
        assert_eq!(parse_numeric(&Cell::Bool(true)), None);
    }

    #[test]
    fn test_rows_from_json_keeps_column_order() {
        let rows = rows_from_json(r#"[{"Test": "Calcium", " Result ": "9.8", "Unit": null}]"#).unwrap();
        assert_eq!(rows.len(), 1);
        let headers: Vec<&str> = rows[0].headers().collect();
        assert_eq!(headers, vec!["Test", "Result", "Unit"]);
        assert_eq!(rows[0].get("Unit"), Some(&Cell::Null));
        assert_eq!(rows[0].get("Result"), Some(&Cell::Text("9.8".into())));
    }

    #[test]
    fn test_rows_from_json_rejects_non_arrays() {
        assert!(matches!(
            rows_from_json(r#"{"Test": "Calcium"}"#),
            Err(ImportError::InvalidRows(_))
        ));
        assert!(matches!(rows_from_json("[1, 2]"), Err(ImportError::InvalidRows(_))));
        assert!(matches!(rows_from_json("not json"), Err(ImportError::Json(_))));
    }

    #[test]
    fn test_parse_date_cell() {
        let now = Utc::now();
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();

        assert_eq!(parse_date_cell(Some(&"2024-01-15".into()), now), expected);
        assert_eq!(parse_date_cell(Some(&"01/15/2024".into()), now), expected);
        assert_eq!(parse_date_cell(Some(&"2024-01-15T00:00:00Z".into()), now), expected);
        assert_eq!(parse_date_cell(Some(&"2024-01-15 00:00:00".into()), now), expected);
        assert_eq!(parse_date_cell(Some(&"last tuesday".into()), now), now);
        assert_eq!(parse_date_cell(None, now), now);
        assert_eq!(parse_date_cell(Some(&Cell::Number(45000.0)), now), now);
    }
}
