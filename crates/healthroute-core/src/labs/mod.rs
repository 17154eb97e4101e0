//! Lab result import pipeline.
//!
//! Pipeline: Row Source → Column Detection → Normalization → Classification

mod classifier;
mod columns;
mod normalizer;
pub mod report;
mod rows;

pub use classifier::*;
pub use columns::*;
pub use normalizer::*;
pub use report::{extract_report, LabInfo, LabReport, ReportFinding};
pub use rows::*;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{NutrientObservation, ObservationSource, Sex};

/// Import errors.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid rows: {0}")]
    InvalidRows(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),
}

pub type ImportResult<T> = Result<T, ImportError>;

/// Who and what an import is for.
#[derive(Debug, Clone)]
pub struct ImportContext {
    pub user_id: String,
    pub file_name: Option<String>,
    /// Overrides the classifier's default sex
    pub sex: Option<Sex>,
    /// Timestamp for rows without a readable date
    pub now: DateTime<Utc>,
}

impl ImportContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            file_name: None,
            sex: None,
            now: Utc::now(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }
}

/// Result of one import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub observations: Vec<NutrientObservation>,
    /// Shape the rows were read as; `None` for empty input and report text
    pub shape: Option<TableShape>,
    /// Rows that produced no observation
    pub skipped_rows: usize,
}

/// A measurement read from a source, before normalization.
struct RawReading {
    name: String,
    value: f64,
    unit: Option<String>,
    range: Option<String>,
    measured_at: DateTime<Utc>,
}

/// Turns row sources and report text into classified observations.
#[derive(Debug, Clone, Default)]
pub struct LabImporter {
    normalizer: Normalizer,
    classifier: Classifier,
}

impl LabImporter {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            normalizer: Normalizer::new(),
            classifier,
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Decode sheet JSON and import it.
    pub fn import_json(&self, json: &str, ctx: &ImportContext) -> ImportResult<ImportOutcome> {
        let rows = rows_from_json(json)?;
        Ok(self.import_rows(&rows, ctx))
    }

    /// Import rows, detecting the table shape from the first row.
    ///
    /// Rows without a usable name or numeric value are skipped, never fatal.
    pub fn import_rows(&self, rows: &[LabRow], ctx: &ImportContext) -> ImportOutcome {
        if rows.is_empty() {
            return ImportOutcome {
                observations: Vec::new(),
                shape: None,
                skipped_rows: 0,
            };
        }

        let layout = ColumnLayout::detect(rows);
        let outcome = match layout.shape() {
            TableShape::ExplicitTall => self.read_tall(rows, &layout, ctx, TableShape::ExplicitTall),
            TableShape::ImplicitTall => {
                let tall = self.read_tall(rows, &layout, ctx, TableShape::ImplicitTall);
                if tall.observations.is_empty() {
                    debug!("No values in name-column sheet, reading as wide");
                    self.read_wide(rows, &layout, ctx)
                } else {
                    tall
                }
            }
            TableShape::Wide => self.read_wide(rows, &layout, ctx),
        };

        info!(
            user_id = %ctx.user_id,
            shape = outcome.shape.map(TableShape::as_str).unwrap_or("none"),
            imported = outcome.observations.len(),
            skipped = outcome.skipped_rows,
            "Imported lab rows"
        );
        outcome
    }

    /// Import findings extracted from report text.
    pub fn import_report(&self, text: &str, ctx: &ImportContext) -> (LabReport, ImportOutcome) {
        let report = extract_report(text);
        let observations: Vec<NutrientObservation> = report
            .findings
            .iter()
            .map(|finding| {
                self.observe(
                    RawReading {
                        name: finding.name.clone(),
                        value: finding.value,
                        unit: Some(finding.unit.clone()),
                        range: finding.reference_range.clone(),
                        measured_at: ctx.now,
                    },
                    ctx,
                    ObservationSource::Report,
                )
            })
            .collect();

        info!(
            user_id = %ctx.user_id,
            imported = observations.len(),
            "Imported report findings"
        );
        let outcome = ImportOutcome {
            observations,
            shape: None,
            skipped_rows: 0,
        };
        (report, outcome)
    }

    fn read_tall(
        &self,
        rows: &[LabRow],
        layout: &ColumnLayout,
        ctx: &ImportContext,
        shape: TableShape,
    ) -> ImportOutcome {
        let mut observations = Vec::new();
        let mut skipped_rows = 0;

        for (index, row) in rows.iter().enumerate() {
            let reading = match shape {
                TableShape::ExplicitTall => explicit_reading(row, layout, ctx.now),
                _ => implicit_reading(row, layout, ctx.now),
            };
            match reading {
                Some(reading) => {
                    observations.push(self.observe(reading, ctx, ObservationSource::Import))
                }
                None => {
                    debug!(row = index, "Skipping row without name or numeric value");
                    skipped_rows += 1;
                }
            }
        }

        ImportOutcome {
            observations,
            shape: Some(shape),
            skipped_rows,
        }
    }

    fn read_wide(&self, rows: &[LabRow], layout: &ColumnLayout, ctx: &ImportContext) -> ImportOutcome {
        let mut observations = Vec::new();
        let mut skipped_rows = 0;

        for row in rows {
            let measured_at = parse_date_cell(layout.date.as_deref().and_then(|d| row.get(d)), ctx.now);
            let before = observations.len();
            for (header, cell) in row.cells() {
                if layout.date.as_deref() == Some(header) {
                    continue;
                }
                let Some(value) = parse_numeric(cell) else {
                    continue;
                };
                let reading = RawReading {
                    name: header.to_string(),
                    value,
                    unit: None,
                    range: None,
                    measured_at,
                };
                observations.push(self.observe(reading, ctx, ObservationSource::Import));
            }
            if observations.len() == before {
                skipped_rows += 1;
            }
        }

        ImportOutcome {
            observations,
            shape: Some(TableShape::Wide),
            skipped_rows,
        }
    }

    /// Normalize and classify one reading.
    fn observe(
        &self,
        reading: RawReading,
        ctx: &ImportContext,
        source: ObservationSource,
    ) -> NutrientObservation {
        let nutrient = self.normalizer.normalize_name(&reading.name);
        let unit = self
            .normalizer
            .normalize_unit(reading.unit.as_deref().unwrap_or(""), &nutrient);
        let sex = ctx.sex.unwrap_or_else(|| self.classifier.sex());
        let classification =
            self.classifier
                .classify_for_sex(&nutrient, reading.value, reading.range.as_deref(), sex);

        let mut observation = NutrientObservation::new(
            ctx.user_id.clone(),
            nutrient,
            reading.value,
            unit,
            classification.status,
            reading.measured_at,
        );
        observation.reference_range = reading.range;
        observation.file_name = ctx.file_name.clone();
        observation.source = source;
        observation
    }
}

/// Name, value and unit columns must all be non-null.
fn explicit_reading(
    row: &LabRow,
    layout: &ColumnLayout,
    now: DateTime<Utc>,
) -> Option<RawReading> {
    let name = text_cell(row, layout.name.as_deref())?;
    let value_cell = row.get(layout.value.as_deref()?)?;
    let unit_cell = row.get(layout.unit.as_deref()?)?;
    if value_cell.is_null() || unit_cell.is_null() {
        return None;
    }
    let value = parse_numeric(value_cell)?;

    Some(RawReading {
        name,
        value,
        unit: unit_cell.as_text(),
        range: row_range(row, layout),
        measured_at: parse_date_cell(layout.date.as_deref().and_then(|d| row.get(d)), now),
    })
}

/// The first numeric cell outside the name/unit/date/range/bound columns.
fn implicit_reading(
    row: &LabRow,
    layout: &ColumnLayout,
    now: DateTime<Utc>,
) -> Option<RawReading> {
    let name = text_cell(row, layout.name.as_deref())?;
    let value = row
        .cells()
        .filter(|(header, _)| layout.is_value_candidate(header))
        .find_map(|(_, cell)| parse_numeric(cell))?;
    let unit = layout
        .unit
        .as_deref()
        .and_then(|u| row.get(u))
        .and_then(Cell::as_text);

    Some(RawReading {
        name,
        value,
        unit,
        range: row_range(row, layout),
        measured_at: parse_date_cell(layout.date.as_deref().and_then(|d| row.get(d)), now),
    })
}

/// Any non-null, non-blank cell rendered as text; numeric test codes count.
fn text_cell(row: &LabRow, header: Option<&str>) -> Option<String> {
    row.get(header?)?
        .as_text()
        .filter(|s| !s.trim().is_empty())
}

/// Reference range carried by the row: a range column, or min and max columns.
fn row_range(row: &LabRow, layout: &ColumnLayout) -> Option<String> {
    if let Some(text) = layout
        .range
        .as_deref()
        .and_then(|r| row.get(r))
        .and_then(Cell::as_text)
        .filter(|t| !t.trim().is_empty())
    {
        return Some(text.trim().to_string());
    }

    let min = parse_numeric(row.get(layout.lower.as_deref()?)?)?;
    let max = parse_numeric(row.get(layout.upper.as_deref()?)?)?;
    Some(format!("{}-{}", min, max))
}
