//! Reference range database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::labs::ReferenceTable;
use crate::models::{ReferenceRange, Sex};

impl Database {
    /// Insert a range, or overwrite min/max of the existing (nutrient, sex) entry.
    ///
    /// The unit of an existing entry is left as stored.
    pub fn upsert_reference_range(&self, range: &ReferenceRange) -> DbResult<()> {
        if range.nutrient.trim().is_empty() {
            return Err(DbError::Constraint("reference range needs a nutrient".into()));
        }
        self.conn.execute(
            r#"
            INSERT INTO reference_ranges (nutrient, optimal_min, optimal_max, unit, sex)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(nutrient, sex) DO UPDATE SET
                optimal_min = excluded.optimal_min,
                optimal_max = excluded.optimal_max,
                updated_at = datetime('now')
            "#,
            params![
                range.nutrient,
                range.min,
                range.max,
                range.unit,
                range.sex.as_str(),
            ],
        )?;
        Ok(())
    }

    /// Upsert a batch of ranges in one transaction. Returns the count.
    pub fn upsert_reference_ranges(&self, ranges: &[ReferenceRange]) -> DbResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        for range in ranges {
            self.upsert_reference_range(range)?;
        }
        tx.commit()?;
        Ok(ranges.len())
    }

    /// Get the range stored for exactly (nutrient, sex).
    pub fn get_reference_range(&self, nutrient: &str, sex: Sex) -> DbResult<Option<ReferenceRange>> {
        let result = self
            .conn
            .query_row(
                r#"
                SELECT nutrient, optimal_min, optimal_max, unit, sex
                FROM reference_ranges
                WHERE nutrient = ?1 AND sex = ?2
                "#,
                params![nutrient, sex.as_str()],
                map_row,
            )
            .optional()?;

        result.map(|row| row.try_into()).transpose()
    }

    /// All stored ranges, ordered by nutrient then sex.
    pub fn list_reference_ranges(&self) -> DbResult<Vec<ReferenceRange>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT nutrient, optimal_min, optimal_max, unit, sex
            FROM reference_ranges
            ORDER BY nutrient, sex
            "#,
        )?;
        let rows = stmt.query_map([], map_row)?;

        let mut ranges = Vec::new();
        for row in rows {
            ranges.push(row?.try_into()?);
        }
        Ok(ranges)
    }

    /// Stored ranges as a classifier lookup table.
    pub fn reference_table(&self) -> DbResult<ReferenceTable> {
        let ranges = self.list_reference_ranges()?;
        Ok(ReferenceTable::from_ranges(&ranges))
    }

    /// Delete the range for (nutrient, sex).
    pub fn delete_reference_range(&self, nutrient: &str, sex: Sex) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM reference_ranges WHERE nutrient = ?1 AND sex = ?2",
            params![nutrient, sex.as_str()],
        )?;
        Ok(rows_affected > 0)
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReferenceRangeRow> {
    Ok(ReferenceRangeRow {
        nutrient: row.get(0)?,
        min: row.get(1)?,
        max: row.get(2)?,
        unit: row.get(3)?,
        sex: row.get(4)?,
    })
}

/// Intermediate row struct for database mapping.
struct ReferenceRangeRow {
    nutrient: String,
    min: f64,
    max: f64,
    unit: String,
    sex: String,
}

impl TryFrom<ReferenceRangeRow> for ReferenceRange {
    type Error = DbError;

    fn try_from(row: ReferenceRangeRow) -> Result<Self, Self::Error> {
        let sex = Sex::from_str(&row.sex)
            .ok_or_else(|| DbError::Constraint(format!("unknown sex '{}'", row.sex)))?;
        Ok(ReferenceRange {
            nutrient: row.nutrient,
            min: row.min,
            max: row.max,
            unit: row.unit,
            sex,
        })
    }
}
