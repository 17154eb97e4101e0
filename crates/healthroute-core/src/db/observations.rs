//! Nutrient observation database operations.

use rusqlite::params;

use super::{format_timestamp, parse_timestamp, Database, DbError, DbResult};
use crate::models::{NutrientObservation, NutrientStatus, ObservationSource};

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, measured_at, nutrient, value, unit,
           reference_range, status, source, file_name
    FROM nutrient_observations
"#;

impl Database {
    /// Insert observations in one transaction. Returns the count.
    pub fn insert_observations(&self, observations: &[NutrientObservation]) -> DbResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO nutrient_observations (
                    id, user_id, measured_at, nutrient, value, unit,
                    reference_range, status, source, file_name
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )?;
            for obs in observations {
                stmt.execute(params![
                    obs.id,
                    obs.user_id,
                    format_timestamp(&obs.measured_at),
                    obs.nutrient,
                    obs.value,
                    obs.unit,
                    obs.reference_range,
                    obs.status.as_str(),
                    obs.source.as_str(),
                    obs.file_name,
                ])?;
            }
        }
        tx.commit()?;
        Ok(observations.len())
    }

    /// All observations of a user, newest first.
    pub fn list_observations(&self, user_id: &str) -> DbResult<Vec<NutrientObservation>> {
        let sql = format!(
            "{} WHERE user_id = ?1 ORDER BY measured_at DESC, rowid DESC",
            SELECT_COLUMNS
        );
        self.query_observations(&sql, params![user_id])
    }

    /// One nutrient's observations for a user, oldest first.
    pub fn observation_history(&self, user_id: &str, nutrient: &str) -> DbResult<Vec<NutrientObservation>> {
        let sql = format!(
            "{} WHERE user_id = ?1 AND nutrient = ?2 ORDER BY measured_at ASC, rowid ASC",
            SELECT_COLUMNS
        );
        self.query_observations(&sql, params![user_id, nutrient])
    }

    /// Delete an observation.
    pub fn delete_observation(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM nutrient_observations WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    fn query_observations(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> DbResult<Vec<NutrientObservation>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(ObservationRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                measured_at: row.get(2)?,
                nutrient: row.get(3)?,
                value: row.get(4)?,
                unit: row.get(5)?,
                reference_range: row.get(6)?,
                status: row.get(7)?,
                source: row.get(8)?,
                file_name: row.get(9)?,
            })
        })?;

        let mut observations = Vec::new();
        for row in rows {
            observations.push(row?.try_into()?);
        }
        Ok(observations)
    }
}

/// Intermediate row struct for database mapping.
struct ObservationRow {
    id: String,
    user_id: String,
    measured_at: String,
    nutrient: String,
    value: f64,
    unit: String,
    reference_range: Option<String>,
    status: String,
    source: String,
    file_name: Option<String>,
}

impl TryFrom<ObservationRow> for NutrientObservation {
    type Error = DbError;

    fn try_from(row: ObservationRow) -> Result<Self, Self::Error> {
        Ok(NutrientObservation {
            measured_at: parse_timestamp(&row.measured_at)?,
            status: NutrientStatus::from_str(&row.status)
                .ok_or_else(|| DbError::Constraint(format!("unknown status '{}'", row.status)))?,
            source: ObservationSource::from_str(&row.source)
                .ok_or_else(|| DbError::Constraint(format!("unknown source '{}'", row.source)))?,
            id: row.id,
            user_id: row.user_id,
            nutrient: row.nutrient,
            value: row.value,
            unit: row.unit,
            reference_range: row.reference_range,
            file_name: row.file_name,
        })
    }
}
