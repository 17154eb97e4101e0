//! Health entry database operations.

use rusqlite::{params, OptionalExtension};

use super::{format_timestamp, parse_timestamp, Database, DbError, DbResult};
use crate::models::{HealthEntry, ObservationSource};

impl Database {
    /// Insert a health entry.
    pub fn insert_health_entry(&self, entry: &HealthEntry) -> DbResult<()> {
        let conditions_json = serde_json::to_string(&entry.conditions)?;
        let allergens_json = serde_json::to_string(&entry.allergens)?;

        self.conn.execute(
            r#"
            INSERT INTO health_entries (
                id, user_id, measured_at, blood_pressure, blood_sugar, blood_sugar_unit,
                weight_kg, height_cm, conditions, allergens, source
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                entry.id,
                entry.user_id,
                format_timestamp(&entry.measured_at),
                entry.blood_pressure,
                entry.blood_sugar,
                entry.blood_sugar_unit,
                entry.weight_kg,
                entry.height_cm,
                conditions_json,
                allergens_json,
                entry.source.as_str(),
            ],
        )?;
        Ok(())
    }

    /// All entries of a user, newest first.
    pub fn list_health_entries(&self, user_id: &str) -> DbResult<Vec<HealthEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, measured_at, blood_pressure, blood_sugar, blood_sugar_unit,
                   weight_kg, height_cm, conditions, allergens, source
            FROM health_entries
            WHERE user_id = ?
            ORDER BY measured_at DESC, rowid DESC
            "#,
        )?;
        let rows = stmt.query_map([user_id], map_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.try_into()?);
        }
        Ok(entries)
    }

    /// Allergens recorded on the user's newest entry; empty when none.
    pub fn latest_allergens(&self, user_id: &str) -> DbResult<Vec<String>> {
        let allergens: Option<String> = self
            .conn
            .query_row(
                r#"
                SELECT allergens FROM health_entries
                WHERE user_id = ?
                ORDER BY measured_at DESC, rowid DESC
                LIMIT 1
                "#,
                [user_id],
                |row| row.get(0),
            )
            .optional()?;

        match allergens {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HealthEntryRow> {
    Ok(HealthEntryRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        measured_at: row.get(2)?,
        blood_pressure: row.get(3)?,
        blood_sugar: row.get(4)?,
        blood_sugar_unit: row.get(5)?,
        weight_kg: row.get(6)?,
        height_cm: row.get(7)?,
        conditions: row.get(8)?,
        allergens: row.get(9)?,
        source: row.get(10)?,
    })
}

/// Intermediate row struct for database mapping.
struct HealthEntryRow {
    id: String,
    user_id: String,
    measured_at: String,
    blood_pressure: Option<String>,
    blood_sugar: Option<f64>,
    blood_sugar_unit: String,
    weight_kg: Option<f64>,
    height_cm: Option<f64>,
    conditions: String,
    allergens: String,
    source: String,
}

impl TryFrom<HealthEntryRow> for HealthEntry {
    type Error = DbError;

    fn try_from(row: HealthEntryRow) -> Result<Self, Self::Error> {
        Ok(HealthEntry {
            measured_at: parse_timestamp(&row.measured_at)?,
            conditions: serde_json::from_str(&row.conditions)?,
            allergens: serde_json::from_str(&row.allergens)?,
            source: ObservationSource::from_str(&row.source)
                .ok_or_else(|| DbError::Constraint(format!("unknown source '{}'", row.source)))?,
            id: row.id,
            user_id: row.user_id,
            blood_pressure: row.blood_pressure,
            blood_sugar: row.blood_sugar,
            blood_sugar_unit: row.blood_sugar_unit,
            weight_kg: row.weight_kg,
            height_cm: row.height_cm,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_insert_and_list() {
        let db = Database::open_in_memory().unwrap();
        let mut entry = HealthEntry::new("user-1".into());
        entry.blood_pressure = Some("120/80".into());
        entry.weight_kg = Some(70.0);
        entry.height_cm = Some(175.0);
        entry.conditions = vec!["hypertension".into()];
        db.insert_health_entry(&entry).unwrap();

        let entries = db.list_health_entries("user-1").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].blood_pressure.as_deref(), Some("120/80"));
        assert_eq!(entries[0].conditions, vec!["hypertension"]);
        assert!(entries[0].bmi().is_some());
        assert!(db.list_health_entries("user-2").unwrap().is_empty());
    }

    #[test]
    fn test_latest_allergens() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.latest_allergens("user-1").unwrap().is_empty());

        let mut old = HealthEntry::new("user-1".into());
        old.measured_at = Utc::now() - Duration::days(3);
        old.allergens = vec!["shellfish".into()];
        db.insert_health_entry(&old).unwrap();

        let mut recent = HealthEntry::new("user-1".into());
        recent.allergens = vec!["peanuts".into(), "gluten".into()];
        db.insert_health_entry(&recent).unwrap();

        assert_eq!(db.latest_allergens("user-1").unwrap(), vec!["peanuts", "gluten"]);
    }
}
