//! Meal plan database operations.
//!
//! A plan is stored as plan → day → meal → ingredient rows; deleting the
//! plan cascades to the rest.

use rusqlite::{params, OptionalExtension};

use super::{format_timestamp, parse_timestamp, Database, DbError, DbResult};
use crate::models::{
    DayPlan, Meal, MealKey, MealPlanRecord, MealType, NutrientEstimate, PlanSource, WeekPlan,
    Weekday,
};

impl Database {
    /// Save a plan with all of its days, meals and ingredients in one transaction.
    pub fn save_meal_plan(&self, record: &MealPlanRecord) -> DbResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO meal_plans (id, user_id, name, source, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                record.user_id,
                record.name,
                record.source.as_str(),
                format_timestamp(&record.created_at),
            ],
        )?;

        for day in &record.week_plan.days {
            tx.execute(
                "INSERT INTO meal_plan_days (meal_plan_id, day_index, day_name, day_date) VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.id,
                    day.day.index() as i64,
                    day.day_name,
                    format_timestamp(&day.date),
                ],
            )?;
            let day_id = tx.last_insert_rowid();

            for meal in &day.meals {
                tx.execute(
                    r#"
                    INSERT INTO meals (
                        day_id, meal_type, name, prep_time_minutes,
                        calories, protein_g, carbs_g, fat_g, sort_order
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                    params![
                        day_id,
                        meal.meal_type.as_str(),
                        meal.name,
                        meal.prep_time,
                        meal.nutrients.calories,
                        meal.nutrients.protein,
                        meal.nutrients.carbs,
                        meal.nutrients.fat,
                        meal.key.slot as i64,
                    ],
                )?;
                let meal_id = tx.last_insert_rowid();

                for (position, ingredient) in meal.ingredients.iter().enumerate() {
                    tx.execute(
                        "INSERT INTO meal_ingredients (meal_id, position, ingredient) VALUES (?1, ?2, ?3)",
                        params![meal_id, position as i64, ingredient],
                    )?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Get a plan by ID.
    pub fn get_meal_plan(&self, id: &str) -> DbResult<Option<MealPlanRecord>> {
        let header = self
            .conn
            .query_row(
                "SELECT id, user_id, name, source, created_at FROM meal_plans WHERE id = ?",
                [id],
                map_plan_row,
            )
            .optional()?;

        header.map(|row| self.load_plan(row)).transpose()
    }

    /// Most recently created plan of a user.
    pub fn get_latest_meal_plan(&self, user_id: &str) -> DbResult<Option<MealPlanRecord>> {
        let header = self
            .conn
            .query_row(
                r#"
                SELECT id, user_id, name, source, created_at
                FROM meal_plans
                WHERE user_id = ?
                ORDER BY created_at DESC, rowid DESC
                LIMIT 1
                "#,
                [user_id],
                map_plan_row,
            )
            .optional()?;

        header.map(|row| self.load_plan(row)).transpose()
    }

    /// All plans of a user, newest first.
    pub fn list_meal_plans(&self, user_id: &str) -> DbResult<Vec<MealPlanRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, name, source, created_at
            FROM meal_plans
            WHERE user_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )?;
        let headers = stmt
            .query_map([user_id], map_plan_row)?
            .collect::<Result<Vec<_>, _>>()?;

        headers.into_iter().map(|row| self.load_plan(row)).collect()
    }

    /// Delete a plan and its days, meals and ingredients.
    pub fn delete_meal_plan(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM meal_plans WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    fn load_plan(&self, row: MealPlanRow) -> DbResult<MealPlanRecord> {
        let mut day_stmt = self.conn.prepare(
            r#"
            SELECT id, day_index, day_name, day_date
            FROM meal_plan_days
            WHERE meal_plan_id = ?
            ORDER BY day_index
            "#,
        )?;
        let day_rows = day_stmt
            .query_map([&row.id], |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut days = Vec::with_capacity(day_rows.len());
        for (day_id, day_index, day_name, day_date) in day_rows {
            let day = usize::try_from(day_index)
                .ok()
                .and_then(|i| Weekday::ALL.get(i).copied())
                .ok_or_else(|| DbError::Constraint(format!("bad day index {}", day_index)))?;
            days.push(DayPlan {
                day,
                day_name,
                date: parse_timestamp(&day_date)?,
                meals: self.load_meals(day_id, day)?,
            });
        }

        Ok(MealPlanRecord {
            source: PlanSource::from_str(&row.source)
                .ok_or_else(|| DbError::Constraint(format!("unknown plan source '{}'", row.source)))?,
            created_at: parse_timestamp(&row.created_at)?,
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            week_plan: WeekPlan { days },
        })
    }

    fn load_meals(&self, day_id: i64, day: Weekday) -> DbResult<Vec<Meal>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, meal_type, name, prep_time_minutes,
                   calories, protein_g, carbs_g, fat_g, sort_order
            FROM meals
            WHERE day_id = ?
            ORDER BY sort_order, id
            "#,
        )?;
        let rows = stmt
            .query_map([day_id], |r| {
                Ok(MealRow {
                    id: r.get(0)?,
                    meal_type: r.get(1)?,
                    name: r.get(2)?,
                    prep_time: r.get(3)?,
                    calories: r.get(4)?,
                    protein: r.get(5)?,
                    carbs: r.get(6)?,
                    fat: r.get(7)?,
                    sort_order: r.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut ingredient_stmt = self.conn.prepare(
            "SELECT ingredient FROM meal_ingredients WHERE meal_id = ? ORDER BY position",
        )?;

        let mut meals = Vec::with_capacity(rows.len());
        for row in rows {
            let ingredients = ingredient_stmt
                .query_map([row.id], |r| r.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            meals.push(Meal {
                key: MealKey {
                    day,
                    slot: usize::try_from(row.sort_order).unwrap_or_default(),
                },
                name: row.name,
                meal_type: MealType::from_label(&row.meal_type),
                nutrients: NutrientEstimate {
                    calories: row.calories,
                    protein: row.protein,
                    carbs: row.carbs,
                    fat: row.fat,
                },
                prep_time: row.prep_time,
                ingredients,
            });
        }
        Ok(meals)
    }
}

fn map_plan_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MealPlanRow> {
    Ok(MealPlanRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        source: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Intermediate row struct for database mapping.
struct MealPlanRow {
    id: String,
    user_id: String,
    name: String,
    source: String,
    created_at: String,
}

/// Intermediate row struct for database mapping.
struct MealRow {
    id: i64,
    meal_type: String,
    name: String,
    prep_time: u32,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    sort_order: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meal_plan::parse_week_plan;

    const PLAN: &str = "\
# Monday
## Breakfast
Recipe: Oatmeal, oats, milk, banana
## Dinner
Recipe: Salmon Bowl, salmon, rice, spinach
# Wednesday
## Lunch
Recipe: Lentil Soup
";

    fn record(user: &str) -> MealPlanRecord {
        MealPlanRecord::new(user.into(), PlanSource::Chatbot, parse_week_plan(PLAN))
    }

    #[test]
    fn test_save_and_get_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let plan = record("user-1");
        db.save_meal_plan(&plan).unwrap();

        let loaded = db.get_meal_plan(&plan.id).unwrap().unwrap();
        assert_eq!(loaded.name, plan.name);
        assert_eq!(loaded.source, PlanSource::Chatbot);
        assert_eq!(loaded.week_plan.days.len(), 7);
        assert_eq!(loaded.week_plan.meal_count(), 3);

        let monday = loaded.week_plan.day(Weekday::Monday).unwrap();
        assert_eq!(monday.meals[1].name, "Salmon Bowl");
        assert_eq!(monday.meals[1].key, MealKey { day: Weekday::Monday, slot: 1 });
        assert_eq!(monday.meals[1].ingredients, vec!["salmon", "rice", "spinach"]);
        assert_eq!(monday.meals[0].nutrients, NutrientEstimate::DEFAULT);

        let wednesday = loaded.week_plan.day(Weekday::Wednesday).unwrap();
        assert_eq!(wednesday.meals[0].ingredients, vec![Meal::PLACEHOLDER_INGREDIENT]);
    }

    #[test]
    fn test_latest_is_scoped_by_user() {
        let db = Database::open_in_memory().unwrap();
        let first = record("user-1");
        db.save_meal_plan(&first).unwrap();
        let mut second = record("user-1");
        second.created_at = first.created_at + chrono::Duration::seconds(5);
        db.save_meal_plan(&second).unwrap();
        db.save_meal_plan(&record("user-2")).unwrap();

        let latest = db.get_latest_meal_plan("user-1").unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(db.list_meal_plans("user-1").unwrap().len(), 2);
        assert!(db.get_latest_meal_plan("user-3").unwrap().is_none());
    }

    #[test]
    fn test_delete_cascades() {
        let db = Database::open_in_memory().unwrap();
        let plan = record("user-1");
        db.save_meal_plan(&plan).unwrap();
        assert!(db.delete_meal_plan(&plan.id).unwrap());

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM meal_ingredients", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
        assert!(db.get_meal_plan(&plan.id).unwrap().is_none());
    }
}
