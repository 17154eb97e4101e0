//! Full per-user data snapshot, as shown by the database viewer.

use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult};
use crate::models::{HealthEntry, MealPlanRecord, NutrientObservation};

/// Everything stored for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub user_id: String,
    pub exported_at: String,
    pub health_entries: Vec<HealthEntry>,
    pub observations: Vec<NutrientObservation>,
    pub meal_plans: Vec<MealPlanRecord>,
}

impl UserSnapshot {
    /// Collect a user's health entries, observations and meal plans.
    pub fn collect(db: &Database, user_id: &str) -> DbResult<Self> {
        Ok(Self {
            user_id: user_id.to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            health_entries: db.list_health_entries(user_id)?,
            observations: db.list_observations(user_id)?,
            meal_plans: db.list_meal_plans(user_id)?,
        })
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn is_empty(&self) -> bool {
        self.health_entries.is_empty() && self.observations.is_empty() && self.meal_plans.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meal_plan::parse_week_plan;
    use crate::models::PlanSource;

    #[test]
    fn test_collect() {
        let db = Database::open_in_memory().unwrap();
        assert!(UserSnapshot::collect(&db, "user-1").unwrap().is_empty());

        let mut entry = HealthEntry::new("user-1".into());
        entry.allergens = vec!["peanuts".into()];
        db.insert_health_entry(&entry).unwrap();

        let plan = parse_week_plan("# Tuesday\n## Lunch\nRecipe: Wrap, tortilla, beans\n");
        db.save_meal_plan(&MealPlanRecord::new("user-1".into(), PlanSource::Manual, plan))
            .unwrap();

        let snapshot = UserSnapshot::collect(&db, "user-1").unwrap();
        assert_eq!(snapshot.health_entries.len(), 1);
        assert_eq!(snapshot.meal_plans.len(), 1);
        assert!(snapshot.observations.is_empty());

        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"mealPlans\""));
        assert!(json.contains("\"dayName\": \"Tuesday\""));
    }
}
