//! HealthRoute Core Library
//!
//! Local-first meal planning and lab-result tracking.
//!
//! # Architecture
//!
//! ```text
//! Assistant reply ──► Meal Plan Parser ──► WeekPlan ──► meal_plans store
//!
//! Sheet rows / report text
//!        │
//!        ▼
//!  Column Detection → Name/Unit Normalization → Classification
//!                                                     │
//!                                                     ▼
//!                                        nutrient_observations store
//!                                                     │
//!                                        ┌────────────┴────────────┐
//!                                        ▼                         ▼
//!                                    Insights                    Export
//! ```
//!
//! # Modules
//!
//! - [`meal_plan`]: Markdown-like meal plan parser
//! - [`labs`]: Lab import (shape detection, normalizer, classifier, report text)
//! - [`db`]: SQLite persistence
//! - [`models`]: Domain types (WeekPlan, NutrientObservation, ReferenceRange, etc.)
//! - [`insights`]: Dashboard score, trend and status messages
//! - [`export`]: Observation and user-data export
//! - [`config`]: Environment configuration and logging setup

pub mod config;
pub mod db;
pub mod export;
pub mod insights;
pub mod labs;
pub mod meal_plan;
pub mod models;

// Re-export commonly used types
pub use config::{init_logging, ConfigError, CoreConfig};
pub use db::Database;
pub use labs::{
    Classifier, ImportContext, ImportError, ImportOutcome, LabImporter, Normalizer, ReferenceTable,
    TableShape,
};
pub use meal_plan::{parse_week_plan, parse_week_plan_at};
pub use models::{
    DayPlan, HealthEntry, Meal, MealPlanRecord, MealType, NutrientObservation, NutrientStatus,
    ObservationSource, PlanSource, ReferenceRange, Sex, WeekPlan, Weekday,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum HealthRouteError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for HealthRouteError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => HealthRouteError::NotFound(what),
            db::DbError::Constraint(what) => HealthRouteError::InvalidInput(what),
            other => HealthRouteError::DatabaseError(other.to_string()),
        }
    }
}

impl From<labs::ImportError> for HealthRouteError {
    fn from(e: labs::ImportError) -> Self {
        match e {
            labs::ImportError::Database(db) => db.into(),
            other => HealthRouteError::InvalidInput(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for HealthRouteError {
    fn from(e: config::ConfigError) -> Self {
        HealthRouteError::InvalidInput(e.to_string())
    }
}

impl From<serde_json::Error> for HealthRouteError {
    fn from(e: serde_json::Error) -> Self {
        HealthRouteError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for HealthRouteError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        HealthRouteError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<HealthRouteCore>, HealthRouteError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(HealthRouteCore::new(db, CoreConfig::default())))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<HealthRouteCore>, HealthRouteError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(HealthRouteCore::new(db, CoreConfig::default())))
}

/// Parse an assistant reply into a week plan without storing it.
#[uniffi::export]
pub fn parse_meal_plan(text: String) -> FfiWeekPlan {
    parse_week_plan(&text).into()
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct HealthRouteCore {
    db: Arc<Mutex<Database>>,
    config: CoreConfig,
}

impl HealthRouteCore {
    /// Wrap an open database with the given settings.
    pub fn new(db: Database, config: CoreConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config,
        }
    }

    fn importer(&self, db: &Database) -> Result<LabImporter, HealthRouteError> {
        let table = db.reference_table()?;
        Ok(LabImporter::new(self.config.classifier(table)))
    }

    fn context(
        &self,
        user_id: String,
        file_name: Option<String>,
        sex: Option<String>,
    ) -> Result<ImportContext, HealthRouteError> {
        let mut ctx = ImportContext::new(user_id);
        ctx.file_name = file_name;
        ctx.sex = sex.as_deref().map(parse_sex).transpose()?;
        Ok(ctx)
    }
}

fn parse_sex(value: &str) -> Result<Sex, HealthRouteError> {
    Sex::from_str(value).ok_or_else(|| HealthRouteError::InvalidInput(format!("unknown sex '{}'", value)))
}

#[uniffi::export]
impl HealthRouteCore {
    // =========================================================================
    // Reference Range Operations
    // =========================================================================

    /// Add or update a stored reference range.
    pub fn upsert_reference_range(&self, range: FfiReferenceRange) -> Result<(), HealthRouteError> {
        let db = self.db.lock()?;
        let range: ReferenceRange = range.try_into()?;
        db.upsert_reference_range(&range)?;
        Ok(())
    }

    /// List all stored reference ranges.
    pub fn list_reference_ranges(&self) -> Result<Vec<FfiReferenceRange>, HealthRouteError> {
        let db = self.db.lock()?;
        let ranges = db.list_reference_ranges()?;
        Ok(ranges.into_iter().map(|r| r.into()).collect())
    }

    // =========================================================================
    // Lab Import Operations
    // =========================================================================

    /// Import sheet rows (a JSON array of objects) and store the observations.
    pub fn import_lab_rows_json(
        &self,
        user_id: String,
        file_name: Option<String>,
        sex: Option<String>,
        rows_json: String,
    ) -> Result<FfiImportSummary, HealthRouteError> {
        let db = self.db.lock()?;
        let ctx = self.context(user_id, file_name, sex)?;
        let outcome = self.importer(&db)?.import_json(&rows_json, &ctx)?;
        db.insert_observations(&outcome.observations)?;
        Ok(outcome.into())
    }

    /// Extract findings from report text and store them.
    pub fn import_report_text(
        &self,
        user_id: String,
        file_name: Option<String>,
        text: String,
    ) -> Result<FfiImportSummary, HealthRouteError> {
        let db = self.db.lock()?;
        let ctx = self.context(user_id, file_name, None)?;
        let (_report, outcome) = self.importer(&db)?.import_report(&text, &ctx);
        db.insert_observations(&outcome.observations)?;
        Ok(outcome.into())
    }

    /// A user's observations, newest first.
    pub fn list_observations(&self, user_id: String) -> Result<Vec<FfiObservation>, HealthRouteError> {
        let db = self.db.lock()?;
        let observations = db.list_observations(&user_id)?;
        Ok(observations.into_iter().map(|o| o.into()).collect())
    }

    /// Delete one observation.
    pub fn delete_observation(&self, id: String) -> Result<(), HealthRouteError> {
        let db = self.db.lock()?;
        if db.delete_observation(&id)? {
            Ok(())
        } else {
            Err(HealthRouteError::NotFound(format!("observation {}", id)))
        }
    }

    // =========================================================================
    // Meal Plan Operations
    // =========================================================================

    /// Parse an assistant reply and store it as the user's newest plan.
    pub fn parse_and_save_meal_plan(
        &self,
        user_id: String,
        text: String,
    ) -> Result<FfiMealPlan, HealthRouteError> {
        let db = self.db.lock()?;
        let record = MealPlanRecord::new(user_id, PlanSource::Chatbot, parse_week_plan(&text));
        db.save_meal_plan(&record)?;
        Ok(record.into())
    }

    /// The user's most recently saved plan.
    pub fn get_latest_meal_plan(&self, user_id: String) -> Result<Option<FfiMealPlan>, HealthRouteError> {
        let db = self.db.lock()?;
        let record = db.get_latest_meal_plan(&user_id)?;
        Ok(record.map(|r| r.into()))
    }

    // =========================================================================
    // Insight Operations
    // =========================================================================

    /// Percentage of the user's observations in range.
    pub fn nutrient_score(&self, user_id: String) -> Result<u32, HealthRouteError> {
        let db = self.db.lock()?;
        let observations = db.list_observations(&user_id)?;
        Ok(insights::nutrient_score(&observations))
    }

    /// Dashboard summary over the user's observations.
    pub fn nutrient_insights(&self, user_id: String) -> Result<FfiInsights, HealthRouteError> {
        let db = self.db.lock()?;
        let observations = db.list_observations(&user_id)?;
        Ok(FfiInsights {
            score: insights::nutrient_score(&observations),
            trend: insights::score_trend(&observations),
            cards: insights::latest_by_nutrient(&observations)
                .into_iter()
                .map(|o| FfiInsightCard {
                    nutrient: o.nutrient.clone(),
                    title: insights::status_title(o.status).to_string(),
                    message: insights::status_message(o),
                    status: o.status.as_str().to_string(),
                })
                .collect(),
        })
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export a user's observations as CSV.
    pub fn export_observations_csv(&self, user_id: String) -> Result<String, HealthRouteError> {
        let db = self.db.lock()?;
        let export = export::ObservationExport::for_user(&db, &user_id)?;
        Ok(export.to_csv())
    }

    /// Export a user's observations as JSON.
    pub fn export_observations_json(&self, user_id: String) -> Result<String, HealthRouteError> {
        let db = self.db.lock()?;
        let export = export::ObservationExport::for_user(&db, &user_id)?;
        Ok(export.to_json()?)
    }

    /// Export everything stored for a user as JSON.
    pub fn export_user_snapshot_json(&self, user_id: String) -> Result<String, HealthRouteError> {
        let db = self.db.lock()?;
        let snapshot = export::UserSnapshot::collect(&db, &user_id)?;
        Ok(snapshot.to_json()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe reference range.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReferenceRange {
    pub nutrient: String,
    pub min: f64,
    pub max: f64,
    pub unit: String,
    /// "male", "female" or "any"
    pub sex: String,
}

impl From<ReferenceRange> for FfiReferenceRange {
    fn from(range: ReferenceRange) -> Self {
        Self {
            nutrient: range.nutrient,
            min: range.min,
            max: range.max,
            unit: range.unit,
            sex: range.sex.as_str().to_string(),
        }
    }
}

impl TryFrom<FfiReferenceRange> for ReferenceRange {
    type Error = HealthRouteError;

    fn try_from(range: FfiReferenceRange) -> Result<Self, Self::Error> {
        let mut result = ReferenceRange::new(range.nutrient, range.min, range.max, range.unit);
        result.sex = parse_sex(&range.sex)?;
        Ok(result)
    }
}

/// FFI-safe observation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiObservation {
    pub id: String,
    /// RFC 3339 timestamp
    pub measured_at: String,
    pub nutrient: String,
    pub value: f64,
    pub unit: String,
    pub reference_range: Option<String>,
    pub status: String,
    pub file_name: Option<String>,
    pub source: String,
}

impl From<NutrientObservation> for FfiObservation {
    fn from(obs: NutrientObservation) -> Self {
        Self {
            id: obs.id,
            measured_at: obs.measured_at.to_rfc3339(),
            nutrient: obs.nutrient,
            value: obs.value,
            unit: obs.unit,
            reference_range: obs.reference_range,
            status: obs.status.as_str().to_string(),
            file_name: obs.file_name,
            source: obs.source.as_str().to_string(),
        }
    }
}

/// FFI-safe import result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiImportSummary {
    /// Table shape the rows were read as, if any
    pub shape: Option<String>,
    pub skipped_rows: u32,
    pub observations: Vec<FfiObservation>,
}

impl From<ImportOutcome> for FfiImportSummary {
    fn from(outcome: ImportOutcome) -> Self {
        Self {
            shape: outcome.shape.map(|s| s.as_str().to_string()),
            skipped_rows: outcome.skipped_rows as u32,
            observations: outcome.observations.into_iter().map(|o| o.into()).collect(),
        }
    }
}

/// FFI-safe meal.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMeal {
    pub id: String,
    pub name: String,
    pub meal_type: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub prep_time: u32,
    pub ingredients: Vec<String>,
}

impl From<Meal> for FfiMeal {
    fn from(meal: Meal) -> Self {
        Self {
            id: meal.legacy_id(),
            name: meal.name,
            meal_type: meal.meal_type.as_str().to_string(),
            calories: meal.nutrients.calories,
            protein: meal.nutrients.protein,
            carbs: meal.nutrients.carbs,
            fat: meal.nutrients.fat,
            prep_time: meal.prep_time,
            ingredients: meal.ingredients,
        }
    }
}

/// FFI-safe day of a plan.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDayPlan {
    pub day_name: String,
    /// RFC 3339 timestamp
    pub date: String,
    pub meals: Vec<FfiMeal>,
}

impl From<DayPlan> for FfiDayPlan {
    fn from(day: DayPlan) -> Self {
        Self {
            day_name: day.day_name,
            date: day.date.to_rfc3339(),
            meals: day.meals.into_iter().map(|m| m.into()).collect(),
        }
    }
}

/// FFI-safe week plan.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiWeekPlan {
    pub days: Vec<FfiDayPlan>,
}

impl From<WeekPlan> for FfiWeekPlan {
    fn from(plan: WeekPlan) -> Self {
        Self {
            days: plan.days.into_iter().map(|d| d.into()).collect(),
        }
    }
}

/// FFI-safe stored meal plan.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMealPlan {
    pub id: String,
    pub name: String,
    /// RFC 3339 timestamp
    pub created_at: String,
    pub source: String,
    pub week_plan: FfiWeekPlan,
}

impl From<MealPlanRecord> for FfiMealPlan {
    fn from(record: MealPlanRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            created_at: record.created_at.to_rfc3339(),
            source: record.source.as_str().to_string(),
            week_plan: record.week_plan.into(),
        }
    }
}

/// FFI-safe dashboard card.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInsightCard {
    pub nutrient: String,
    pub title: String,
    pub message: String,
    pub status: String,
}

/// FFI-safe dashboard summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiInsights {
    pub score: u32,
    pub trend: String,
    pub cards: Vec<FfiInsightCard>,
}
