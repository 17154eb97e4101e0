//! Weekly meal plan models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Calendar weekday, Monday first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All seven days in plan order.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// Zero-based position within the week.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Display name ("Monday", ...).
    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    /// Match a full day name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|day| day.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Meal slot label.
///
/// Labels outside the four known slots are kept verbatim (lower-cased)
/// in [`MealType::Other`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Other(String),
}

impl MealType {
    /// Parse a heading label.
    pub fn from_label(label: &str) -> Self {
        let lower = label.trim().to_lowercase();
        match lower.as_str() {
            "breakfast" => MealType::Breakfast,
            "lunch" => MealType::Lunch,
            "dinner" => MealType::Dinner,
            "snack" => MealType::Snack,
            _ => MealType::Other(lower),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
            MealType::Other(label) => label,
        }
    }

    /// Whether this is one of the four known slots.
    pub fn is_known(&self) -> bool {
        !matches!(self, MealType::Other(_))
    }
}

impl From<String> for MealType {
    fn from(label: String) -> Self {
        MealType::from_label(&label)
    }
}

impl From<MealType> for String {
    fn from(meal_type: MealType) -> Self {
        meal_type.as_str().to_string()
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed per-meal nutrition estimate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NutrientEstimate {
    pub calories: f64,
    /// Grams of protein
    pub protein: f64,
    /// Grams of carbohydrate
    pub carbs: f64,
    /// Grams of fat
    pub fat: f64,
}

impl NutrientEstimate {
    /// Estimate applied to every parsed meal.
    pub const DEFAULT: NutrientEstimate = NutrientEstimate {
        calories: 350.0,
        protein: 20.0,
        carbs: 40.0,
        fat: 15.0,
    };
}

impl Default for NutrientEstimate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Position of a meal inside a plan: weekday plus slot within that day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MealKey {
    pub day: Weekday,
    pub slot: usize,
}

/// Compact `<day index>:<slot>` form; see [`Meal::legacy_id`] for the
/// `monday-breakfast-0` string.
impl fmt::Display for MealKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.day.index(), self.slot)
    }
}

/// A single meal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub key: MealKey,
    pub name: String,
    #[serde(rename = "type")]
    pub meal_type: MealType,
    pub nutrients: NutrientEstimate,
    /// Preparation time in minutes
    pub prep_time: u32,
    /// 1 to 6 entries
    pub ingredients: Vec<String>,
}

impl Meal {
    /// Default preparation time in minutes.
    pub const DEFAULT_PREP_TIME: u32 = 25;
    /// Maximum ingredients kept per meal.
    pub const MAX_INGREDIENTS: usize = 6;
    /// Ingredient used when a recipe line lists none.
    pub const PLACEHOLDER_INGREDIENT: &'static str = "Ingredients not specified";

    /// String identifier in the `monday-breakfast-0` form.
    pub fn legacy_id(&self) -> String {
        format!(
            "{}-{}-{}",
            self.key.day.name().to_lowercase().replace(' ', "-"),
            self.meal_type.as_str(),
            self.key.slot
        )
    }
}

/// One day of a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    pub day: Weekday,
    pub day_name: String,
    /// Synthetic date: plan creation time offset by the weekday index
    pub date: DateTime<Utc>,
    pub meals: Vec<Meal>,
}

impl DayPlan {
    /// Create a day with no meals.
    pub fn empty(day: Weekday, now: DateTime<Utc>) -> Self {
        Self {
            day,
            day_name: day.name().to_string(),
            date: now + chrono::Duration::days(day.index() as i64),
            meals: Vec::new(),
        }
    }
}

/// Seven-day plan, always Monday through Sunday.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekPlan {
    pub days: Vec<DayPlan>,
}

impl WeekPlan {
    /// A plan where every day is empty.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            days: Weekday::ALL
                .into_iter()
                .map(|day| DayPlan::empty(day, now))
                .collect(),
        }
    }

    /// Get a day by weekday.
    pub fn day(&self, day: Weekday) -> Option<&DayPlan> {
        self.days.iter().find(|d| d.day == day)
    }

    /// Total meals across all days.
    pub fn meal_count(&self) -> usize {
        self.days.iter().map(|d| d.meals.len()).sum()
    }

    /// True when no day has any meal.
    pub fn is_empty(&self) -> bool {
        self.meal_count() == 0
    }
}

/// Where a saved plan came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    Chatbot,
    Manual,
    Import,
}

impl PlanSource {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanSource::Chatbot => "chatbot",
            PlanSource::Manual => "manual",
            PlanSource::Import => "import",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "chatbot" => Some(PlanSource::Chatbot),
            "manual" => Some(PlanSource::Manual),
            "import" => Some(PlanSource::Import),
            _ => None,
        }
    }
}

/// A stored meal plan owned by a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub source: PlanSource,
    pub week_plan: WeekPlan,
}

impl MealPlanRecord {
    /// Wrap a parsed plan for storage with the default name.
    pub fn new(user_id: String, source: PlanSource, week_plan: WeekPlan) -> Self {
        let created_at = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            name: format!("Meal Plan - {}", created_at.format("%Y-%m-%d")),
            created_at,
            source,
            week_plan,
        }
    }
}
