//! SQLite schema definition.

/// Complete database schema for HealthRoute.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Reference Ranges
-- ============================================================================

CREATE TABLE IF NOT EXISTS reference_ranges (
    nutrient TEXT NOT NULL,                      -- canonical nutrient name
    optimal_min REAL NOT NULL,
    optimal_max REAL NOT NULL,
    unit TEXT NOT NULL DEFAULT '',
    sex TEXT NOT NULL DEFAULT 'any',             -- male | female | any
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(nutrient, sex)
);

-- ============================================================================
-- Nutrient Observations
-- ============================================================================

CREATE TABLE IF NOT EXISTS nutrient_observations (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    measured_at TEXT NOT NULL,                   -- RFC 3339
    nutrient TEXT NOT NULL,
    value REAL NOT NULL,
    unit TEXT NOT NULL DEFAULT '',
    reference_range TEXT,
    status TEXT NOT NULL,                        -- normal | deficient | excess | unknown
    source TEXT NOT NULL DEFAULT 'import',       -- import | report | manual
    file_name TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_observations_user ON nutrient_observations(user_id, measured_at);
CREATE INDEX IF NOT EXISTS idx_observations_nutrient ON nutrient_observations(user_id, nutrient);

-- ============================================================================
-- Meal Plans (plan → day → meal → ingredient)
-- ============================================================================

CREATE TABLE IF NOT EXISTS meal_plans (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    source TEXT NOT NULL DEFAULT 'chatbot',      -- chatbot | manual | import
    created_at TEXT NOT NULL                     -- RFC 3339
);

CREATE INDEX IF NOT EXISTS idx_meal_plans_user ON meal_plans(user_id, created_at);

CREATE TABLE IF NOT EXISTS meal_plan_days (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    meal_plan_id TEXT NOT NULL REFERENCES meal_plans(id) ON DELETE CASCADE,
    day_index INTEGER NOT NULL,                  -- 0 = Monday
    day_name TEXT NOT NULL,
    day_date TEXT NOT NULL,
    UNIQUE(meal_plan_id, day_index)
);

CREATE TABLE IF NOT EXISTS meals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    day_id INTEGER NOT NULL REFERENCES meal_plan_days(id) ON DELETE CASCADE,
    meal_type TEXT NOT NULL,
    name TEXT NOT NULL,
    prep_time_minutes INTEGER NOT NULL,
    calories REAL NOT NULL,
    protein_g REAL NOT NULL,
    carbs_g REAL NOT NULL,
    fat_g REAL NOT NULL,
    sort_order INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_meals_day ON meals(day_id, sort_order);

CREATE TABLE IF NOT EXISTS meal_ingredients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    meal_id INTEGER NOT NULL REFERENCES meals(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    ingredient TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ingredients_meal ON meal_ingredients(meal_id, position);

-- ============================================================================
-- Health Entries
-- ============================================================================

CREATE TABLE IF NOT EXISTS health_entries (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    measured_at TEXT NOT NULL,
    blood_pressure TEXT,
    blood_sugar REAL,
    blood_sugar_unit TEXT NOT NULL DEFAULT 'mg/dL',
    weight_kg REAL,
    height_cm REAL,
    conditions TEXT NOT NULL DEFAULT '[]',       -- JSON array of strings
    allergens TEXT NOT NULL DEFAULT '[]',        -- JSON array of strings
    source TEXT NOT NULL DEFAULT 'manual'
);

CREATE INDEX IF NOT EXISTS idx_health_entries_user ON health_entries(user_id, measured_at);
"#;
