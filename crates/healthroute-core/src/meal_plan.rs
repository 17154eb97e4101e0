//! Meal-plan text parser.
//!
//! Turns a markdown-like completion into a [`WeekPlan`]:
//!
//! ```text
//! # Monday
//! ## Breakfast
//! Recipe: Oatmeal, oats, milk, banana
//! ```
//!
//! Parsing is best-effort and never fails. Anything that cannot be placed
//! (a meal without a recipe line, a day whose name is not a weekday) is
//! dropped, and the result always holds all seven days.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::models::{DayPlan, Meal, MealKey, MealType, NutrientEstimate, WeekPlan, Weekday};

const DAY_MARKER: &str = "# ";
const MEAL_MARKER: &str = "## ";
const RECIPE_PREFIX: &str = "recipe:";

/// Parse a completion into a week plan dated from the current time.
pub fn parse_week_plan(text: &str) -> WeekPlan {
    parse_week_plan_at(text, Utc::now())
}

/// Parse a completion into a week plan, dating day N as `now + N days`.
pub fn parse_week_plan_at(text: &str, now: DateTime<Utc>) -> WeekPlan {
    let mut parser = PlanParser::new(now);
    for line in text.lines() {
        parser.feed(line.trim());
    }
    parser.finish()
}

/// A meal whose heading and recipe line have both been seen.
struct PendingMeal {
    meal_type: MealType,
    name: String,
    ingredients: Vec<String>,
}

/// Line-at-a-time scanner state.
struct PlanParser {
    now: DateTime<Utc>,
    day_label: Option<String>,
    meal_label: Option<String>,
    meal_name: Option<String>,
    ingredients: Vec<String>,
    day_meals: Vec<PendingMeal>,
    days: HashMap<Weekday, DayPlan>,
}

impl PlanParser {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            day_label: None,
            meal_label: None,
            meal_name: None,
            ingredients: Vec::new(),
            day_meals: Vec::new(),
            days: HashMap::new(),
        }
    }

    fn feed(&mut self, line: &str) {
        if line.starts_with(DAY_MARKER) && !line.starts_with(MEAL_MARKER) {
            self.flush_day();
            self.day_label = Some(line[DAY_MARKER.len()..].trim().to_string());
        } else if let Some(label) = line.strip_prefix(MEAL_MARKER) {
            self.flush_meal();
            self.meal_label = Some(label.trim().to_string());
        } else if let Some(rest) = strip_prefix_ignore_case(line, RECIPE_PREFIX) {
            let (name, ingredients) = split_recipe(rest);
            // a blank name leaves the meal uncaptured
            self.meal_name = Some(name).filter(|n| !n.is_empty());
            self.ingredients = ingredients;
        }
    }

    /// Move the in-progress meal into the current day, if it is complete.
    fn flush_meal(&mut self) {
        let name = self.meal_name.take();
        let ingredients = std::mem::take(&mut self.ingredients);
        let label = self.meal_label.take();

        match (label, name) {
            (Some(label), Some(name)) => {
                let ingredients = if ingredients.is_empty() {
                    vec![Meal::PLACEHOLDER_INGREDIENT.to_string()]
                } else {
                    ingredients
                };
                self.day_meals.push(PendingMeal {
                    meal_type: MealType::from_label(&label),
                    name,
                    ingredients,
                });
            }
            (Some(label), None) => {
                debug!(meal = %label, "Dropping meal heading without a recipe line");
            }
            _ => {}
        }
    }

    /// Flush the pending meal, then the current day if it has meals.
    fn flush_day(&mut self) {
        self.flush_meal();
        let meals = std::mem::take(&mut self.day_meals);
        let Some(label) = self.day_label.take() else {
            if !meals.is_empty() {
                debug!(count = meals.len(), "Dropping meals that precede any day heading");
            }
            return;
        };
        if meals.is_empty() {
            return;
        }

        let Some(weekday) = Weekday::from_name(&label) else {
            debug!(day = %label, count = meals.len(), "Dropping meals under unrecognized day");
            return;
        };
        if self.days.contains_key(&weekday) {
            warn!(day = %weekday, "Duplicate day heading, keeping the first occurrence");
            return;
        }

        let mut day = DayPlan::empty(weekday, self.now);
        day.meals = meals
            .into_iter()
            .enumerate()
            .map(|(slot, pending)| Meal {
                key: MealKey { day: weekday, slot },
                name: pending.name,
                meal_type: pending.meal_type,
                nutrients: NutrientEstimate::DEFAULT,
                prep_time: Meal::DEFAULT_PREP_TIME,
                ingredients: pending.ingredients,
            })
            .collect();
        self.days.insert(weekday, day);
    }

    fn finish(mut self) -> WeekPlan {
        self.flush_day();

        let mut plan = WeekPlan::empty(self.now);
        for slot in plan.days.iter_mut() {
            if let Some(day) = self.days.remove(&slot.day) {
                *slot = day;
            }
        }
        info!(meals = plan.meal_count(), "Parsed week plan");
        plan
    }
}

/// Strip an ASCII prefix case-insensitively.
fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}

/// Split `Name, ing1, ing2, ...` into the name and up to six ingredients.
fn split_recipe(rest: &str) -> (String, Vec<String>) {
    let mut parts = rest.split(',');
    let name = parts.next().unwrap_or_default().trim().to_string();
    let ingredients = parts
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(Meal::MAX_INGREDIENTS)
        .map(str::to_string)
        .collect();
    (name, ingredients)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-04T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_single_breakfast() {
        let plan = parse_week_plan_at(
            "# Monday\n## Breakfast\nRecipe: Oatmeal, oats, milk, banana\n",
            fixed_now(),
        );

        assert_eq!(plan.days.len(), 7);
        let monday = plan.day(Weekday::Monday).unwrap();
        assert_eq!(monday.meals.len(), 1);

        let meal = &monday.meals[0];
        assert_eq!(meal.name, "Oatmeal");
        assert_eq!(meal.meal_type, MealType::Breakfast);
        assert_eq!(meal.ingredients, vec!["oats", "milk", "banana"]);
        assert_eq!(meal.nutrients, NutrientEstimate::DEFAULT);
        assert_eq!(meal.prep_time, 25);
        assert_eq!(meal.key, MealKey { day: Weekday::Monday, slot: 0 });

        assert_eq!(plan.meal_count(), 1);
    }

    #[test]
    fn test_last_meal_before_next_day_is_kept() {
        let text = "\
# Monday
## Breakfast
Recipe: Eggs, eggs
## Dinner
Recipe: Stew, beef, carrots
# Tuesday
## Lunch
Recipe: Salad, lettuce
";
        let plan = parse_week_plan_at(text, fixed_now());
        let monday = plan.day(Weekday::Monday).unwrap();
        assert_eq!(monday.meals.len(), 2);
        assert_eq!(monday.meals[1].name, "Stew");
        assert_eq!(monday.meals[1].key.slot, 1);
        assert_eq!(plan.day(Weekday::Tuesday).unwrap().meals.len(), 1);
    }

    #[test]
    fn test_days_reordered_and_filled() {
        let text = "# Sunday\n## Snack\nRecipe: Nuts, almonds\n# Wednesday\n## Lunch\nRecipe: Wrap\n";
        let plan = parse_week_plan_at(text, fixed_now());

        let names: Vec<&str> = plan.days.iter().map(|d| d.day.name()).collect();
        assert_eq!(
            names,
            vec!["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
        );
        assert_eq!(plan.days[2].meals.len(), 1);
        assert_eq!(plan.days[6].meals.len(), 1);
        assert_eq!(plan.days[6].date, fixed_now() + chrono::Duration::days(6));
    }

    #[test]
    fn test_meal_without_recipe_dropped() {
        let text = "# Monday\n## Breakfast\nSome prose here\n## Lunch\nRecipe: Soup, water\n";
        let plan = parse_week_plan_at(text, fixed_now());
        let monday = plan.day(Weekday::Monday).unwrap();
        assert_eq!(monday.meals.len(), 1);
        assert_eq!(monday.meals[0].meal_type, MealType::Lunch);
        assert_eq!(monday.meals[0].key.slot, 0);
    }

    #[test]
    fn test_recipe_without_name_dropped() {
        let text = "# Monday\n## Breakfast\nRecipe:\n## Lunch\nRecipe: , oats\n## Dinner\nRecipe: Stew, beef\n";
        let plan = parse_week_plan_at(text, fixed_now());
        let monday = plan.day(Weekday::Monday).unwrap();
        assert_eq!(monday.meals.len(), 1);
        assert_eq!(monday.meals[0].name, "Stew");
        assert_eq!(monday.meals[0].key.slot, 0);

        let blank_only = parse_week_plan_at("# Monday\n## Breakfast\nRecipe:\n## Lunch\nRecipe: , oats\n", fixed_now());
        assert!(blank_only.is_empty());
    }

    #[test]
    fn test_placeholder_ingredient() {
        let plan = parse_week_plan_at("# Friday\n## Dinner\nRecipe: Mystery Dish\n", fixed_now());
        let meal = &plan.day(Weekday::Friday).unwrap().meals[0];
        assert_eq!(meal.ingredients, vec![Meal::PLACEHOLDER_INGREDIENT]);
    }

    #[test]
    fn test_ingredient_cap_and_empty_segments() {
        let plan = parse_week_plan_at(
            "# Monday\n## Lunch\nRecipe: Bowl, a, , b, c, d, e, f, g, h\n",
            fixed_now(),
        );
        let meal = &plan.day(Weekday::Monday).unwrap().meals[0];
        assert_eq!(meal.ingredients, vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_unknown_day_dropped() {
        let plan = parse_week_plan_at("# Day 1\n## Breakfast\nRecipe: Toast, bread\n", fixed_now());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_unknown_meal_type_passes_through() {
        let plan = parse_week_plan_at("# Monday\n## Brunch\nRecipe: Waffles, flour\n", fixed_now());
        let meal = &plan.day(Weekday::Monday).unwrap().meals[0];
        assert_eq!(meal.meal_type, MealType::Other("brunch".into()));
    }

    #[test]
    fn test_case_insensitive_recipe_and_indent() {
        let text = "  # monday\n   ## BREAKFAST\n  RECIPE:  Porridge ,  oats \n";
        let plan = parse_week_plan_at(text, fixed_now());
        let monday = plan.day(Weekday::Monday).unwrap();
        assert_eq!(monday.day_name, "Monday");
        assert_eq!(monday.meals[0].name, "Porridge");
        assert_eq!(monday.meals[0].ingredients, vec!["oats"]);
        assert_eq!(monday.meals[0].meal_type, MealType::Breakfast);
    }

    #[test]
    fn test_duplicate_day_first_wins() {
        let text = "# Monday\n## Breakfast\nRecipe: First\n# Monday\n## Breakfast\nRecipe: Second\n";
        let plan = parse_week_plan_at(text, fixed_now());
        let monday = plan.day(Weekday::Monday).unwrap();
        assert_eq!(monday.meals.len(), 1);
        assert_eq!(monday.meals[0].name, "First");
    }

    #[test]
    fn test_empty_input() {
        let plan = parse_week_plan_at("", fixed_now());
        assert_eq!(plan.days.len(), 7);
        assert!(plan.is_empty());
    }

    #[test]
    fn test_strip_prefix_ignore_case_multibyte() {
        assert_eq!(strip_prefix_ignore_case("Récipe: x", RECIPE_PREFIX), None);
        assert_eq!(strip_prefix_ignore_case("Recipe: x", RECIPE_PREFIX), Some(" x"));
        assert_eq!(strip_prefix_ignore_case("Rec", RECIPE_PREFIX), None);
    }
}
