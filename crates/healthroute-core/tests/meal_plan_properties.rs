//! Property tests for the meal plan parser.

use healthroute_core::meal_plan::parse_week_plan;
use healthroute_core::models::{Meal, MealType, NutrientEstimate, Weekday};
use proptest::prelude::*;

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn assert_full_week(text: &str) {
    let plan = parse_week_plan(text);
    let names: Vec<&str> = plan.days.iter().map(|d| d.day_name.as_str()).collect();
    assert_eq!(names, DAY_NAMES);
}

#[test]
fn test_single_breakfast() {
    let plan = parse_week_plan("# Monday\n## Breakfast\nRecipe: Oatmeal, oats, milk, banana\n");

    let monday = plan.day(Weekday::Monday).unwrap();
    assert_eq!(monday.meals.len(), 1);
    let meal = &monday.meals[0];
    assert_eq!(meal.name, "Oatmeal");
    assert_eq!(meal.meal_type, MealType::Breakfast);
    assert_eq!(meal.ingredients, vec!["oats", "milk", "banana"]);
    assert_eq!(meal.nutrients, NutrientEstimate::DEFAULT);
    assert_eq!(meal.prep_time, Meal::DEFAULT_PREP_TIME);

    for day in plan.days.iter().skip(1) {
        assert!(day.meals.is_empty(), "{} should be empty", day.day_name);
    }
}

#[test]
fn test_empty_and_unrecognized_input() {
    for text in ["", "\n\n", "Here is your plan!", "# Someday\n## Lunch\nRecipe: Soup, water"] {
        let plan = parse_week_plan(text);
        assert_eq!(plan.days.len(), 7);
        assert!(plan.is_empty(), "expected no meals for {:?}", text);
    }
}

#[test]
fn test_full_reply() {
    let reply = "\
Sure! Here's a plan that avoids peanuts.

# Monday
## Breakfast
Recipe: Greek Yogurt Bowl, yogurt, honey, granola
## Dinner
Recipe: Salmon, salmon fillet, lemon, asparagus

# Wednesday
## Lunch
Recipe: Lentil Soup, lentils, carrots, celery, onion, garlic, cumin, stock
## Snack
Recipe: Apple Slices

Enjoy your week!
";
    let plan = parse_week_plan(reply);
    assert_eq!(plan.meal_count(), 4);

    let monday = plan.day(Weekday::Monday).unwrap();
    assert_eq!(monday.meals[1].meal_type, MealType::Dinner);
    assert_eq!(monday.meals[1].legacy_id(), "monday-dinner-1");

    let wednesday = plan.day(Weekday::Wednesday).unwrap();
    assert_eq!(wednesday.meals[0].ingredients.len(), Meal::MAX_INGREDIENTS);
    assert_eq!(wednesday.meals[0].ingredients[5], "cumin");
    assert_eq!(
        wednesday.meals[1].ingredients,
        vec![Meal::PLACEHOLDER_INGREDIENT.to_string()]
    );
    assert!(plan.day(Weekday::Tuesday).unwrap().meals.is_empty());
}

proptest! {
    #[test]
    fn prop_always_seven_days_in_order(text in ".{0,400}") {
        assert_full_week(&text);
    }

    #[test]
    fn prop_structured_text_keeps_week_shape(
        lines in proptest::collection::vec(
            prop_oneof![
                Just("# Monday".to_string()),
                Just("# Friday".to_string()),
                Just("# Caturday".to_string()),
                Just("## Breakfast".to_string()),
                Just("## Brunch".to_string()),
                "Recipe: [A-Za-z ,]{0,40}",
                "[a-z ]{0,20}",
            ],
            0..30,
        )
    ) {
        assert_full_week(&lines.join("\n"));
        let plan = parse_week_plan(&lines.join("\n"));
        for day in &plan.days {
            for meal in &day.meals {
                prop_assert!(!meal.ingredients.is_empty());
                prop_assert!(meal.ingredients.len() <= Meal::MAX_INGREDIENTS);
            }
        }
    }

    #[test]
    fn prop_ingredients_capped_at_six(
        ingredients in proptest::collection::vec("[a-z]{1,10}", 7..20)
    ) {
        let text = format!(
            "# Thursday\n## Lunch\nRecipe: Big Salad, {}\n",
            ingredients.join(", ")
        );
        let plan = parse_week_plan(&text);
        let meal = &plan.day(Weekday::Thursday).unwrap().meals[0];
        prop_assert_eq!(meal.ingredients.len(), 6);
        prop_assert_eq!(&meal.ingredients[..], &ingredients[..6]);
    }
}
