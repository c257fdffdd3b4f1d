//! End-to-end check of the recipe wire format as the import tool sees it:
//! a JSON file on disk, with the backend's field names, parsed into recipes
//! and run through the filter engine.

use std::io::Write;

use bitebot::filters::{filter_recipes, FacetFilters, FacetGroup};
use bitebot::models::Recipe;

const FIXTURE: &str = r#"[
  {
    "recipe_id": "r-001",
    "name": "Masoor Dal Tadka",
    "image_url": "https://cdn.example.com/dal.jpg",
    "time_required": 35,
    "approx_price_per_portion": 1.8,
    "nutrition": {
      "calories": 320,
      "protein": 18,
      "carbs": 48,
      "fat": 6,
      "fiber": 11
    },
    "tags": {
      "dietary_preferences": ["Vegetarian", "Gluten-Free"],
      "health_goal": [
        {"main": "High-Protein", "sub": ["Plant Protein"]},
        {"main": "Iron & Folate Rich", "sub": []}
      ],
      "cultural": {"main": "Authentic", "sub": "North Indian"},
      "meal_type": "Dinner",
      "meal_preference": "Meal-Prep Friendly"
    },
    "ingredients": [
      {"name": "red lentils", "quantity": "1 cup"},
      {"name": "onion", "quantity": "1"}
    ],
    "instructions": ["Rinse the lentils.", "Simmer until soft."]
  },
  {
    "recipe_id": "r-002",
    "name": "Berry Yogurt Parfait",
    "image_url": "",
    "time_required": 10,
    "approx_price_per_portion": 2.5,
    "nutrition": {"calories": 210, "protein": 12, "carbs": 30, "fat": 4, "fiber": 5},
    "tags": {
      "dietary_preferences": ["Vegetarian"],
      "health_goal": [{"main": "Low-Sugar", "sub": []}],
      "cultural": {"main": "Fusion", "sub": ""},
      "meal_type": "Breakfast",
      "meal_preference": "Quick-to-Prepare"
    },
    "ingredients": [{"name": "greek yogurt", "quantity": "200g"}],
    "instructions": ["Layer yogurt and berries."]
  }
]"#;

fn load_fixture() -> Vec<Recipe> {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(FIXTURE.as_bytes()).unwrap();

    let content = std::fs::read_to_string(file.path()).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn backend_field_names_map_onto_recipes() {
    let recipes = load_fixture();
    assert_eq!(recipes.len(), 2);

    let dal = &recipes[0];
    assert_eq!(dal.recipe_id, "r-001");
    assert_eq!(dal.title, "Masoor Dal Tadka");
    assert_eq!(dal.time_minutes, 35);
    assert_eq!(dal.price_per_portion, 1.8);
    assert_eq!(dal.nutrition.protein, 18.0);
    assert_eq!(dal.tags.cultural.sub, "North Indian");
    assert_eq!(dal.ingredients[0].name, "red lentils");
}

#[test]
fn parsed_recipes_flow_through_the_filter_engine() {
    let recipes = load_fixture();

    let mut filters = FacetFilters::default();
    filters.toggle(FacetGroup::MealType, "Dinner");
    let hits = filter_recipes(&recipes, &filters);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Masoor Dal Tadka");

    let mut filters = FacetFilters::default();
    filters.toggle(FacetGroup::HealthGoal, "Low-Sugar");
    filters.query = "parfait".to_string();
    let hits = filter_recipes(&recipes, &filters);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].recipe_id, "r-002");
}
