//! Recipe filter engine
//!
//! Pure functions over the in-memory recipe list. Filtering is an unweighted
//! intersection: AND across facet groups, OR within a group's selected
//! options. Recipes with missing or partial tag data are never an error, they
//! just fail to match.

use crate::models::Recipe;

/// Which facet group a selection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetGroup {
    Dietary,
    HealthGoal,
    MealType,
    Cultural,
    Preference,
}

impl FacetGroup {
    /// Maximum simultaneous selections. Meal type, cultural style and meal
    /// preference are single-select.
    pub fn cap(self) -> usize {
        match self {
            FacetGroup::Dietary => 2,
            FacetGroup::HealthGoal => 3,
            FacetGroup::MealType | FacetGroup::Cultural | FacetGroup::Preference => 1,
        }
    }
}

/// Active selections for all five facet groups plus the free-text query.
#[derive(Debug, Clone, Default)]
pub struct FacetFilters {
    pub dietary: Vec<String>,
    pub health: Vec<String>,
    pub meal_type: Vec<String>,
    pub cultural: Vec<String>,
    pub preference: Vec<String>,
    pub query: String,
}

impl FacetFilters {
    pub fn selections(&self, group: FacetGroup) -> &[String] {
        match group {
            FacetGroup::Dietary => &self.dietary,
            FacetGroup::HealthGoal => &self.health,
            FacetGroup::MealType => &self.meal_type,
            FacetGroup::Cultural => &self.cultural,
            FacetGroup::Preference => &self.preference,
        }
    }

    fn selections_mut(&mut self, group: FacetGroup) -> &mut Vec<String> {
        match group {
            FacetGroup::Dietary => &mut self.dietary,
            FacetGroup::HealthGoal => &mut self.health,
            FacetGroup::MealType => &mut self.meal_type,
            FacetGroup::Cultural => &mut self.cultural,
            FacetGroup::Preference => &mut self.preference,
        }
    }

    /// Toggle `option` in `group`. Selecting an already-selected option
    /// removes it. Multi-select groups ignore additions beyond their cap;
    /// single-select groups replace the existing choice.
    pub fn toggle(&mut self, group: FacetGroup, option: &str) {
        let cap = group.cap();
        let selected = self.selections_mut(group);

        if let Some(pos) = selected.iter().position(|s| s == option) {
            selected.remove(pos);
            return;
        }

        if cap == 1 {
            selected.clear();
            selected.push(option.to_string());
        } else if selected.len() < cap {
            selected.push(option.to_string());
        }
        // at cap: no-op
    }

    pub fn is_selected(&self, group: FacetGroup, option: &str) -> bool {
        self.selections(group).iter().any(|s| s == option)
    }

    pub fn is_empty(&self) -> bool {
        self.dietary.is_empty()
            && self.health.is_empty()
            && self.meal_type.is_empty()
            && self.cultural.is_empty()
            && self.preference.is_empty()
            && self.query.is_empty()
    }
}

fn matches_dietary(recipe: &Recipe, selected: &[String]) -> bool {
    if selected.is_empty() {
        return true;
    }
    recipe.tags.dietary_preferences.iter().any(|tag| {
        selected
            .iter()
            .any(|sel| sel.eq_ignore_ascii_case(tag))
    })
}

fn matches_health(recipe: &Recipe, selected: &[String]) -> bool {
    if selected.is_empty() {
        return true;
    }
    recipe
        .tags
        .health_goal
        .iter()
        .any(|goal| selected.iter().any(|sel| sel == &goal.main))
}

fn matches_search(recipe: &Recipe, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let query = query.to_lowercase();
    let tags = &recipe.tags;

    let mut haystack: Vec<&str> = vec![
        &recipe.title,
        &tags.meal_type,
        &tags.cultural.main,
        &tags.cultural.sub,
        &tags.meal_preference,
    ];
    for pref in &tags.dietary_preferences {
        haystack.push(pref);
    }
    for goal in &tags.health_goal {
        for sub in &goal.sub {
            haystack.push(sub);
        }
    }

    haystack
        .iter()
        .any(|field| field.to_lowercase().contains(&query))
}

fn matches_single(tag: &str, selected: &[String]) -> bool {
    if selected.is_empty() {
        return true;
    }
    selected.iter().any(|sel| sel == tag)
}

/// Compute the visible subset of `recipes` under `filters`, preserving the
/// original relative order. Filter order: dietary, health goal, free-text
/// search, meal type, cultural style, meal preference.
pub fn filter_recipes<'a>(recipes: &'a [Recipe], filters: &FacetFilters) -> Vec<&'a Recipe> {
    recipes
        .iter()
        .filter(|r| matches_dietary(r, &filters.dietary))
        .filter(|r| matches_health(r, &filters.health))
        .filter(|r| matches_search(r, &filters.query))
        .filter(|r| matches_single(&r.tags.meal_type, &filters.meal_type))
        .filter(|r| matches_single(&r.tags.cultural.main, &filters.cultural))
        .filter(|r| matches_single(&r.tags.meal_preference, &filters.preference))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CulturalTag, HealthGoalTag, RecipeTags};

    fn recipe(title: &str, tags: RecipeTags) -> Recipe {
        Recipe {
            recipe_id: title.to_lowercase().replace(' ', "-"),
            title: title.to_string(),
            tags,
            ..Default::default()
        }
    }

    fn sample_recipes() -> Vec<Recipe> {
        vec![
            recipe(
                "Lentil Curry",
                RecipeTags {
                    dietary_preferences: vec!["Vegan".to_string(), "Gluten-Free".to_string()],
                    health_goal: vec![HealthGoalTag {
                        main: "Heart Health".to_string(),
                        sub: vec!["Low Sodium".to_string()],
                    }],
                    cultural: CulturalTag {
                        main: "Indian".to_string(),
                        sub: "South Indian".to_string(),
                    },
                    meal_type: "Dinner".to_string(),
                    meal_preference: "Spicy".to_string(),
                },
            ),
            recipe(
                "Greek Salad",
                RecipeTags {
                    dietary_preferences: vec!["Vegetarian".to_string()],
                    health_goal: vec![HealthGoalTag {
                        main: "Weight Loss".to_string(),
                        sub: vec!["Low Calorie".to_string()],
                    }],
                    cultural: CulturalTag {
                        main: "Mediterranean".to_string(),
                        sub: "Greek".to_string(),
                    },
                    meal_type: "Lunch".to_string(),
                    meal_preference: "Fresh".to_string(),
                },
            ),
            recipe("Mystery Meal", RecipeTags::default()),
        ]
    }

    #[test]
    fn empty_filters_return_all_in_order() {
        let recipes = sample_recipes();
        let filters = FacetFilters::default();
        let result = filter_recipes(&recipes, &filters);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].title, "Lentil Curry");
        assert_eq!(result[2].title, "Mystery Meal");
    }

    #[test]
    fn dietary_match_is_case_insensitive() {
        let recipes = sample_recipes();
        let filters = FacetFilters {
            dietary: vec!["vegan".to_string()],
            ..Default::default()
        };
        let result = filter_recipes(&recipes, &filters);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Lentil Curry");
    }

    #[test]
    fn health_goal_matches_on_main_field() {
        let recipes = sample_recipes();
        let filters = FacetFilters {
            health: vec!["Weight Loss".to_string()],
            ..Default::default()
        };
        let result = filter_recipes(&recipes, &filters);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Greek Salad");
    }

    #[test]
    fn search_hits_health_goal_sub_labels() {
        let recipes = sample_recipes();
        let filters = FacetFilters {
            query: "low sodium".to_string(),
            ..Default::default()
        };
        let result = filter_recipes(&recipes, &filters);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Lentil Curry");
    }

    #[test]
    fn search_hits_cultural_sub() {
        let recipes = sample_recipes();
        let filters = FacetFilters {
            query: "greek".to_string(),
            ..Default::default()
        };
        let result = filter_recipes(&recipes, &filters);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Greek Salad");
    }

    #[test]
    fn missing_tags_exclude_from_facets_but_not_search() {
        let recipes = sample_recipes();

        let facet = FacetFilters {
            dietary: vec!["Vegan".to_string()],
            ..Default::default()
        };
        assert!(filter_recipes(&recipes, &facet)
            .iter()
            .all(|r| r.title != "Mystery Meal"));

        let search = FacetFilters {
            query: "mystery".to_string(),
            ..Default::default()
        };
        let result = filter_recipes(&recipes, &search);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Mystery Meal");
    }

    #[test]
    fn groups_intersect() {
        let recipes = sample_recipes();
        let filters = FacetFilters {
            dietary: vec!["Vegan".to_string()],
            meal_type: vec!["Lunch".to_string()],
            ..Default::default()
        };
        assert!(filter_recipes(&recipes, &filters).is_empty());
    }

    #[test]
    fn dietary_cap_makes_third_selection_a_noop() {
        let mut filters = FacetFilters::default();
        filters.toggle(FacetGroup::Dietary, "Vegan");
        filters.toggle(FacetGroup::Dietary, "Keto");
        filters.toggle(FacetGroup::Dietary, "Paleo");
        assert_eq!(filters.dietary, vec!["Vegan", "Keto"]);
    }

    #[test]
    fn health_cap_is_three() {
        let mut filters = FacetFilters::default();
        for goal in ["A", "B", "C", "D"] {
            filters.toggle(FacetGroup::HealthGoal, goal);
        }
        assert_eq!(filters.health, vec!["A", "B", "C"]);
    }

    #[test]
    fn meal_type_replaces_instead_of_adding() {
        let mut filters = FacetFilters::default();
        filters.toggle(FacetGroup::MealType, "Lunch");
        filters.toggle(FacetGroup::MealType, "Dinner");
        assert_eq!(filters.meal_type, vec!["Dinner"]);
    }

    #[test]
    fn toggling_selected_option_removes_it() {
        let mut filters = FacetFilters::default();
        filters.toggle(FacetGroup::Dietary, "Vegan");
        filters.toggle(FacetGroup::Dietary, "Vegan");
        assert!(filters.dietary.is_empty());
        assert!(filters.is_empty());
    }
}
