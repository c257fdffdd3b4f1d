//! Formatting of meal analysis results into chat messages
//!
//! The markdown shape here is a wire format: the dashboard and older chat
//! transcripts parse it back, so the header text, section order and table
//! rows must not change.

use crate::models::{AnalysisDetails, RecommendedRecipe};

/// Round to the nearest integer, treating NaN/infinite values as zero.
fn round_or_zero(value: f64) -> i64 {
    if value.is_finite() {
        value.round() as i64
    } else {
        0
    }
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the final analysis into the fixed markdown template: benefits,
/// concerns and suggestions as bullet sections, then the nutrient and score
/// tables in fixed row order.
pub fn analysis_markdown(details: &AnalysisDetails) -> String {
    let health_benefits = bullet_list(&details.health_benefits);
    let potential_concerns = bullet_list(&details.potential_concerns);
    let suggestions = bullet_list(&details.suggestions);
    let health_tags = details.health_tags.join(", ");

    let macros = &details.macronutrients;
    let scores = &details.scores;

    format!(
        "**Meal Analysis**\n\
         \n\
         **Health Benefits:**\n\
         {health_benefits}\n\
         \n\
         **Potential Concerns:**\n\
         {potential_concerns}\n\
         \n\
         **Suggestions for Improvement:**\n\
         {suggestions}\n\
         \n\
         **Health Tags:** {health_tags}\n\
         \n\
         **Nutrient**|**Amount**\n\
         ---|---\n\
         Calories|{calories} kcal\n\
         Protein|{protein}g\n\
         Carbs|{carbs}g\n\
         Fats|{fats}g\n\
         Fiber|{fiber}g\n\
         Sugar|{sugar}g\n\
         Sodium|{sodium}mg\n\
         \n\
         **Metric**|**Score**\n\
         ---|---\n\
         Glycemic Index|{glycemic}%\n\
         Inflammatory Score|{inflammatory}%\n\
         Heart Health|{heart}%\n\
         Digestive Score|{digestive}%\n\
         Meal Balance|{balance}%\n\
         Micronutrient Balance|{micronutrient}%",
        health_benefits = health_benefits,
        potential_concerns = potential_concerns,
        suggestions = suggestions,
        health_tags = health_tags,
        calories = round_or_zero(macros.calories),
        protein = round_or_zero(macros.protein),
        carbs = round_or_zero(macros.carbs),
        fats = round_or_zero(macros.fats),
        fiber = round_or_zero(macros.fiber),
        sugar = round_or_zero(macros.sugar),
        sodium = round_or_zero(macros.sodium),
        glycemic = round_or_zero(scores.glycemic_index),
        inflammatory = round_or_zero(scores.inflammatory),
        heart = round_or_zero(scores.heart_health),
        digestive = round_or_zero(scores.digestive),
        balance = round_or_zero(scores.meal_balance),
        micronutrient = round_or_zero(scores.micronutrient_balance),
    )
}

/// Render the recommended-recipes reply, or an apology when the backend has
/// nothing to suggest.
pub fn recommendations_message(recipes: &[RecommendedRecipe]) -> String {
    if recipes.is_empty() {
        return "Sorry, I don't have any recipe recommendations for this meal at the moment."
            .to_string();
    }

    let mut content = String::from("**Recommended Recipes**\n");
    for recipe in recipes {
        content.push_str(&format!("\n**{}**\n{}\n", recipe.name, recipe.description));
        if !recipe.ingredients.is_empty() {
            content.push_str(&format!("Ingredients: {}\n", recipe.ingredients.join(", ")));
        }
        if !recipe.benefits.is_empty() {
            content.push_str(&format!("Benefits: {}\n", recipe.benefits));
        }
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HealthScores, Macronutrients};

    fn sample_details() -> AnalysisDetails {
        AnalysisDetails {
            meal_name: "Grilled Salmon".to_string(),
            macronutrients: Macronutrients {
                calories: 540.4,
                protein: 42.0,
                carbs: 12.6,
                fats: 31.0,
                fiber: 2.0,
                sugar: 1.0,
                sodium: 480.0,
            },
            scores: HealthScores {
                glycemic_index: 25.0,
                inflammatory: 15.0,
                heart_health: 88.0,
                digestive: 70.0,
                meal_balance: 75.0,
                micronutrient_balance: 80.0,
            },
            health_tags: vec!["High Protein".to_string(), "Omega-3".to_string()],
            health_benefits: vec!["Rich in omega-3 fatty acids".to_string()],
            potential_concerns: vec!["Moderate sodium".to_string()],
            suggestions: vec!["Add a leafy green side".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn renders_fixed_template() {
        let md = analysis_markdown(&sample_details());
        let expected = "**Meal Analysis**\n\n\
            **Health Benefits:**\n\
            - Rich in omega-3 fatty acids\n\n\
            **Potential Concerns:**\n\
            - Moderate sodium\n\n\
            **Suggestions for Improvement:**\n\
            - Add a leafy green side\n\n\
            **Health Tags:** High Protein, Omega-3\n\n\
            **Nutrient**|**Amount**\n\
            ---|---\n\
            Calories|540 kcal\n\
            Protein|42g\n\
            Carbs|13g\n\
            Fats|31g\n\
            Fiber|2g\n\
            Sugar|1g\n\
            Sodium|480mg\n\n\
            **Metric**|**Score**\n\
            ---|---\n\
            Glycemic Index|25%\n\
            Inflammatory Score|15%\n\
            Heart Health|88%\n\
            Digestive Score|70%\n\
            Meal Balance|75%\n\
            Micronutrient Balance|80%";
        assert_eq!(md, expected);
    }

    #[test]
    fn missing_numbers_render_as_zero() {
        let details = AnalysisDetails::default();
        let md = analysis_markdown(&details);
        assert!(md.contains("Calories|0 kcal"));
        assert!(md.contains("Micronutrient Balance|0%"));
    }

    #[test]
    fn nan_rounds_to_zero() {
        assert_eq!(round_or_zero(f64::NAN), 0);
        assert_eq!(round_or_zero(f64::INFINITY), 0);
        assert_eq!(round_or_zero(12.6), 13);
    }

    #[test]
    fn empty_recommendations_get_apology() {
        let msg = recommendations_message(&[]);
        assert!(msg.starts_with("Sorry"));
    }

    #[test]
    fn recommendations_list_names_and_ingredients() {
        let recipes = vec![RecommendedRecipe {
            name: "Quinoa Bowl".to_string(),
            description: "A light grain bowl.".to_string(),
            ingredients: vec!["quinoa".to_string(), "avocado".to_string()],
            benefits: "High fiber".to_string(),
        }];
        let msg = recommendations_message(&recipes);
        assert!(msg.contains("**Quinoa Bowl**"));
        assert!(msg.contains("Ingredients: quinoa, avocado"));
        assert!(msg.contains("Benefits: High fiber"));
    }
}
