//! Wire types for the BiteBot backend
//!
//! Everything the backend sends is treated as potentially incomplete: tag and
//! numeric fields default to empty/zero instead of failing deserialization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard `{status, data}` envelope used by the nutrition and chat routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub status: String,
    pub data: T,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub fiber: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthGoalTag {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub sub: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CulturalTag {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub sub: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeTags {
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub health_goal: Vec<HealthGoalTag>,
    #[serde(default)]
    pub cultural: CulturalTag,
    #[serde(default)]
    pub meal_type: String,
    #[serde(default)]
    pub meal_preference: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: String,
}

/// A recipe document as stored in the backend. Immutable from the client's
/// perspective; the saved/favorite flag is tracked separately by recipe_id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub recipe_id: String,
    #[serde(default, alias = "name")]
    pub title: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default, alias = "time_required")]
    pub time_minutes: u32,
    #[serde(default, alias = "approx_price_per_portion")]
    pub price_per_portion: f64,
    #[serde(default)]
    pub nutrition: Nutrition,
    #[serde(default)]
    pub tags: RecipeTags,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

/// The role of a chat message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Bot,
}

/// One entry in a meal-logging transcript. Ordering is insertion order and is
/// significant: the prompt the user is answering is always the latest bot
/// message carrying the matching flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_loading: bool,
    #[serde(default)]
    pub is_question: bool,
    #[serde(default)]
    pub is_recipe_prompt: bool,
    #[serde(default)]
    pub is_analysis: bool,
    #[serde(default)]
    pub is_error: bool,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: unique_message_id(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            is_loading: false,
            is_question: false,
            is_recipe_prompt: false,
            is_analysis: false,
            is_error: false,
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Bot, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }
}

/// Millisecond timestamp plus a counter so two messages created in the same
/// instant still get distinct ids.
pub fn unique_message_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{:04}", Utc::now().timestamp_millis(), n)
}

/// A persisted chat session. Sessions created client-side carry a `temp-`
/// prefixed id until the first successful save promotes them to the
/// server-assigned `_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatSession {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub meal_analysis: Option<Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ChatSession {
    /// True while the session only exists client-side.
    pub fn is_temp(&self) -> bool {
        self.id.starts_with("temp-")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectedIngredient {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub quantity: String,
}

/// One clarifying question from the image analysis. The list is fixed-length
/// once received and answered strictly in order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClarifyingQuestion {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub validation_rules: Vec<String>,
    #[serde(default)]
    pub sub_questions: Vec<String>,
}

/// Response of `POST /nutrition/analyze-meal`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealAnalysis {
    #[serde(default)]
    pub detected_ingredients: Vec<DetectedIngredient>,
    #[serde(default)]
    pub clarifying_questions: Vec<ClarifyingQuestion>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Macronutrients {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fats: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default)]
    pub sugar: f64,
    #[serde(default)]
    pub sodium: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthScores {
    #[serde(default)]
    pub glycemic_index: f64,
    #[serde(default)]
    pub inflammatory: f64,
    #[serde(default)]
    pub heart_health: f64,
    #[serde(default)]
    pub digestive: f64,
    #[serde(default)]
    pub meal_balance: f64,
    #[serde(default)]
    pub micronutrient_balance: f64,
}

/// Response of `POST /nutrition/analyze-details`: the full meal analysis
/// computed from the clarifying conversation and the user's profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisDetails {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub meal_name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub macronutrients: Macronutrients,
    #[serde(default, alias = "health_scores")]
    pub scores: HealthScores,
    #[serde(default)]
    pub health_tags: Vec<String>,
    #[serde(default)]
    pub health_benefits: Vec<String>,
    #[serde(default)]
    pub potential_concerns: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub recommended_recipes: Vec<String>,
}

impl AnalysisDetails {
    /// Display name, never empty.
    pub fn display_name(&self) -> &str {
        if self.meal_name.is_empty() {
            "Analyzed Meal"
        } else {
            &self.meal_name
        }
    }
}

/// A plain `{role, content}` turn as sent to `POST /nutrition/analyze-details`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

/// One recipe in the recipe-recommendations response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendedRecipe {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub benefits: String,
}

/// A meal entry as stored by the backend and returned by
/// `GET /nutrition/meals/{date}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggedMeal {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "name")]
    pub meal_name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default, alias = "macros")]
    pub macronutrients: Macronutrients,
    #[serde(default)]
    pub scores: HealthScores,
    #[serde(default)]
    pub health_tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GramTarget {
    #[serde(default)]
    pub grams: f64,
    #[serde(default)]
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MacroTargets {
    #[serde(default)]
    pub protein: GramTarget,
    #[serde(default)]
    pub carbs: GramTarget,
    #[serde(default)]
    pub fats: GramTarget,
}

/// Response of `GET /nutrition/calculate-needs`: the user's computed daily
/// targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutritionTargets {
    #[serde(default)]
    pub daily_calories: f64,
    #[serde(default)]
    pub macros: MacroTargets,
    #[serde(default)]
    pub fiber: GramTarget,
    #[serde(default)]
    pub sugar: GramTarget,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub activity_level: String,
    #[serde(default)]
    pub health_goal: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub age: u32,
    pub sex: String,
    pub height: f64,
    pub weight: f64,
    pub activity_level: String,
    pub health_goal: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupResponse {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub message: String,
}
