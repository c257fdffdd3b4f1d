//! HTTP client for the BiteBot backend
//!
//! Thin wrapper over reqwest: one method per endpoint, bearer auth from the
//! stored session token. A 401 from any authenticated route surfaces as
//! `ApiError::Unauthorized` so the caller can clear the session and send the
//! user back to signup.

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::error::Error;
use std::fmt;
use std::time::Duration;

use crate::models::{
    AnalysisDetails, ApiEnvelope, ChatSession, HistoryTurn, LoggedMeal, MealAnalysis,
    NutritionTargets, Recipe, RecommendedRecipe, SignupRequest, SignupResponse, UserProfile,
};

#[derive(Debug)]
pub enum ApiError {
    /// Token missing, expired or revoked. Callers clear the session on this.
    Unauthorized,
    NetworkError(reqwest::Error),
    SerializationError(serde_json::Error),
    ApiError { status: u16, detail: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized => write!(f, "Not authorized. Please sign up or log in again."),
            ApiError::NetworkError(err) => write!(f, "Network error: {}", err),
            ApiError::SerializationError(err) => write!(f, "Serialization error: {}", err),
            ApiError::ApiError { status, detail } => write!(f, "API error {}: {}", status, detail),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ApiError::NetworkError(err) => Some(err),
            ApiError::SerializationError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::NetworkError(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::SerializationError(err)
    }
}

impl ApiError {
    /// True for the transient backend failure the dashboard retries once:
    /// a 5xx whose detail mentions the database connection.
    pub fn is_database_connection_error(&self) -> bool {
        match self {
            ApiError::ApiError { detail, .. } => {
                detail.to_lowercase().contains("database connection")
            }
            _ => false,
        }
    }
}

/// Pull the FastAPI-style `detail` field out of an error body, falling back
/// to the raw text.
fn extract_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str().map(String::from)))
        .unwrap_or_else(|| body.to_string())
}

#[derive(Deserialize)]
struct RecommendationsPayload {
    #[serde(default)]
    recipes: Vec<RecommendedRecipe>,
}

#[derive(Deserialize)]
struct ShoppingListPayload {
    #[serde(default)]
    ingredients: Vec<String>,
}

/// `GET /nutrition/meals/{date}` is the one route that wraps its list in a
/// `meals` field instead of the standard envelope.
#[derive(Deserialize)]
struct MealsPayload {
    #[serde(default)]
    meals: Vec<LoggedMeal>,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Map the response status: 401 becomes `Unauthorized`, any other
    /// non-success becomes `ApiError` with the backend's detail message.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status.as_u16() == 401 {
            return Err(ApiError::Unauthorized);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        Err(ApiError::ApiError {
            status: status.as_u16(),
            detail: extract_detail(&body),
        })
    }

    // --- auth / profile ---

    pub async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, ApiError> {
        let response = self
            .client
            .post(self.url("/auth/signup"))
            .json(request)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        let response = self
            .with_auth(self.client.get(self.url("/auth/me")))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    pub async fn update_profile(&self, profile: &UserProfile) -> Result<UserProfile, ApiError> {
        let response = self
            .with_auth(self.client.put(self.url("/profile/update")))
            .json(profile)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    // --- meal analysis ---

    pub async fn analyze_meal(
        &self,
        image: Vec<u8>,
        filename: &str,
    ) -> Result<MealAnalysis, ApiError> {
        let part = reqwest::multipart::Part::bytes(image).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .with_auth(self.client.post(self.url("/nutrition/analyze-meal")))
            .multipart(form)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let envelope: ApiEnvelope<MealAnalysis> = response.json().await?;
        Ok(envelope.data)
    }

    pub async fn analyze_details(
        &self,
        history: &[HistoryTurn],
        profile: &UserProfile,
        image_url: Option<&str>,
    ) -> Result<AnalysisDetails, ApiError> {
        let body = json!({
            "conversation_history": history,
            "user_profile": profile,
            "image_url": image_url.unwrap_or(""),
        });

        let response = self
            .with_auth(self.client.post(self.url("/nutrition/analyze-details")))
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let envelope: ApiEnvelope<AnalysisDetails> = response.json().await?;
        Ok(envelope.data)
    }

    pub async fn recipe_recommendations(
        &self,
        analysis: &AnalysisDetails,
    ) -> Result<Vec<RecommendedRecipe>, ApiError> {
        let body = json!({
            "meal_name": analysis.meal_name,
            "health_tags": analysis.health_tags,
            "macronutrients": analysis.macronutrients,
        });

        let response = self
            .with_auth(
                self.client
                    .post(self.url("/nutrition/recipe-recommendations")),
            )
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let envelope: ApiEnvelope<RecommendationsPayload> = response.json().await?;
        Ok(envelope.data.recipes)
    }

    // --- logged meals / dashboard ---

    pub async fn save_meal(&self, analysis: &AnalysisDetails) -> Result<LoggedMeal, ApiError> {
        let response = self
            .with_auth(self.client.post(self.url("/nutrition/meals")))
            .json(analysis)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let envelope: ApiEnvelope<LoggedMeal> = response.json().await?;
        Ok(envelope.data)
    }

    /// Meals logged on `date` (`YYYY-MM-DD`). Retries exactly once, after two
    /// seconds, when the backend reports a database connection failure.
    pub async fn meals_for_day(&self, date: &str) -> Result<Vec<LoggedMeal>, ApiError> {
        match self.fetch_meals(date).await {
            Err(err) if err.is_database_connection_error() => {
                tokio::time::sleep(Duration::from_secs(2)).await;
                self.fetch_meals(date).await
            }
            other => other,
        }
    }

    async fn fetch_meals(&self, date: &str) -> Result<Vec<LoggedMeal>, ApiError> {
        let response = self
            .with_auth(self.client.get(self.url(&format!("/nutrition/meals/{}", date))))
            .send()
            .await?;
        let response = Self::check(response).await?;
        let payload: MealsPayload = response.json().await?;
        Ok(payload.meals)
    }

    pub async fn delete_meal(&self, meal_id: &str) -> Result<(), ApiError> {
        let response = self
            .with_auth(
                self.client
                    .delete(self.url(&format!("/nutrition/meals/{}", meal_id))),
            )
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn calculate_needs(&self) -> Result<NutritionTargets, ApiError> {
        let response = self
            .with_auth(self.client.get(self.url("/nutrition/calculate-needs")))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    // --- recipes ---

    pub async fn recipes(&self) -> Result<Vec<Recipe>, ApiError> {
        let response = self
            .with_auth(self.client.get(self.url("/api/recipes")))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    /// Bulk insert, used by the import tool. Returns the number of recipes
    /// the backend accepted.
    pub async fn insert_recipes(&self, recipes: &[Recipe]) -> Result<usize, ApiError> {
        let response = self
            .with_auth(self.client.post(self.url("/api/recipes")))
            .json(recipes)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let body: Value = response.json().await?;
        let inserted = body
            .get("inserted")
            .and_then(Value::as_u64)
            .unwrap_or(recipes.len() as u64);
        Ok(inserted as usize)
    }

    // --- saved recipes ---

    pub async fn saved_recipes(&self) -> Result<Vec<Recipe>, ApiError> {
        let response = self
            .with_auth(self.client.get(self.url("/api/saved/recipes")))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    pub async fn save_recipe(&self, recipe: &Recipe) -> Result<(), ApiError> {
        let response = self
            .with_auth(self.client.post(self.url("/api/saved/recipes")))
            .json(recipe)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn unsave_recipe(&self, recipe_id: &str) -> Result<(), ApiError> {
        let response = self
            .with_auth(
                self.client
                    .delete(self.url(&format!("/api/saved/recipes/{}", recipe_id))),
            )
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    // --- shopping list ---

    pub async fn shopping_list(&self) -> Result<Vec<String>, ApiError> {
        let response = self
            .with_auth(self.client.get(self.url("/api/shopping-list")))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    /// Replace the whole list server-side. Returns the list as stored.
    pub async fn set_shopping_list(&self, ingredients: &[String]) -> Result<Vec<String>, ApiError> {
        let body = json!({ "ingredients": ingredients });
        let response = self
            .with_auth(self.client.post(self.url("/api/shopping-list")))
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let payload: ShoppingListPayload = response.json().await?;
        Ok(payload.ingredients)
    }

    pub async fn clear_shopping_list(&self) -> Result<(), ApiError> {
        let response = self
            .with_auth(self.client.delete(self.url("/api/shopping-list")))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    // --- chat history ---

    pub async fn chat_sessions(&self) -> Result<Vec<ChatSession>, ApiError> {
        let response = self
            .with_auth(self.client.get(self.url("/api/chat/history")))
            .send()
            .await?;
        let response = Self::check(response).await?;
        let envelope: ApiEnvelope<Vec<ChatSession>> = response.json().await?;
        Ok(envelope.data)
    }

    /// Create a new server-side session. The response carries the assigned
    /// `_id` that replaces the client's `temp-` id.
    pub async fn create_chat_session(&self, session: &ChatSession) -> Result<ChatSession, ApiError> {
        let body = json!({
            "title": session.title,
            "messages": session.messages,
            "meal_analysis": session.meal_analysis,
        });
        let response = self
            .with_auth(self.client.post(self.url("/api/chat/history")))
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let envelope: ApiEnvelope<ChatSession> = response.json().await?;
        Ok(envelope.data)
    }

    pub async fn update_chat_session(&self, session: &ChatSession) -> Result<ChatSession, ApiError> {
        let response = self
            .with_auth(
                self.client
                    .put(self.url(&format!("/api/chat/history/{}", session.id))),
            )
            .json(session)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let envelope: ApiEnvelope<ChatSession> = response.json().await?;
        Ok(envelope.data)
    }

    pub async fn delete_chat_session(&self, session_id: &str) -> Result<(), ApiError> {
        let response = self
            .with_auth(
                self.client
                    .delete(self.url(&format!("/api/chat/history/{}", session_id))),
            )
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fastapi_detail_field() {
        let body = r#"{"detail": "Failed to analyze meal: bad image"}"#;
        assert_eq!(extract_detail(body), "Failed to analyze meal: bad image");
    }

    #[test]
    fn falls_back_to_raw_body() {
        assert_eq!(extract_detail("Internal Server Error"), "Internal Server Error");
    }

    #[test]
    fn database_connection_errors_are_retryable() {
        let err = ApiError::ApiError {
            status: 500,
            detail: "Database connection failed".to_string(),
        };
        assert!(err.is_database_connection_error());

        let err = ApiError::ApiError {
            status: 500,
            detail: "something else".to_string(),
        };
        assert!(!err.is_database_connection_error());

        assert!(!ApiError::Unauthorized.is_database_connection_error());
    }

    #[test]
    fn unauthorized_message_points_at_signup() {
        let msg = ApiError::Unauthorized.to_string();
        assert!(msg.contains("sign up"));
    }

    #[test]
    fn chat_history_bodies_are_enveloped() {
        let body = r#"{"status":"success","data":[{"_id":"abc123","title":"Salmon Bowl","messages":[]}]}"#;
        let envelope: ApiEnvelope<Vec<ChatSession>> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.data.len(), 1);
        assert_eq!(envelope.data[0].id, "abc123");
        // the wire shape is a map, not a bare array
        assert!(serde_json::from_str::<Vec<ChatSession>>(body).is_err());
    }

    #[test]
    fn created_session_id_comes_out_of_the_envelope() {
        let body = r#"{"data":{"_id":"srv-42","title":"New Meal Analysis","messages":[]}}"#;
        let envelope: ApiEnvelope<ChatSession> = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.data.id, "srv-42");
        assert!(!envelope.data.is_temp());
    }

    #[test]
    fn meals_by_date_unwraps_the_meals_field() {
        let body = r#"{"meals":[{"id":"m1","meal_name":"Omelette"}]}"#;
        let payload: MealsPayload = serde_json::from_str(body).unwrap();
        assert_eq!(payload.meals.len(), 1);
        assert_eq!(payload.meals[0].meal_name, "Omelette");

        // an enveloped body would not decode
        assert!(serde_json::from_str::<MealsPayload>(r#"[{"id":"m1"}]"#).is_err());
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/api/recipes"), "http://localhost:8000/api/recipes");
    }
}
