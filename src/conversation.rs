//! Meal-logging conversation engine
//!
//! Drives the exchange from "image uploaded" through the clarifying
//! questions to the final analysis and the two follow-up prompts. The engine
//! owns the transcript and decides what happens next; it performs no I/O.
//! Callers run the API calls an `Outcome` asks for and feed results back in.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use serde_json::{json, Value};

use crate::analysis::{analysis_markdown, recommendations_message};
use crate::models::{
    AnalysisDetails, ChatMessage, ChatRole, ChatSession, ClarifyingQuestion, HistoryTurn,
    MealAnalysis, RecommendedRecipe,
};

pub const DASHBOARD_PROMPT: &str = "Would you like to view this meal in your dashboard?";
pub const RECIPE_PROMPT: &str = "Would you like to see recommended recipes based on this meal?";
pub const RECIPES_LOADING: &str = "Searching for recipes that match your meal...";

const UPLOAD_LOADING: &str = "Processing your image...";
const CLARIFY_REPROMPT: &str = "I need more specific information. Could you please provide the \
     amount and unit? For example, '2 tablespoons olive oil' or '1 cup rice'.";
const CLOSING_MESSAGE: &str = "No problem! Your meal has been logged. Upload another photo \
     whenever you want to analyze your next meal.";
const ANALYSIS_FAILED: &str =
    "Sorry, I encountered an error while analyzing your meal. Please try again.";
const RECIPES_FAILED: &str =
    "Sorry, I encountered an error while getting recipe recommendations. Please try again later.";

/// Where the conversation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// No image analyzed yet. Upload failures return here for retry.
    Initial,
    /// Clarifying questions being asked in fixed order.
    Conversation,
    /// Final analysis delivered; only the follow-up prompts remain.
    Complete,
}

/// What the caller should do after feeding an event to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing to do beyond persisting the transcript.
    None,
    /// Validation failed; a clarification request was appended.
    Reprompt,
    /// The next clarifying question was appended.
    AskedNext,
    /// Question list exhausted; caller runs the final-analysis request.
    RunFinalAnalysis,
    /// User accepted the dashboard prompt; caller switches screens.
    OpenDashboard,
    /// User accepted the recipe prompt; caller fetches recommendations.
    FetchRecipes,
    /// User declined the recipe prompt; session is now inert.
    Closed,
}

/// True when the reply contains any token from the fixed affirmative list,
/// case-insensitively.
pub fn is_affirmative(reply: &str) -> bool {
    const AFFIRMATIVES: &[&str] = &[
        "yes", "yeah", "sure", "ok", "okay", "yep", "y", "please", "definitely", "absolutely",
    ];
    let reply = reply.to_lowercase();
    AFFIRMATIVES.iter().any(|token| reply.contains(token))
}

/// Validate a free-text answer against the question's category keywords.
/// Matching is on literal substrings, so "2 tablespoons" fails an oil/fat
/// question even though it names a unit. Questions without a recognized
/// category accept anything.
pub fn validate_answer(question: &str, answer: &str) -> bool {
    let question = question.to_lowercase();
    let answer = answer.to_lowercase();

    if question.contains("oil/fat") {
        return answer.contains("tbsp") || answer.contains("tsp") || answer.contains("ml");
    }
    if question.contains("serving size") {
        return answer.contains("cup") || answer.contains("g") || answer.contains("piece");
    }
    if question.contains("cooking method") {
        return answer.contains("fried")
            || answer.contains("baked")
            || answer.contains("boiled")
            || answer.contains("roasted");
    }
    true
}

/// Skips duplicate meal saves: same name within 500ms, or an analysis id
/// that was already written.
#[derive(Debug, Default)]
pub struct SaveGuard {
    last_saved: Option<(String, Instant)>,
    saved_ids: HashSet<String>,
}

impl SaveGuard {
    const WINDOW: Duration = Duration::from_millis(500);

    pub fn should_save(&mut self, meal_name: &str, analysis_id: Option<&str>, now: Instant) -> bool {
        if let Some((name, at)) = &self.last_saved {
            if name == meal_name && now.duration_since(*at) < Self::WINDOW {
                return false;
            }
        }
        if let Some(id) = analysis_id {
            if self.saved_ids.contains(id) {
                return false;
            }
            self.saved_ids.insert(id.to_string());
        }
        self.last_saved = Some((meal_name.to_string(), now));
        true
    }
}

/// One question prompt and the question text its answers are validated
/// against. Sub-questions inherit the parent's validation text.
#[derive(Debug, Clone)]
struct QuestionPrompt {
    prompt: String,
    validation_text: String,
}

fn flatten_questions(questions: &[ClarifyingQuestion]) -> Vec<QuestionPrompt> {
    let mut prompts = Vec::new();
    for q in questions {
        prompts.push(QuestionPrompt {
            prompt: q.question.clone(),
            validation_text: q.question.clone(),
        });
        for sub in &q.sub_questions {
            prompts.push(QuestionPrompt {
                prompt: sub.clone(),
                validation_text: q.question.clone(),
            });
        }
    }
    prompts
}

pub struct ConversationEngine {
    pub step: Step,
    pub session: ChatSession,
    pub analysis: Option<MealAnalysis>,
    pub details: Option<AnalysisDetails>,
    questions: Vec<QuestionPrompt>,
    /// Index into `questions` of the prompt awaiting an answer.
    current: Option<usize>,
    inert: bool,
}

impl ConversationEngine {
    pub fn new() -> Self {
        Self {
            step: Step::Initial,
            session: ChatSession {
                id: format!("temp-{}", chrono::Utc::now().timestamp_millis()),
                title: "New Meal Analysis".to_string(),
                ..Default::default()
            },
            analysis: None,
            details: None,
            questions: Vec::new(),
            current: None,
            inert: false,
        }
    }

    /// Fresh chat that keeps the most recently analyzed meal on hand, so the
    /// recipe prompt still has something to recommend against after a
    /// restart. The transcript starts empty either way.
    pub fn with_last_meal(last_meal: Option<&Value>) -> Self {
        let mut engine = Self::new();
        engine.details = last_meal.and_then(|v| serde_json::from_value(v.clone()).ok());
        engine
    }

    /// Resume a session picked from the history sidebar. Sessions that
    /// already carry an analysis come back as complete; the follow-up
    /// prompts are re-appended if an older save dropped them.
    pub fn from_session(session: ChatSession) -> Self {
        let has_analysis = session.meal_analysis.is_some();
        let mut engine = Self {
            step: if has_analysis {
                Step::Complete
            } else {
                Step::Initial
            },
            session,
            analysis: None,
            details: None,
            questions: Vec::new(),
            current: None,
            inert: false,
        };
        if has_analysis {
            engine.details = engine
                .session
                .meal_analysis
                .clone()
                .and_then(|v| serde_json::from_value(v).ok());
            engine.ensure_prompts();
        }
        engine
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.session.messages
    }

    pub fn current_question(&self) -> Option<&str> {
        self.current
            .and_then(|i| self.questions.get(i))
            .map(|q| q.prompt.as_str())
    }

    fn push(&mut self, message: ChatMessage) {
        self.session.messages.push(message);
    }

    fn remove_loading(&mut self) {
        self.session.messages.retain(|m| !m.is_loading);
    }

    /// Transcript as `{role, content}` turns for the analyze-details call.
    pub fn conversation_history(&self) -> Vec<HistoryTurn> {
        self.session
            .messages
            .iter()
            .map(|m| HistoryTurn {
                role: match m.role {
                    ChatRole::User => "user".to_string(),
                    ChatRole::Bot => "assistant".to_string(),
                },
                content: m.content.clone(),
            })
            .collect()
    }

    // --- upload ---

    /// Record the upload in the transcript and show a loading placeholder.
    pub fn begin_upload(&mut self, filename: &str) {
        self.push(ChatMessage::user(format!("Uploading image: {}", filename)));
        let mut loading = ChatMessage::bot(UPLOAD_LOADING);
        loading.is_loading = true;
        self.push(loading);
    }

    /// Image analysis arrived: summarize the detected ingredients, ask the
    /// first clarifying question. An empty question list goes straight to
    /// final analysis.
    pub fn upload_succeeded(&mut self, analysis: MealAnalysis) -> Outcome {
        self.remove_loading();

        let names: Vec<&str> = analysis
            .detected_ingredients
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        self.push(ChatMessage::bot(format!(
            "I can see several ingredients in your meal! I've detected: {}. \
             Let me ask you a few questions to better understand your meal.",
            names.join(", ")
        )));

        self.questions = flatten_questions(&analysis.clarifying_questions);
        self.analysis = Some(analysis);
        self.step = Step::Conversation;

        if self.questions.is_empty() {
            self.current = None;
            return Outcome::RunFinalAnalysis;
        }

        self.current = Some(0);
        self.ask_current_question();
        Outcome::AskedNext
    }

    /// Upload or analysis call failed; stay in `Initial` so the user can
    /// retry with another image.
    pub fn upload_failed(&mut self, error: &str) {
        self.remove_loading();
        let mut msg = ChatMessage::bot(format!("Failed to analyze your meal: {}", error));
        msg.is_error = true;
        self.push(msg);
        self.step = Step::Initial;
    }

    fn ask_current_question(&mut self) {
        if let Some(prompt) = self.current_question().map(String::from) {
            let mut msg = ChatMessage::bot(prompt);
            msg.is_question = true;
            self.push(msg);
        }
    }

    // --- user replies ---

    /// Append the user's message and work out what it answers: the pending
    /// follow-up prompt, the current clarifying question, or nothing.
    pub fn handle_user_message(&mut self, text: &str) -> Outcome {
        let last_bot = self
            .session
            .messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::Bot)
            .cloned();

        self.push(ChatMessage::user(text));

        if self.inert {
            return Outcome::None;
        }

        if let Some(last) = &last_bot {
            if last.is_recipe_prompt {
                if is_affirmative(text) {
                    return Outcome::FetchRecipes;
                }
                self.push(ChatMessage::bot(CLOSING_MESSAGE));
                self.inert = true;
                return Outcome::Closed;
            }
            if last.content.contains(DASHBOARD_PROMPT) {
                if is_affirmative(text) {
                    return Outcome::OpenDashboard;
                }
                return Outcome::None;
            }
        }

        if self.step == Step::Conversation {
            return self.answer_current_question(text);
        }

        Outcome::None
    }

    fn answer_current_question(&mut self, answer: &str) -> Outcome {
        let Some(index) = self.current else {
            return Outcome::None;
        };

        if !validate_answer(&self.questions[index].validation_text, answer) {
            self.push(ChatMessage::bot(CLARIFY_REPROMPT));
            return Outcome::Reprompt;
        }

        if index + 1 < self.questions.len() {
            self.current = Some(index + 1);
            self.ask_current_question();
            Outcome::AskedNext
        } else {
            self.current = None;
            Outcome::RunFinalAnalysis
        }
    }

    // --- final analysis ---

    /// Show the loading placeholder while the analyze-details call runs.
    pub fn begin_final_analysis(&mut self) {
        let mut loading = ChatMessage::bot("");
        loading.is_loading = true;
        self.push(loading);
    }

    /// Final analysis arrived: append the formatted markdown and the two
    /// follow-up prompts, and stash the details in the session for
    /// persistence.
    pub fn analysis_complete(&mut self, details: AnalysisDetails) {
        self.remove_loading();

        let mut analysis_msg = ChatMessage::bot(analysis_markdown(&details));
        analysis_msg.is_analysis = true;
        self.push(analysis_msg);

        self.push(ChatMessage::bot(DASHBOARD_PROMPT));

        let mut recipe_msg = ChatMessage::bot(RECIPE_PROMPT);
        recipe_msg.is_recipe_prompt = true;
        self.push(recipe_msg);

        self.session.title = details.display_name().to_string();
        self.session.meal_analysis = serde_json::to_value(&details).ok().or(Some(json!({})));
        self.details = Some(details);
        self.step = Step::Complete;
    }

    pub fn analysis_failed(&mut self) {
        self.remove_loading();
        let mut msg = ChatMessage::bot(ANALYSIS_FAILED);
        msg.is_error = true;
        self.push(msg);
    }

    // --- recipe recommendations ---

    pub fn begin_recipe_fetch(&mut self) {
        let mut loading = ChatMessage::bot(RECIPES_LOADING);
        loading.is_loading = true;
        self.push(loading);
    }

    pub fn recipes_received(&mut self, recipes: &[RecommendedRecipe]) {
        self.remove_loading();
        self.push(ChatMessage::bot(recommendations_message(recipes)));
    }

    pub fn recipes_failed(&mut self) {
        self.remove_loading();
        let mut msg = ChatMessage::bot(RECIPES_FAILED);
        msg.is_error = true;
        self.push(msg);
    }

    /// Older saves sometimes lack the follow-up prompts; append any that are
    /// missing so a resumed session still offers them.
    fn ensure_prompts(&mut self) {
        let has_dashboard = self
            .session
            .messages
            .iter()
            .any(|m| m.role == ChatRole::Bot && m.content.contains(DASHBOARD_PROMPT));
        if !has_dashboard {
            self.push(ChatMessage::bot(DASHBOARD_PROMPT));
        }

        let has_recipe = self
            .session
            .messages
            .iter()
            .any(|m| m.role == ChatRole::Bot && m.is_recipe_prompt);
        if !has_recipe {
            let mut msg = ChatMessage::bot(RECIPE_PROMPT);
            msg.is_recipe_prompt = true;
            self.push(msg);
        }
    }
}

impl Default for ConversationEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DetectedIngredient;

    fn question(text: &str) -> ClarifyingQuestion {
        ClarifyingQuestion {
            question: text.to_string(),
            ..Default::default()
        }
    }

    fn analysis_with_questions(questions: Vec<ClarifyingQuestion>) -> MealAnalysis {
        MealAnalysis {
            detected_ingredients: vec![
                DetectedIngredient {
                    name: "salmon".to_string(),
                    ..Default::default()
                },
                DetectedIngredient {
                    name: "rice".to_string(),
                    ..Default::default()
                },
            ],
            clarifying_questions: questions,
            image_url: None,
        }
    }

    fn engine_in_conversation(questions: Vec<ClarifyingQuestion>) -> ConversationEngine {
        let mut engine = ConversationEngine::new();
        engine.begin_upload("meal.jpg");
        engine.upload_succeeded(analysis_with_questions(questions));
        engine
    }

    #[test]
    fn upload_appends_summary_and_first_question() {
        let engine = engine_in_conversation(vec![question("How much oil/fat was used?")]);
        let messages = engine.messages();
        assert!(messages
            .iter()
            .any(|m| m.content.contains("I've detected: salmon, rice")));
        assert!(messages.last().unwrap().is_question);
        assert_eq!(
            engine.current_question(),
            Some("How much oil/fat was used?")
        );
        assert_eq!(engine.step, Step::Conversation);
        assert!(!messages.iter().any(|m| m.is_loading));
    }

    #[test]
    fn upload_failure_stays_initial() {
        let mut engine = ConversationEngine::new();
        engine.begin_upload("meal.jpg");
        engine.upload_failed("Failed to analyze meal: bad image");
        assert_eq!(engine.step, Step::Initial);
        assert!(engine.messages().last().unwrap().is_error);
        assert!(!engine.messages().iter().any(|m| m.is_loading));
    }

    #[test]
    fn empty_question_list_goes_straight_to_analysis() {
        let mut engine = ConversationEngine::new();
        engine.begin_upload("meal.jpg");
        let outcome = engine.upload_succeeded(analysis_with_questions(vec![]));
        assert_eq!(outcome, Outcome::RunFinalAnalysis);
    }

    #[test]
    fn invalid_answer_keeps_current_question() {
        let mut engine = engine_in_conversation(vec![
            question("What was the serving size?"),
            question("How much oil/fat was used?"),
            question("Anything else?"),
        ]);
        assert_eq!(engine.handle_user_message("1 cup"), Outcome::AskedNext);

        // "2 tablespoons" does not contain the literal "tbsp"
        let before = engine.messages().len();
        let outcome = engine.handle_user_message("2 tablespoons");
        assert_eq!(outcome, Outcome::Reprompt);
        assert_eq!(
            engine.current_question(),
            Some("How much oil/fat was used?")
        );
        // user message plus reprompt, no new question
        assert_eq!(engine.messages().len(), before + 2);
        assert!(!engine.messages().last().unwrap().is_question);

        assert_eq!(engine.handle_user_message("2 tbsp"), Outcome::AskedNext);
        assert_eq!(engine.current_question(), Some("Anything else?"));
    }

    #[test]
    fn last_valid_answer_triggers_exactly_one_analysis() {
        let mut engine = engine_in_conversation(vec![question("How was it cooked? (cooking method)")]);
        assert_eq!(engine.handle_user_message("baked"), Outcome::RunFinalAnalysis);
        // a second send while the analysis is pending does not re-trigger
        assert_eq!(engine.handle_user_message("baked"), Outcome::None);
    }

    #[test]
    fn sub_questions_follow_their_parent() {
        let mut q = question("What was the serving size?");
        q.sub_questions = vec!["And of the rice?".to_string()];
        let mut engine = engine_in_conversation(vec![q, question("Done?")]);

        assert_eq!(engine.handle_user_message("1 cup"), Outcome::AskedNext);
        assert_eq!(engine.current_question(), Some("And of the rice?"));
        // sub-question answers validate against the parent question
        assert_eq!(engine.handle_user_message("a lot"), Outcome::Reprompt);
        assert_eq!(engine.handle_user_message("half a cup"), Outcome::AskedNext);
        assert_eq!(engine.current_question(), Some("Done?"));
    }

    #[test]
    fn full_flow_through_prompts() {
        let mut engine = engine_in_conversation(vec![question("How much oil?")]);
        assert_eq!(engine.handle_user_message("1 tbsp"), Outcome::RunFinalAnalysis);

        engine.begin_final_analysis();
        engine.analysis_complete(AnalysisDetails {
            meal_name: "Salmon Bowl".to_string(),
            ..Default::default()
        });
        assert_eq!(engine.step, Step::Complete);
        assert_eq!(engine.session.title, "Salmon Bowl");

        let tail: Vec<&str> = engine
            .messages()
            .iter()
            .rev()
            .take(3)
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(tail[0], RECIPE_PROMPT);
        assert_eq!(tail[1], DASHBOARD_PROMPT);
        assert!(tail[2].starts_with("**Meal Analysis**"));

        // affirmative to the recipe prompt (the latest bot message)
        assert_eq!(engine.handle_user_message("yes"), Outcome::FetchRecipes);
        engine.begin_recipe_fetch();
        engine.recipes_received(&[RecommendedRecipe {
            name: "Quinoa Bowl".to_string(),
            ..Default::default()
        }]);
        assert!(engine
            .messages()
            .last()
            .unwrap()
            .content
            .contains("Quinoa Bowl"));
    }

    #[test]
    fn declining_recipes_closes_the_session() {
        let mut engine = engine_in_conversation(vec![question("How much oil?")]);
        engine.handle_user_message("1 tsp");
        engine.analysis_complete(AnalysisDetails::default());

        assert_eq!(engine.handle_user_message("no thanks"), Outcome::Closed);
        assert!(engine
            .messages()
            .last()
            .unwrap()
            .content
            .starts_with("No problem"));
        // inert: further messages append but trigger nothing
        assert_eq!(engine.handle_user_message("yes"), Outcome::None);
    }

    #[test]
    fn dashboard_prompt_accepts_affirmatives() {
        let mut engine = ConversationEngine::new();
        engine.push(ChatMessage::bot(DASHBOARD_PROMPT));
        assert_eq!(engine.handle_user_message("Sure!"), Outcome::OpenDashboard);

        let mut engine = ConversationEngine::new();
        engine.push(ChatMessage::bot(DASHBOARD_PROMPT));
        assert_eq!(engine.handle_user_message("no"), Outcome::None);
    }

    #[test]
    fn affirmative_list_is_case_insensitive() {
        for reply in ["YES", "Yeah", "ok", "absolutely", "yes please"] {
            assert!(is_affirmative(reply), "{reply}");
        }
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative("nope"));
    }

    #[test]
    fn validators_match_literal_substrings() {
        assert!(validate_answer("How much oil/fat?", "1 tbsp"));
        assert!(validate_answer("How much oil/fat?", "10 ML olive oil"));
        assert!(!validate_answer("How much oil/fat?", "2 tablespoons"));
        assert!(validate_answer("What serving size?", "2 cups"));
        assert!(validate_answer("What cooking method?", "pan fried"));
        assert!(!validate_answer("What cooking method?", "grilled"));
        assert!(validate_answer("Any sauce?", "just ketchup"));
    }

    #[test]
    fn save_guard_blocks_rapid_duplicates() {
        let mut guard = SaveGuard::default();
        let t0 = Instant::now();
        assert!(guard.should_save("Salmon Bowl", Some("a1"), t0));
        assert!(!guard.should_save("Salmon Bowl", Some("a2"), t0 + Duration::from_millis(100)));
        // different name inside the window is fine
        assert!(guard.should_save("Omelette", Some("a3"), t0 + Duration::from_millis(100)));
        // same name after the window is fine, but a known id is not
        assert!(guard.should_save("Salmon Bowl", None, t0 + Duration::from_secs(1)));
        assert!(!guard.should_save("Salmon Bowl", Some("a1"), t0 + Duration::from_secs(2)));
    }

    #[test]
    fn fresh_chat_restores_the_last_analyzed_meal() {
        let stored = json!({"meal_name": "Salmon Bowl"});
        let engine = ConversationEngine::with_last_meal(Some(&stored));
        assert_eq!(engine.step, Step::Initial);
        assert!(engine.messages().is_empty());
        assert_eq!(
            engine.details.as_ref().map(|d| d.meal_name.as_str()),
            Some("Salmon Bowl")
        );

        let engine = ConversationEngine::with_last_meal(None);
        assert!(engine.details.is_none());
    }

    #[test]
    fn new_sessions_carry_temp_ids() {
        let engine = ConversationEngine::new();
        assert!(engine.session.is_temp());
        assert_eq!(engine.session.title, "New Meal Analysis");
    }

    #[test]
    fn resumed_session_regains_missing_prompts() {
        let session = ChatSession {
            id: "abc123".to_string(),
            title: "Salmon Bowl".to_string(),
            messages: vec![ChatMessage::bot("**Meal Analysis**")],
            meal_analysis: Some(json!({"meal_name": "Salmon Bowl"})),
            ..Default::default()
        };
        let engine = ConversationEngine::from_session(session);
        assert_eq!(engine.step, Step::Complete);
        assert!(engine
            .messages()
            .iter()
            .any(|m| m.content.contains(DASHBOARD_PROMPT)));
        assert!(engine.messages().iter().any(|m| m.is_recipe_prompt));
    }
}
