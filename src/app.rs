use ratatui::widgets::ListState;
use std::collections::HashSet;
use tokio::task::JoinHandle;

use crate::api::{ApiClient, ApiError};
use crate::conversation::{ConversationEngine, SaveGuard};
use crate::dashboard::SelectedDay;
use crate::filters::{FacetFilters, FacetGroup};
use crate::models::{
    AnalysisDetails, ChatSession, LoggedMeal, MealAnalysis, NutritionTargets, Recipe,
    RecommendedRecipe, UserProfile,
};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Signup,
    LogMeal,
    Dashboard,
    Recipes,
    Shopping,
    Profile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// One editable line in the signup/profile forms.
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub masked: bool,
}

impl FormField {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            masked: false,
        }
    }

    pub fn masked(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            masked: true,
        }
    }
}

/// Facet groups in display order with their selectable options.
pub const FILTER_GROUPS: [(&str, FacetGroup, &[&str]); 5] = [
    (
        "Dietary Preferences (up to 2)",
        FacetGroup::Dietary,
        &[
            "Vegetarian",
            "Non-Vegetarian",
            "Vegan",
            "Pescatarian",
            "Lactose-Free",
            "Gluten-Free",
        ],
    ),
    (
        "Health Goals (up to 3)",
        FacetGroup::HealthGoal,
        &[
            "Low-Sugar",
            "High-Protein",
            "Heart-Healthy",
            "Digestive Health",
            "Iron & Folate Rich",
            "Immunity Boosting",
            "Skin & Joint Health",
        ],
    ),
    (
        "Meal Type",
        FacetGroup::MealType,
        &[
            "Breakfast",
            "Snacks/In-Between Meals",
            "Lunch",
            "Desserts/Sweet Treats",
            "Dinner",
        ],
    ),
    ("Cultural Style", FacetGroup::Cultural, &["Authentic", "Fusion"]),
    (
        "Meal Preference",
        FacetGroup::Preference,
        &["Quick-to-Prepare", "Meal-Prep Friendly", "Family-Friendly"],
    ),
];

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub status: Option<String>,
    pub animation_frame: u8,

    // Backend
    pub api: ApiClient,
    pub session: Session,

    // Meal-logging chat
    pub engine: ConversationEngine,
    pub save_guard: SaveGuard,
    pub chat_input: String,
    pub chat_cursor: usize,
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub uploading: bool,
    pub analyzing: bool,
    pub fetching_recipes: bool,
    pub analyze_task: Option<JoinHandle<Result<MealAnalysis, ApiError>>>,
    pub details_task: Option<JoinHandle<Result<AnalysisDetails, ApiError>>>,
    pub recipes_task: Option<JoinHandle<Result<Vec<RecommendedRecipe>, ApiError>>>,

    // Chat history sidebar
    pub chat_history: Vec<ChatSession>,
    pub history_state: ListState,
    pub show_history_panel: bool,

    // Dashboard
    pub selected_day: SelectedDay,
    pub day_meals: Vec<LoggedMeal>,
    pub targets: NutritionTargets,
    pub meals_state: ListState,

    // Recipe browser
    pub recipes: Vec<Recipe>,
    pub filters: FacetFilters,
    pub recipes_state: ListState,
    pub show_filter_panel: bool,
    pub filter_group: usize,
    pub filter_option_state: ListState,
    pub favorites: HashSet<String>,
    pub show_favorites_only: bool,

    // Shopping list
    pub shopping_items: Vec<String>,
    pub shopping_state: ListState,
    pub shopping_input: String,
    pub shopping_cursor: usize,

    // Forms
    pub signup_fields: Vec<FormField>,
    pub signup_index: usize,
    pub profile_fields: Vec<FormField>,
    pub profile_index: usize,
}

impl App {
    pub fn new(api_url: &str) -> anyhow::Result<Self> {
        let session = Session::load()?;
        let mut api = ApiClient::new(api_url);
        api.set_token(session.token.clone());

        let screen = if session.is_authenticated() {
            Screen::LogMeal
        } else {
            Screen::Signup
        };

        let selected_day = SelectedDay::from_stored(session.selected_dashboard_date.as_deref());

        let signup_fields = vec![
            FormField::new("Email"),
            FormField::masked("Password"),
            FormField::new("Age"),
            FormField::new("Sex"),
            FormField::new("Height (cm)"),
            FormField::new("Weight (kg)"),
            FormField::new("Activity Level"),
            FormField::new("Health Goal"),
        ];

        let mut app = Self {
            should_quit: false,
            screen,
            input_mode: InputMode::Normal,
            status: None,
            animation_frame: 0,

            engine: ConversationEngine::with_last_meal(session.last_analyzed_meal.as_ref()),
            api,
            session,

            save_guard: SaveGuard::default(),
            chat_input: String::new(),
            chat_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            uploading: false,
            analyzing: false,
            fetching_recipes: false,
            analyze_task: None,
            details_task: None,
            recipes_task: None,

            chat_history: Vec::new(),
            history_state: ListState::default(),
            show_history_panel: false,

            selected_day,
            day_meals: Vec::new(),
            targets: NutritionTargets::default(),
            meals_state: ListState::default(),

            recipes: Vec::new(),
            filters: FacetFilters::default(),
            recipes_state: ListState::default(),
            show_filter_panel: false,
            filter_group: 0,
            filter_option_state: ListState::default(),
            favorites: HashSet::new(),
            show_favorites_only: false,

            shopping_items: Vec::new(),
            shopping_state: ListState::default(),
            shopping_input: String::new(),
            shopping_cursor: 0,

            signup_fields,
            signup_index: 0,
            profile_fields: Vec::new(),
            profile_index: 0,
        };
        app.rebuild_profile_fields();
        Ok(app)
    }

    /// Clear auth state everywhere. Called on any 401 from the backend.
    pub fn logout(&mut self) {
        self.session.clear_auth();
        let _ = self.session.save();
        self.api.set_token(None);
        self.screen = Screen::Signup;
        self.input_mode = InputMode::Normal;
        self.status = Some("Session expired. Please sign up or log in again.".to_string());
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn tick_animation(&mut self) {
        if self.uploading || self.analyzing || self.fetching_recipes {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn busy(&self) -> bool {
        self.uploading || self.analyzing || self.fetching_recipes
    }

    /// Start a fresh meal-logging chat, keeping the last analyzed meal
    /// available for the recipe prompt.
    pub fn new_chat(&mut self) {
        self.engine =
            ConversationEngine::with_last_meal(self.session.last_analyzed_meal.as_ref());
        self.chat_input.clear();
        self.chat_cursor = 0;
        self.chat_scroll = 0;
    }

    /// Resume the selected history entry as the active chat.
    pub fn open_selected_chat(&mut self) {
        if let Some(i) = self.history_state.selected() {
            if let Some(session) = self.chat_history.get(i).cloned() {
                self.engine = ConversationEngine::from_session(session);
                self.chat_scroll = 0;
                self.scroll_chat_to_bottom();
            }
        }
    }

    // --- profile form ---

    pub fn rebuild_profile_fields(&mut self) {
        let profile = self.session.user_profile.clone().unwrap_or_default();
        self.profile_fields = vec![
            field("Email", profile.email, false),
            field("Age", if profile.age > 0 { profile.age.to_string() } else { String::new() }, false),
            field("Sex", profile.sex, false),
            field("Height (cm)", format_number(profile.height), false),
            field("Weight (kg)", format_number(profile.weight), false),
            field("Activity Level", profile.activity_level, false),
            field("Health Goal", profile.health_goal, false),
        ];
        self.profile_index = 0;
    }

    pub fn profile_from_fields(&self) -> UserProfile {
        parse_profile(&self.profile_fields)
    }

    // --- recipe browser ---

    /// Recipes visible under the current filters, as indices into `recipes`.
    pub fn visible_recipes(&self) -> Vec<&Recipe> {
        let filtered = crate::filters::filter_recipes(&self.recipes, &self.filters);
        if self.show_favorites_only {
            filtered
                .into_iter()
                .filter(|r| self.favorites.contains(&r.recipe_id))
                .collect()
        } else {
            filtered
        }
    }

    pub fn selected_recipe(&self) -> Option<&Recipe> {
        let visible = self.visible_recipes();
        self.recipes_state
            .selected()
            .and_then(move |i| visible.into_iter().nth(i))
    }

    pub fn clamp_recipe_selection(&mut self) {
        let len = self.visible_recipes().len();
        if len == 0 {
            self.recipes_state.select(None);
        } else {
            let i = self.recipes_state.selected().unwrap_or(0).min(len - 1);
            self.recipes_state.select(Some(i));
        }
    }

    pub fn toggle_filter_option(&mut self) {
        let (_, group, options) = FILTER_GROUPS[self.filter_group];
        if let Some(i) = self.filter_option_state.selected() {
            if let Some(option) = options.get(i) {
                self.filters.toggle(group, option);
                self.clamp_recipe_selection();
            }
        }
    }

    // --- list navigation helpers ---

    pub fn list_nav_down(state: &mut ListState, len: usize) {
        if len > 0 {
            let i = state.selected().unwrap_or(0);
            state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn list_nav_up(state: &mut ListState) {
        let i = state.selected().unwrap_or(0);
        state.select(Some(i.saturating_sub(1)));
    }

    /// Scroll the chat so the latest message (and any loading indicator) is
    /// visible.
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            60
        };

        let mut total_lines: u16 = 0;
        for msg in self.engine.messages() {
            total_lines += 1; // sender line
            for line in msg.content.lines() {
                let char_count = line.chars().count();
                if char_count == 0 {
                    total_lines += 1;
                } else {
                    total_lines += ((char_count / wrap_width) + 1) as u16;
                }
            }
            total_lines += 1; // blank line after message
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        if total_lines > visible_height {
            self.chat_scroll = total_lines.saturating_sub(visible_height);
        } else {
            self.chat_scroll = 0;
        }
    }
}

fn field(label: &'static str, value: String, masked: bool) -> FormField {
    FormField {
        label,
        value,
        masked,
    }
}

fn format_number(value: f64) -> String {
    if value == 0.0 {
        String::new()
    } else {
        format!("{}", value)
    }
}

/// Parse the profile form back into a wire profile. Unparseable numbers
/// fall back to zero rather than blocking the save.
fn parse_profile(fields: &[FormField]) -> UserProfile {
    let get = |i: usize| {
        fields
            .get(i)
            .map(|f| f.value.trim().to_string())
            .unwrap_or_default()
    };
    UserProfile {
        email: get(0),
        age: get(1).parse().unwrap_or(0),
        sex: get(2),
        height: get(3).parse().unwrap_or(0.0),
        weight: get(4).parse().unwrap_or(0.0),
        activity_level: get(5),
        health_goal: get(6),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_groups_cover_all_facets() {
        let groups: Vec<FacetGroup> = FILTER_GROUPS.iter().map(|(_, g, _)| *g).collect();
        assert!(groups.contains(&FacetGroup::Dietary));
        assert!(groups.contains(&FacetGroup::HealthGoal));
        assert!(groups.contains(&FacetGroup::MealType));
        assert!(groups.contains(&FacetGroup::Cultural));
        assert!(groups.contains(&FacetGroup::Preference));
    }

    #[test]
    fn profile_fields_parse_back_to_profile() {
        let fields = vec![
            field("Email", "a@b.c".to_string(), false),
            field("Age", " 34 ".to_string(), false),
            field("Sex", "female".to_string(), false),
            field("Height (cm)", "170".to_string(), false),
            field("Weight (kg)", "65.5".to_string(), false),
            field("Activity Level", "moderate".to_string(), false),
            field("Health Goal", "maintain".to_string(), false),
        ];
        let profile = parse_profile(&fields);
        assert_eq!(profile.email, "a@b.c");
        assert_eq!(profile.age, 34);
        assert_eq!(profile.height, 170.0);
        assert_eq!(profile.weight, 65.5);
    }

    #[test]
    fn garbage_numbers_parse_to_zero() {
        let fields = vec![
            field("Email", String::new(), false),
            field("Age", "abc".to_string(), false),
        ];
        let profile = parse_profile(&fields);
        assert_eq!(profile.age, 0);
        assert_eq!(profile.height, 0.0);
    }
}
