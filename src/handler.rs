use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::Instant;

use crate::api::ApiError;
use crate::app::{App, FormField, InputMode, Screen, FILTER_GROUPS};
use crate::conversation::{Outcome, Step};
use crate::dashboard::SelectedDay;
use crate::models::SignupRequest;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key).await?,
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
            poll_background_tasks(app).await;
        }
    }
    Ok(())
}

/// Initial best-effort data load after startup.
pub async fn bootstrap(app: &mut App) {
    if !app.session.is_authenticated() {
        return;
    }
    // Refresh the cached profile; a 401 here means the stored token is stale.
    match app.api.me().await {
        Ok(profile) => {
            app.session.user_profile = Some(profile);
            let _ = app.session.save();
            app.rebuild_profile_fields();
        }
        Err(ApiError::Unauthorized) => {
            app.logout();
            return;
        }
        Err(err) => app.set_status(err.to_string()),
    }
    load_chat_history(app).await;
}

async fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key).await?,
        InputMode::Editing => handle_editing_mode(app, key).await?,
    }

    Ok(())
}

async fn handle_normal_mode(app: &mut App, key: KeyEvent) -> Result<()> {
    // Screen switching, available everywhere once signed in
    if app.session.is_authenticated() {
        match key.code {
            KeyCode::Char('1') => {
                switch_screen(app, Screen::LogMeal).await;
                return Ok(());
            }
            KeyCode::Char('2') => {
                switch_screen(app, Screen::Dashboard).await;
                return Ok(());
            }
            KeyCode::Char('3') => {
                switch_screen(app, Screen::Recipes).await;
                return Ok(());
            }
            KeyCode::Char('4') => {
                switch_screen(app, Screen::Shopping).await;
                return Ok(());
            }
            KeyCode::Char('5') => {
                switch_screen(app, Screen::Profile).await;
                return Ok(());
            }
            _ => {}
        }
    }

    match app.screen {
        Screen::Signup => handle_signup_normal(app, key).await?,
        Screen::LogMeal => handle_log_meal_normal(app, key).await?,
        Screen::Dashboard => handle_dashboard_normal(app, key).await?,
        Screen::Recipes => handle_recipes_normal(app, key).await?,
        Screen::Shopping => handle_shopping_normal(app, key).await?,
        Screen::Profile => handle_profile_normal(app, key).await?,
    }
    Ok(())
}

/// Load the data a screen shows before presenting it.
pub async fn switch_screen(app: &mut App, screen: Screen) {
    app.screen = screen;
    app.input_mode = InputMode::Normal;
    match screen {
        Screen::Dashboard => load_dashboard(app).await,
        Screen::Recipes => load_recipes(app).await,
        Screen::Shopping => load_shopping_list(app).await,
        Screen::LogMeal => {
            if app.chat_history.is_empty() {
                load_chat_history(app).await;
            }
        }
        Screen::Profile | Screen::Signup => {}
    }
}

fn handle_api_error(app: &mut App, err: ApiError) {
    match err {
        ApiError::Unauthorized => app.logout(),
        other => app.set_status(other.to_string()),
    }
}

// --- signup ---

async fn handle_signup_normal(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => {
            app.signup_index = (app.signup_index + 1) % app.signup_fields.len();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.signup_index = app.signup_index.saturating_sub(1);
        }
        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('s') => submit_signup(app).await,
        _ => {}
    }
    Ok(())
}

async fn submit_signup(app: &mut App) {
    let get = |i: usize| {
        app.signup_fields
            .get(i)
            .map(|f: &FormField| f.value.trim().to_string())
            .unwrap_or_default()
    };
    let request = SignupRequest {
        email: get(0),
        password: get(1),
        age: get(2).parse().unwrap_or(0),
        sex: get(3),
        height: get(4).parse().unwrap_or(0.0),
        weight: get(5).parse().unwrap_or(0.0),
        activity_level: get(6),
        health_goal: get(7),
    };

    if request.email.is_empty() || request.password.is_empty() {
        app.set_status("Email and password are required");
        return;
    }

    match app.api.signup(&request).await {
        Ok(response) => {
            app.session.token = Some(response.token.clone());
            app.api.set_token(Some(response.token));
            if let Err(err) = app.session.save() {
                app.set_status(format!("Could not persist session: {}", err));
            }
            match app.api.me().await {
                Ok(profile) => {
                    app.session.user_profile = Some(profile);
                    let _ = app.session.save();
                    app.rebuild_profile_fields();
                }
                Err(err) => handle_api_error(app, err),
            }
            app.set_status("Welcome to BiteBot!");
            switch_screen(app, Screen::LogMeal).await;
        }
        Err(err) => handle_api_error(app, err),
    }
}

// --- meal-logging chat ---

async fn handle_log_meal_normal(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('i') | KeyCode::Enter if !app.show_history_panel => {
            app.input_mode = InputMode::Editing;
        }
        KeyCode::Char('n') => app.new_chat(),
        KeyCode::Char('H') => {
            app.show_history_panel = !app.show_history_panel;
            if app.show_history_panel
                && app.history_state.selected().is_none()
                && !app.chat_history.is_empty()
            {
                app.history_state.select(Some(0));
            }
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.show_history_panel {
                App::list_nav_down(&mut app.history_state, app.chat_history.len());
            } else {
                app.chat_scroll = app.chat_scroll.saturating_add(1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if app.show_history_panel {
                App::list_nav_up(&mut app.history_state);
            } else {
                app.chat_scroll = app.chat_scroll.saturating_sub(1);
            }
        }
        KeyCode::Enter if app.show_history_panel => {
            app.open_selected_chat();
            app.show_history_panel = false;
        }
        KeyCode::Char('d') if app.show_history_panel => {
            delete_selected_chat(app).await;
        }
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),
        _ => {}
    }
    Ok(())
}

async fn submit_chat_input(app: &mut App) {
    let text = app.chat_input.trim().to_string();
    app.chat_input.clear();
    app.chat_cursor = 0;
    if text.is_empty() {
        return;
    }

    // Before any image is analyzed the input line takes a path to a photo.
    if app.engine.step == Step::Initial {
        start_upload(app, &text);
        return;
    }

    if app.busy() {
        app.set_status("Still working on the previous step...");
        return;
    }

    let outcome = app.engine.handle_user_message(&text);
    persist_chat(app).await;
    app.scroll_chat_to_bottom();

    match outcome {
        Outcome::RunFinalAnalysis => start_final_analysis(app),
        Outcome::FetchRecipes => start_recipe_fetch(app),
        Outcome::OpenDashboard => {
            app.selected_day = SelectedDay::today();
            app.session.selected_dashboard_date = Some(app.selected_day.as_string());
            let _ = app.session.save();
            switch_screen(app, Screen::Dashboard).await;
        }
        _ => {}
    }
}

fn start_upload(app: &mut App, path: &str) {
    if app.uploading {
        return;
    }
    let filename = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());

    app.engine.begin_upload(&filename);
    app.scroll_chat_to_bottom();

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            app.engine.upload_failed(&format!("could not read {}: {}", path, err));
            return;
        }
    };

    app.uploading = true;
    let api = app.api.clone();
    app.analyze_task = Some(tokio::spawn(async move {
        api.analyze_meal(bytes, &filename).await
    }));
}

fn start_final_analysis(app: &mut App) {
    app.engine.begin_final_analysis();
    app.scroll_chat_to_bottom();
    app.analyzing = true;

    let api = app.api.clone();
    let history = app.engine.conversation_history();
    let profile = app.session.user_profile.clone().unwrap_or_default();
    let image_url = app
        .engine
        .analysis
        .as_ref()
        .and_then(|a| a.image_url.clone());
    app.details_task = Some(tokio::spawn(async move {
        api.analyze_details(&history, &profile, image_url.as_deref())
            .await
    }));
}

fn start_recipe_fetch(app: &mut App) {
    let Some(details) = app.engine.details.clone() else {
        app.set_status("No analyzed meal to recommend recipes for");
        return;
    };
    app.engine.begin_recipe_fetch();
    app.scroll_chat_to_bottom();
    app.fetching_recipes = true;

    let api = app.api.clone();
    app.recipes_task = Some(tokio::spawn(async move {
        api.recipe_recommendations(&details).await
    }));
}

/// Check the spawned API calls and feed finished results into the engine.
pub async fn poll_background_tasks(app: &mut App) {
    if let Some(task) = app.analyze_task.take_if(|t| t.is_finished()) {
        app.uploading = false;
        match task.await {
            Ok(Ok(analysis)) => {
                let outcome = app.engine.upload_succeeded(analysis);
                persist_chat(app).await;
                refresh_history_entry(app);
                if outcome == Outcome::RunFinalAnalysis {
                    start_final_analysis(app);
                }
            }
            Ok(Err(ApiError::Unauthorized)) => app.logout(),
            Ok(Err(err)) => {
                app.engine.upload_failed(&err.to_string());
                persist_chat(app).await;
            }
            Err(err) => {
                app.engine.upload_failed(&err.to_string());
                persist_chat(app).await;
            }
        }
        app.scroll_chat_to_bottom();
    }

    if let Some(task) = app.details_task.take_if(|t| t.is_finished()) {
        app.analyzing = false;
        match task.await {
            Ok(Ok(details)) => {
                app.engine.analysis_complete(details.clone());

                app.session.last_analyzed_meal = serde_json::to_value(&details).ok();
                app.session.last_analyzed_meal_name =
                    Some(details.display_name().to_string());
                let _ = app.session.save();

                if app.save_guard.should_save(
                    details.display_name(),
                    details.id.as_deref(),
                    Instant::now(),
                ) {
                    if let Err(err) = app.api.save_meal(&details).await {
                        handle_api_error(app, err);
                    }
                }

                persist_chat(app).await;
                refresh_history_entry(app);
            }
            Ok(Err(ApiError::Unauthorized)) => app.logout(),
            Ok(Err(_)) | Err(_) => {
                app.engine.analysis_failed();
                persist_chat(app).await;
            }
        }
        app.scroll_chat_to_bottom();
    }

    if let Some(task) = app.recipes_task.take_if(|t| t.is_finished()) {
        app.fetching_recipes = false;
        match task.await {
            Ok(Ok(recipes)) => {
                app.engine.recipes_received(&recipes);
                persist_chat(app).await;
            }
            Ok(Err(ApiError::Unauthorized)) => app.logout(),
            Ok(Err(_)) | Err(_) => {
                app.engine.recipes_failed();
                persist_chat(app).await;
            }
        }
        app.scroll_chat_to_bottom();
    }
}

/// Best-effort mirror of the live transcript to the chat-history backend.
/// The local session stays authoritative; failures only surface in the
/// status line.
async fn persist_chat(app: &mut App) {
    let result = if app.engine.session.is_temp() {
        match app.api.create_chat_session(&app.engine.session).await {
            Ok(saved) => {
                if !saved.id.is_empty() {
                    app.engine.session.id = saved.id;
                }
                Ok(())
            }
            Err(err) => Err(err),
        }
    } else {
        app.api
            .update_chat_session(&app.engine.session)
            .await
            .map(|_| ())
    };

    match result {
        Ok(()) => {}
        Err(ApiError::Unauthorized) => app.logout(),
        Err(err) => app.set_status(format!("Chat history sync failed: {}", err)),
    }
}

/// Keep the sidebar copy of the active session up to date.
fn refresh_history_entry(app: &mut App) {
    let session = app.engine.session.clone();
    if let Some(entry) = app.chat_history.iter_mut().find(|c| c.id == session.id) {
        *entry = session;
    } else if !session.is_temp() {
        app.chat_history.insert(0, session);
    }
}

async fn load_chat_history(app: &mut App) {
    match app.api.chat_sessions().await {
        Ok(sessions) => app.chat_history = sessions,
        Err(err) => handle_api_error(app, err),
    }
}

async fn delete_selected_chat(app: &mut App) {
    let Some(i) = app.history_state.selected() else {
        return;
    };
    let Some(session) = app.chat_history.get(i).cloned() else {
        return;
    };
    if !session.is_temp() {
        if let Err(err) = app.api.delete_chat_session(&session.id).await {
            handle_api_error(app, err);
            return;
        }
    }
    app.chat_history.remove(i);
    if app.chat_history.is_empty() {
        app.history_state.select(None);
    } else if i >= app.chat_history.len() {
        app.history_state.select(Some(app.chat_history.len() - 1));
    }
}

// --- dashboard ---

async fn handle_dashboard_normal(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('h') | KeyCode::Left => {
            app.selected_day = app.selected_day.previous();
            store_selected_day(app);
            load_dashboard(app).await;
        }
        KeyCode::Char('l') | KeyCode::Right => {
            app.selected_day = app.selected_day.next();
            store_selected_day(app);
            load_dashboard(app).await;
        }
        KeyCode::Char('t') => {
            app.selected_day = SelectedDay::today();
            store_selected_day(app);
            load_dashboard(app).await;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            App::list_nav_down(&mut app.meals_state, app.day_meals.len());
        }
        KeyCode::Char('k') | KeyCode::Up => App::list_nav_up(&mut app.meals_state),
        KeyCode::Char('r') => load_dashboard(app).await,
        KeyCode::Char('d') => delete_selected_meal(app).await,
        _ => {}
    }
    Ok(())
}

fn store_selected_day(app: &mut App) {
    app.session.selected_dashboard_date = Some(app.selected_day.as_string());
    let _ = app.session.save();
}

async fn load_dashboard(app: &mut App) {
    let date = app.selected_day.as_string();
    match app.api.meals_for_day(&date).await {
        Ok(meals) => {
            app.day_meals = meals;
            if app.day_meals.is_empty() {
                app.meals_state.select(None);
            } else {
                app.meals_state.select(Some(0));
            }
        }
        Err(err) => {
            handle_api_error(app, err);
            return;
        }
    }
    match app.api.calculate_needs().await {
        Ok(targets) => app.targets = targets,
        Err(err) => handle_api_error(app, err),
    }
}

async fn delete_selected_meal(app: &mut App) {
    let Some(meal) = app
        .meals_state
        .selected()
        .and_then(|i| app.day_meals.get(i))
        .cloned()
    else {
        return;
    };
    if meal.id.is_empty() {
        return;
    }
    match app.api.delete_meal(&meal.id).await {
        Ok(()) => load_dashboard(app).await,
        Err(err) => handle_api_error(app, err),
    }
}

// --- recipe browser ---

async fn handle_recipes_normal(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('/') => app.input_mode = InputMode::Editing,
        KeyCode::Char('f') => {
            app.show_filter_panel = !app.show_filter_panel;
            if app.show_filter_panel && app.filter_option_state.selected().is_none() {
                app.filter_option_state.select(Some(0));
            }
        }
        KeyCode::Char('v') => {
            app.show_favorites_only = !app.show_favorites_only;
            app.clamp_recipe_selection();
        }
        KeyCode::Char('h') | KeyCode::Left if app.show_filter_panel => {
            app.filter_group = app.filter_group.saturating_sub(1);
            app.filter_option_state.select(Some(0));
        }
        KeyCode::Char('l') | KeyCode::Right if app.show_filter_panel => {
            app.filter_group = (app.filter_group + 1).min(FILTER_GROUPS.len() - 1);
            app.filter_option_state.select(Some(0));
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.show_filter_panel {
                let len = FILTER_GROUPS[app.filter_group].2.len();
                App::list_nav_down(&mut app.filter_option_state, len);
            } else {
                let len = app.visible_recipes().len();
                App::list_nav_down(&mut app.recipes_state, len);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if app.show_filter_panel {
                App::list_nav_up(&mut app.filter_option_state);
            } else {
                App::list_nav_up(&mut app.recipes_state);
            }
        }
        KeyCode::Char(' ') | KeyCode::Enter if app.show_filter_panel => {
            app.toggle_filter_option();
        }
        KeyCode::Char('s') => toggle_favorite(app).await,
        KeyCode::Char('a') => add_selected_recipe_to_shopping(app).await,
        KeyCode::Char('r') => load_recipes(app).await,
        _ => {}
    }
    Ok(())
}

async fn load_recipes(app: &mut App) {
    match app.api.recipes().await {
        Ok(recipes) => {
            app.recipes = recipes;
            app.clamp_recipe_selection();
            if app.recipes_state.selected().is_none() && !app.recipes.is_empty() {
                app.recipes_state.select(Some(0));
            }
        }
        Err(err) => {
            handle_api_error(app, err);
            return;
        }
    }
    match app.api.saved_recipes().await {
        Ok(saved) => {
            app.favorites = saved.into_iter().map(|r| r.recipe_id).collect();
        }
        Err(err) => handle_api_error(app, err),
    }
}

async fn toggle_favorite(app: &mut App) {
    let Some(recipe) = app.selected_recipe().cloned() else {
        return;
    };
    if app.favorites.contains(&recipe.recipe_id) {
        match app.api.unsave_recipe(&recipe.recipe_id).await {
            Ok(()) => {
                app.favorites.remove(&recipe.recipe_id);
                app.clamp_recipe_selection();
            }
            Err(err) => handle_api_error(app, err),
        }
    } else {
        match app.api.save_recipe(&recipe).await {
            Ok(()) => {
                app.favorites.insert(recipe.recipe_id.clone());
            }
            Err(err) => handle_api_error(app, err),
        }
    }
}

/// Push the selected recipe's ingredient names onto the shopping list.
async fn add_selected_recipe_to_shopping(app: &mut App) {
    let Some(recipe) = app.selected_recipe().cloned() else {
        return;
    };
    if recipe.ingredients.is_empty() {
        return;
    }
    let mut items = app.shopping_items.clone();
    if items.is_empty() {
        // May simply not be loaded yet on this screen
        if let Ok(current) = app.api.shopping_list().await {
            items = current;
        }
    }
    for ingredient in &recipe.ingredients {
        items.push(ingredient.name.clone());
    }
    match app.api.set_shopping_list(&items).await {
        Ok(stored) => {
            app.shopping_items = stored;
            app.set_status(format!("Added {} ingredients to shopping list", recipe.ingredients.len()));
        }
        Err(err) => handle_api_error(app, err),
    }
}

// --- shopping list ---

async fn handle_shopping_normal(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('i') | KeyCode::Char('a') => app.input_mode = InputMode::Editing,
        KeyCode::Char('j') | KeyCode::Down => {
            App::list_nav_down(&mut app.shopping_state, app.shopping_items.len());
        }
        KeyCode::Char('k') | KeyCode::Up => App::list_nav_up(&mut app.shopping_state),
        KeyCode::Char('d') => remove_selected_shopping_item(app).await,
        KeyCode::Char('C') => clear_shopping_list(app).await,
        KeyCode::Char('r') => load_shopping_list(app).await,
        _ => {}
    }
    Ok(())
}

async fn load_shopping_list(app: &mut App) {
    match app.api.shopping_list().await {
        Ok(items) => {
            app.shopping_items = items;
            if app.shopping_items.is_empty() {
                app.shopping_state.select(None);
            } else if app.shopping_state.selected().is_none() {
                app.shopping_state.select(Some(0));
            }
        }
        Err(err) => handle_api_error(app, err),
    }
}

async fn push_shopping_list(app: &mut App, items: Vec<String>) {
    match app.api.set_shopping_list(&items).await {
        Ok(stored) => {
            app.shopping_items = stored;
            if app.shopping_items.is_empty() {
                app.shopping_state.select(None);
            } else {
                let i = app
                    .shopping_state
                    .selected()
                    .unwrap_or(0)
                    .min(app.shopping_items.len() - 1);
                app.shopping_state.select(Some(i));
            }
        }
        Err(err) => handle_api_error(app, err),
    }
}

async fn add_shopping_item(app: &mut App) {
    let item = app.shopping_input.trim().to_string();
    app.shopping_input.clear();
    app.shopping_cursor = 0;
    if item.is_empty() {
        return;
    }
    let mut items = app.shopping_items.clone();
    items.push(item);
    push_shopping_list(app, items).await;
}

/// Entries are identified by position, not value, so duplicates remove
/// independently.
async fn remove_selected_shopping_item(app: &mut App) {
    let Some(i) = app.shopping_state.selected() else {
        return;
    };
    if i >= app.shopping_items.len() {
        return;
    }
    let mut items = app.shopping_items.clone();
    items.remove(i);
    push_shopping_list(app, items).await;
}

async fn clear_shopping_list(app: &mut App) {
    match app.api.clear_shopping_list().await {
        Ok(()) => {
            app.shopping_items.clear();
            app.shopping_state.select(None);
        }
        Err(err) => handle_api_error(app, err),
    }
}

// --- profile ---

async fn handle_profile_normal(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => {
            app.profile_index = (app.profile_index + 1) % app.profile_fields.len();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.profile_index = app.profile_index.saturating_sub(1);
        }
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,
        KeyCode::Char('s') => submit_profile(app).await,
        KeyCode::Char('r') => {
            app.rebuild_profile_fields();
            app.set_status("Profile reset to last saved values");
        }
        _ => {}
    }
    Ok(())
}

async fn submit_profile(app: &mut App) {
    let profile = app.profile_from_fields();
    match app.api.update_profile(&profile).await {
        Ok(saved) => {
            app.session.user_profile = Some(saved);
            let _ = app.session.save();
            app.rebuild_profile_fields();
            app.set_status("Profile updated");
        }
        Err(err) => handle_api_error(app, err),
    }
}

// --- editing mode ---

async fn handle_editing_mode(app: &mut App, key: KeyEvent) -> Result<()> {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            return Ok(());
        }
        KeyCode::Enter => {
            match app.screen {
                Screen::LogMeal => {
                    submit_chat_input(app).await;
                    return Ok(());
                }
                Screen::Shopping => {
                    add_shopping_item(app).await;
                    app.input_mode = InputMode::Normal;
                    return Ok(());
                }
                Screen::Recipes => {
                    app.input_mode = InputMode::Normal;
                    app.clamp_recipe_selection();
                    return Ok(());
                }
                Screen::Signup => {
                    // Enter commits the field and moves on; on the last
                    // field it submits the form.
                    if app.signup_index + 1 < app.signup_fields.len() {
                        app.signup_index += 1;
                    } else {
                        app.input_mode = InputMode::Normal;
                        submit_signup(app).await;
                    }
                    return Ok(());
                }
                Screen::Profile => {
                    if app.profile_index + 1 < app.profile_fields.len() {
                        app.profile_index += 1;
                    } else {
                        app.input_mode = InputMode::Normal;
                    }
                    return Ok(());
                }
                _ => {
                    app.input_mode = InputMode::Normal;
                    return Ok(());
                }
            }
        }
        _ => {}
    }

    let (buffer, cursor) = match app.screen {
        Screen::LogMeal => (&mut app.chat_input, &mut app.chat_cursor),
        Screen::Shopping => (&mut app.shopping_input, &mut app.shopping_cursor),
        Screen::Recipes => {
            // Search edits in place; there is no cursor tracking for the
            // query beyond append/delete at the end.
            match key.code {
                KeyCode::Char(c) => {
                    app.filters.query.push(c);
                    app.clamp_recipe_selection();
                }
                KeyCode::Backspace => {
                    app.filters.query.pop();
                    app.clamp_recipe_selection();
                }
                _ => {}
            }
            return Ok(());
        }
        Screen::Signup => {
            let index = app.signup_index;
            edit_field(&mut app.signup_fields[index], key);
            return Ok(());
        }
        Screen::Profile => {
            let index = app.profile_index;
            edit_field(&mut app.profile_fields[index], key);
            return Ok(());
        }
        Screen::Dashboard => return Ok(()),
    };

    match key.code {
        KeyCode::Char(c) => {
            let byte_idx = char_to_byte_index(buffer, *cursor);
            buffer.insert(byte_idx, c);
            *cursor += 1;
        }
        KeyCode::Backspace => {
            if *cursor > 0 {
                *cursor -= 1;
                let byte_idx = char_to_byte_index(buffer, *cursor);
                buffer.remove(byte_idx);
            }
        }
        KeyCode::Left => *cursor = cursor.saturating_sub(1),
        KeyCode::Right => *cursor = (*cursor + 1).min(buffer.chars().count()),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = buffer.chars().count(),
        _ => {}
    }
    Ok(())
}

fn edit_field(f: &mut FormField, key: KeyEvent) {
    match key.code {
        KeyCode::Char(c) => f.value.push(c),
        KeyCode::Backspace => {
            f.value.pop();
        }
        _ => {}
    }
}
