use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, InputMode, Screen, FILTER_GROUPS};
use crate::dashboard::{progress_rows, MacroTotals};
use crate::models::ChatRole;

/// Turn one line of bot markdown into spans, bolding `**...**` runs. The
/// analysis template only ever emits bold, so single `*` stays literal.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut plain = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '*' || chars.peek() != Some(&'*') {
            plain.push(c);
            continue;
        }
        chars.next(); // second '*' of the opener

        // Scan ahead for the closing `**`
        let mut bold = String::new();
        let mut closed = false;
        while let Some(c) = chars.next() {
            if c == '*' && chars.peek() == Some(&'*') {
                chars.next();
                closed = true;
                break;
            }
            bold.push(c);
        }

        if closed && !bold.is_empty() {
            if !plain.is_empty() {
                spans.push(Span::raw(std::mem::take(&mut plain)));
            }
            spans.push(Span::styled(
                bold,
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else {
            // Unterminated marker, keep it verbatim
            plain.push_str("**");
            plain.push_str(&bold);
        }
    }

    if !plain.is_empty() {
        spans.push(Span::raw(plain));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Signup => render_signup_screen(app, frame, body_area),
        Screen::LogMeal => render_log_meal_screen(app, frame, body_area),
        Screen::Dashboard => render_dashboard_screen(app, frame, body_area),
        Screen::Recipes => render_recipes_screen(app, frame, body_area),
        Screen::Shopping => render_shopping_screen(app, frame, body_area),
        Screen::Profile => render_profile_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let tabs: [(Screen, &str); 5] = [
        (Screen::LogMeal, "1 Log Meal"),
        (Screen::Dashboard, "2 Dashboard"),
        (Screen::Recipes, "3 Recipes"),
        (Screen::Shopping, "4 Shopping"),
        (Screen::Profile, "5 Profile"),
    ];

    let mut spans = vec![Span::styled(
        " BiteBot ",
        Style::default().fg(Color::Green).bold(),
    )];
    if app.session.is_authenticated() {
        for (screen, label) in tabs {
            let style = if app.screen == screen {
                Style::default().fg(Color::Black).bg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(format!(" {} ", label), style));
        }
    } else {
        spans.push(Span::styled(
            " Sign Up ",
            Style::default().fg(Color::Black).bg(Color::Green),
        ));
    }
    spans.push(Span::raw(" "));
    spans.push(Span::styled(
        format!("v{}", env!("CARGO_PKG_VERSION")),
        Style::default().fg(Color::DarkGray),
    ));

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Signup => " SIGN UP ",
        Screen::LogMeal => " LOG MEAL ",
        Screen::Dashboard => " DASHBOARD ",
        Screen::Recipes => " RECIPES ",
        Screen::Shopping => " SHOPPING ",
        Screen::Profile => " PROFILE ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match (app.screen, app.input_mode) {
        (Screen::Signup, InputMode::Normal) => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" field ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" edit ", label_style),
            Span::styled(" s ", key_style),
            Span::styled(" submit ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        (Screen::LogMeal, InputMode::Normal) => {
            if app.show_history_panel {
                vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" nav ", label_style),
                    Span::styled(" Enter ", key_style),
                    Span::styled(" open ", label_style),
                    Span::styled(" d ", key_style),
                    Span::styled(" delete ", label_style),
                    Span::styled(" H ", key_style),
                    Span::styled(" close ", label_style),
                ]
            } else {
                vec![
                    Span::styled(" i ", key_style),
                    Span::styled(" type ", label_style),
                    Span::styled(" j/k ", key_style),
                    Span::styled(" scroll ", label_style),
                    Span::styled(" n ", key_style),
                    Span::styled(" new chat ", label_style),
                    Span::styled(" H ", key_style),
                    Span::styled(" history ", label_style),
                    Span::styled(" q ", key_style),
                    Span::styled(" quit ", label_style),
                ]
            }
        }
        (Screen::LogMeal, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
        (Screen::Dashboard, InputMode::Normal) => vec![
            Span::styled(" h/l ", key_style),
            Span::styled(" day ", label_style),
            Span::styled(" t ", key_style),
            Span::styled(" today ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" meal ", label_style),
            Span::styled(" d ", key_style),
            Span::styled(" delete ", label_style),
            Span::styled(" r ", key_style),
            Span::styled(" refresh ", label_style),
        ],
        (Screen::Recipes, InputMode::Normal) => {
            if app.show_filter_panel {
                vec![
                    Span::styled(" h/l ", key_style),
                    Span::styled(" group ", label_style),
                    Span::styled(" j/k ", key_style),
                    Span::styled(" option ", label_style),
                    Span::styled(" Space ", key_style),
                    Span::styled(" toggle ", label_style),
                    Span::styled(" f ", key_style),
                    Span::styled(" close ", label_style),
                ]
            } else {
                vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" nav ", label_style),
                    Span::styled(" / ", key_style),
                    Span::styled(" search ", label_style),
                    Span::styled(" f ", key_style),
                    Span::styled(" filters ", label_style),
                    Span::styled(" s ", key_style),
                    Span::styled(" save ", label_style),
                    Span::styled(" v ", key_style),
                    Span::styled(" saved only ", label_style),
                    Span::styled(" a ", key_style),
                    Span::styled(" to list ", label_style),
                ]
            }
        }
        (Screen::Recipes, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" done ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ],
        (Screen::Shopping, InputMode::Normal) => vec![
            Span::styled(" a ", key_style),
            Span::styled(" add ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" nav ", label_style),
            Span::styled(" d ", key_style),
            Span::styled(" remove ", label_style),
            Span::styled(" C ", key_style),
            Span::styled(" clear all ", label_style),
            Span::styled(" r ", key_style),
            Span::styled(" refresh ", label_style),
        ],
        (Screen::Shopping, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" add ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ],
        (Screen::Profile, InputMode::Normal) => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" field ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" edit ", label_style),
            Span::styled(" s ", key_style),
            Span::styled(" save ", label_style),
            Span::styled(" r ", key_style),
            Span::styled(" reset ", label_style),
        ],
        (_, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" next ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" done ", label_style),
        ],
    };

    let mut parts = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];
    parts.extend(hints);
    if let Some(status) = &app.status {
        parts.push(Span::styled(
            format!("  {}", status),
            Style::default().bg(Color::Black).fg(Color::Yellow),
        ));
    }

    let footer = Paragraph::new(Line::from(parts)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

// --- signup / profile forms ---

fn render_signup_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [form_area] = Layout::horizontal([Constraint::Max(64)]).areas(area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" Create your BiteBot account ");
    render_form(
        frame,
        form_area,
        block,
        &app.signup_fields,
        app.signup_index,
        app.input_mode,
    );
}

fn render_profile_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [form_area] = Layout::horizontal([Constraint::Max(64)]).areas(area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(" Profile ");
    render_form(
        frame,
        form_area,
        block,
        &app.profile_fields,
        app.profile_index,
        app.input_mode,
    );
}

fn render_form(
    frame: &mut Frame,
    area: Rect,
    block: Block,
    fields: &[crate::app::FormField],
    selected: usize,
    input_mode: InputMode,
) {
    let mut lines: Vec<Line> = vec![Line::default()];
    for (i, field) in fields.iter().enumerate() {
        let marker = if i == selected { "> " } else { "  " };
        let label_style = if i == selected {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        let shown: String = if field.masked {
            "*".repeat(field.value.chars().count())
        } else {
            field.value.clone()
        };
        let value_style = if i == selected && input_mode == InputMode::Editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(marker, label_style),
            Span::styled(format!("{:<16}", field.label), label_style),
            Span::styled(shown, value_style),
        ]));
        lines.push(Line::default());
    }

    let form = Paragraph::new(Text::from(lines)).block(block);
    frame.render_widget(form, area);
}

// --- meal-logging chat ---

fn render_log_meal_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let body = if app.show_history_panel {
        let [history_area, chat_column] =
            Layout::horizontal([Constraint::Length(32), Constraint::Min(0)]).areas(area);
        render_history_panel(app, frame, history_area);
        chat_column
    } else {
        area
    };

    let [chat_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(body);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(format!(" {} ", app.engine.session.title));

    let messages = app.engine.messages();
    let chat_text = if messages.is_empty() {
        Text::from(Span::styled(
            "Enter the path to a photo of your meal to get started...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for msg in messages {
            match msg.role {
                ChatRole::User => {
                    lines.push(Line::from(Span::styled(
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    )));
                    lines.push(Line::from(msg.content.clone()));
                    lines.push(Line::default());
                }
                ChatRole::Bot => {
                    lines.push(Line::from(Span::styled(
                        "BiteBot:",
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    )));
                    if msg.is_loading {
                        // Animated ellipsis: cycles through ".", "..", "..."
                        let dots = ".".repeat((app.animation_frame as usize) + 1);
                        lines.push(Line::from(Span::styled(
                            format!("{}{}", msg.content, dots),
                            Style::default()
                                .fg(Color::DarkGray)
                                .add_modifier(Modifier::ITALIC),
                        )));
                    } else if msg.is_error {
                        for line in msg.content.lines() {
                            lines.push(Line::from(Span::styled(
                                line.to_string(),
                                Style::default().fg(Color::Red),
                            )));
                        }
                    } else {
                        for line in msg.content.lines() {
                            lines.push(parse_markdown_line(line));
                        }
                    }
                    lines.push(Line::default());
                }
            }
        }
        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    render_input_line(
        frame,
        input_area,
        " Message (path to a meal photo to start) ",
        &app.chat_input,
        app.chat_cursor,
        app.input_mode == InputMode::Editing,
    );
}

fn render_history_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Chat History ");

    let items: Vec<ListItem> = app
        .chat_history
        .iter()
        .map(|session| {
            let date = session
                .updated_at
                .or(session.created_at)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::raw(session.title.clone()),
                Span::styled(format!(" {}", date), Style::default().fg(Color::DarkGray)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.history_state);
}

/// Single-line input box with horizontal scrolling to keep the cursor visible.
fn render_input_line(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    value: &str,
    cursor: usize,
    editing: bool,
) {
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title.to_string());

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor >= inner_width {
        cursor - inner_width + 1
    } else {
        0
    };

    let visible_text: String = value.chars().skip(scroll_offset).take(inner_width).collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

// --- dashboard ---

fn render_dashboard_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [progress_area, meals_area] =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(area);

    let day_label = if app.selected_day.is_today() {
        format!(" Today ({}) ", app.selected_day.as_string())
    } else {
        format!(" {} ", app.selected_day.as_string())
    };

    let totals = MacroTotals::sum(&app.day_meals);
    let rows = progress_rows(&totals, &app.targets);

    let progress_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(day_label);
    let inner = progress_block.inner(progress_area);
    frame.render_widget(progress_block, progress_area);

    // One gauge row per nutrient, two lines each
    let constraints: Vec<Constraint> = rows.iter().map(|_| Constraint::Length(2)).collect();
    let gauge_areas = Layout::vertical(constraints).split(inner);

    for (row, gauge_area) in rows.iter().zip(gauge_areas.iter()) {
        if gauge_area.height == 0 {
            continue;
        }
        let percent = row.percent();
        let color = if percent >= 100.0 {
            Color::Red
        } else if percent >= 75.0 {
            Color::Yellow
        } else {
            Color::Green
        };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(color))
            .label(format!(
                "{}: {:.0}/{:.0} {}",
                row.label, row.consumed, row.goal, row.unit
            ))
            .percent(percent as u16);
        let [gauge_line, _] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(*gauge_area);
        frame.render_widget(gauge, gauge_line);
    }

    let meals_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Meals ({}) ", app.day_meals.len()));

    if app.day_meals.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No meals logged for this day.",
            Style::default().fg(Color::DarkGray),
        ))
        .block(meals_block);
        frame.render_widget(empty, meals_area);
        return;
    }

    let items: Vec<ListItem> = app
        .day_meals
        .iter()
        .map(|meal| {
            let kcal = meal.macronutrients.calories.round();
            ListItem::new(Line::from(vec![
                Span::raw(meal.meal_name.clone()),
                Span::styled(
                    format!(" {} kcal", kcal),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(meals_block)
        .highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, meals_area, &mut app.meals_state);
}

// --- recipe browser ---

fn render_recipes_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [search_area, body_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(area);

    render_input_line(
        frame,
        search_area,
        " Search ",
        &app.filters.query,
        app.filters.query.chars().count(),
        app.input_mode == InputMode::Editing,
    );

    let body = if app.show_filter_panel {
        let [filter_area, list_column] =
            Layout::horizontal([Constraint::Length(36), Constraint::Min(0)]).areas(body_area);
        render_filter_panel(app, frame, filter_area);
        list_column
    } else {
        body_area
    };

    let [list_area, detail_area] =
        Layout::horizontal([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(body);

    let visible = app.visible_recipes();
    let mut title = format!(" Recipes ({}) ", visible.len());
    if app.show_favorites_only {
        title = format!(" Saved Recipes ({}) ", visible.len());
    }

    let items: Vec<ListItem> = visible
        .iter()
        .map(|recipe| {
            let star = if app.favorites.contains(&recipe.recipe_id) {
                "* "
            } else {
                "  "
            };
            ListItem::new(Line::from(vec![
                Span::styled(star, Style::default().fg(Color::Yellow)),
                Span::raw(recipe.title.clone()),
            ]))
        })
        .collect();

    let detail_text = detail_lines(app);

    let list_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(title);
    let list = List::new(items)
        .block(list_block)
        .highlight_style(
            Style::default()
                .bg(Color::Green)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, list_area, &mut app.recipes_state);

    let detail_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Details ");
    let detail = Paragraph::new(detail_text)
        .block(detail_block)
        .wrap(Wrap { trim: true });
    frame.render_widget(detail, detail_area);
}

fn detail_lines(app: &App) -> Text<'static> {
    let Some(recipe) = app.selected_recipe() else {
        return Text::from(Span::styled(
            "Select a recipe to see details",
            Style::default().fg(Color::DarkGray),
        ));
    };

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            recipe.title.clone(),
            Style::default().fg(Color::Yellow).bold(),
        )),
        Line::default(),
        Line::from(format!(
            "{} | {} min | ${:.2}/portion",
            recipe.tags.meal_type, recipe.time_minutes, recipe.price_per_portion
        )),
        Line::from(format!(
            "{} kcal | {}g protein | {}g carbs | {}g fat",
            recipe.nutrition.calories.round(),
            recipe.nutrition.protein.round(),
            recipe.nutrition.carbs.round(),
            recipe.nutrition.fat.round()
        )),
        Line::default(),
    ];

    if !recipe.tags.dietary_preferences.is_empty() {
        lines.push(Line::from(format!(
            "Dietary: {}",
            recipe.tags.dietary_preferences.join(", ")
        )));
    }
    let goals: Vec<&str> = recipe
        .tags
        .health_goal
        .iter()
        .map(|g| g.main.as_str())
        .collect();
    if !goals.is_empty() {
        lines.push(Line::from(format!("Health goals: {}", goals.join(", "))));
    }
    if !recipe.tags.cultural.main.is_empty() {
        let cultural = if recipe.tags.cultural.sub.is_empty() {
            recipe.tags.cultural.main.clone()
        } else {
            format!("{} ({})", recipe.tags.cultural.main, recipe.tags.cultural.sub)
        };
        lines.push(Line::from(format!("Cultural: {}", cultural)));
    }
    lines.push(Line::default());

    lines.push(Line::from(Span::styled(
        "Ingredients",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for ingredient in &recipe.ingredients {
        lines.push(Line::from(format!(
            "- {} ({})",
            ingredient.name, ingredient.quantity
        )));
    }
    lines.push(Line::default());

    lines.push(Line::from(Span::styled(
        "Instructions",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for (i, step) in recipe.instructions.iter().enumerate() {
        lines.push(Line::from(format!("{}. {}", i + 1, step)));
    }

    Text::from(lines)
}

fn render_filter_panel(app: &mut App, frame: &mut Frame, area: Rect) {
    let (group_label, group, options) = FILTER_GROUPS[app.filter_group];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(format!(
            " {} [{}/{}] ",
            group_label,
            app.filter_group + 1,
            FILTER_GROUPS.len()
        ));

    let items: Vec<ListItem> = options
        .iter()
        .map(|option| {
            let mark = if app.filters.is_selected(group, option) {
                "[x] "
            } else {
                "[ ] "
            };
            ListItem::new(format!("{}{}", mark, option))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Magenta)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.filter_option_state);
}

// --- shopping list ---

fn render_shopping_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [list_area, input_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(format!(" Shopping List ({}) ", app.shopping_items.len()));

    if app.shopping_items.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "Your shopping list is empty. Press 'a' to add an item.",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block);
        frame.render_widget(empty, list_area);
    } else {
        let items: Vec<ListItem> = app
            .shopping_items
            .iter()
            .map(|item| ListItem::new(format!("- {}", item)))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(Color::Green)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, list_area, &mut app.shopping_state);
    }

    render_input_line(
        frame,
        input_area,
        " Add item ",
        &app.shopping_input,
        app.shopping_cursor,
        app.input_mode == InputMode::Editing,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_runs_become_styled_spans() {
        let line = parse_markdown_line("**Health Tags:** High Protein");
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[0].content, "Health Tags:");
        assert!(line.spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(line.spans[1].content, " High Protein");
    }

    #[test]
    fn unterminated_marker_stays_literal() {
        let line = parse_markdown_line("a **b");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content, "a **b");
    }

    #[test]
    fn plain_text_passes_through() {
        let line = parse_markdown_line("Calories|540 kcal");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].content, "Calories|540 kcal");
    }
}
