//! Dashboard aggregation
//!
//! Sums the day's logged meals client-side and compares the totals against
//! the user's computed daily targets. Day navigation is capped at today.

use chrono::{Duration, Local, NaiveDate};

use crate::models::{LoggedMeal, NutritionTargets};

/// Fallback goals for values the targets endpoint does not provide.
const DEFAULT_SUGAR_GRAMS: f64 = 50.0;
const DEFAULT_SODIUM_MG: f64 = 2300.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub fiber: f64,
    pub sugar: f64,
    pub sodium: f64,
}

impl MacroTotals {
    /// Sum the macros of a day's meals.
    pub fn sum(meals: &[LoggedMeal]) -> Self {
        meals.iter().fold(Self::default(), |mut acc, meal| {
            let m = &meal.macronutrients;
            acc.calories += m.calories;
            acc.protein += m.protein;
            acc.carbs += m.carbs;
            acc.fats += m.fats;
            acc.fiber += m.fiber;
            acc.sugar += m.sugar;
            acc.sodium += m.sodium;
            acc
        })
    }
}

/// One progress row: consumed amount against the daily goal.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRow {
    pub label: &'static str,
    pub unit: &'static str,
    pub consumed: f64,
    pub goal: f64,
}

impl ProgressRow {
    /// Percentage of the goal consumed, capped at 100. A zero goal reads as
    /// zero progress rather than dividing by zero.
    pub fn percent(&self) -> f64 {
        if self.goal <= 0.0 {
            return 0.0;
        }
        (self.consumed / self.goal * 100.0).min(100.0)
    }
}

/// Build the progress rows shown on the dashboard, in fixed display order.
pub fn progress_rows(totals: &MacroTotals, targets: &NutritionTargets) -> Vec<ProgressRow> {
    let sugar_goal = if targets.sugar.grams > 0.0 {
        targets.sugar.grams
    } else {
        DEFAULT_SUGAR_GRAMS
    };
    vec![
        ProgressRow {
            label: "Calories",
            unit: "kcal",
            consumed: totals.calories,
            goal: targets.daily_calories,
        },
        ProgressRow {
            label: "Protein",
            unit: "g",
            consumed: totals.protein,
            goal: targets.macros.protein.grams,
        },
        ProgressRow {
            label: "Carbs",
            unit: "g",
            consumed: totals.carbs,
            goal: targets.macros.carbs.grams,
        },
        ProgressRow {
            label: "Fats",
            unit: "g",
            consumed: totals.fats,
            goal: targets.macros.fats.grams,
        },
        ProgressRow {
            label: "Fiber",
            unit: "g",
            consumed: totals.fiber,
            goal: targets.fiber.grams,
        },
        ProgressRow {
            label: "Sugar",
            unit: "g",
            consumed: totals.sugar,
            goal: sugar_goal,
        },
        ProgressRow {
            label: "Sodium",
            unit: "mg",
            consumed: totals.sodium,
            goal: DEFAULT_SODIUM_MG,
        },
    ]
}

/// The dashboard's selected day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedDay(pub NaiveDate);

impl SelectedDay {
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// Parse a stored `YYYY-MM-DD` string, falling back to today.
    pub fn from_stored(value: Option<&str>) -> Self {
        value
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .map(Self)
            .unwrap_or_else(Self::today)
    }

    pub fn as_string(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    pub fn previous(&self) -> Self {
        Self(self.0 - Duration::days(1))
    }

    /// Move forward one day, but never past today.
    pub fn next(&self) -> Self {
        let next = self.0 + Duration::days(1);
        if next > Local::now().date_naive() {
            *self
        } else {
            Self(next)
        }
    }

    pub fn is_today(&self) -> bool {
        self.0 == Local::now().date_naive()
    }
}
