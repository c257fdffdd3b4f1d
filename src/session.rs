//! Persistent session state
//!
//! The auth token and a handful of UI facts survive restarts. Stored as JSON
//! next to the config file.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use anyhow::{Result, anyhow};

use crate::models::UserProfile;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Session {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
    #[serde(default)]
    pub last_analyzed_meal: Option<Value>,
    #[serde(default)]
    pub last_analyzed_meal_name: Option<String>,
    /// `YYYY-MM-DD` of the dashboard day the user was last looking at.
    #[serde(default)]
    pub selected_dashboard_date: Option<String>,
}

impl Session {
    /// Load the saved session, or a fresh one if none exists yet. A corrupt
    /// file is treated as empty rather than an error.
    pub fn load() -> Result<Self> {
        let session_path = Self::get_session_path()?;

        if !session_path.exists() {
            return Ok(Self::default());
        }

        let session_content = fs::read_to_string(&session_path)?;
        Ok(serde_json::from_str(&session_content).unwrap_or_default())
    }

    pub fn save(&self) -> Result<()> {
        let session_path = Self::get_session_path()?;

        if let Some(parent) = session_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let session_content = serde_json::to_string_pretty(self)?;
        fs::write(&session_path, session_content)?;
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().map_or(false, |t| !t.is_empty())
    }

    /// Drop the token and profile. Called when the backend answers 401.
    pub fn clear_auth(&mut self) {
        self.token = None;
        self.user_profile = None;
    }

    fn get_session_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("bitebot").join("session.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Session {
        Session {
            token: Some("tok-123".to_string()),
            user_profile: Some(UserProfile {
                email: "a@b.c".to_string(),
                age: 30,
                ..Default::default()
            }),
            last_analyzed_meal: None,
            last_analyzed_meal_name: Some("Grilled Salmon".to_string()),
            selected_dashboard_date: Some("2025-03-14".to_string()),
        }
    }

    #[test]
    fn round_trips_through_json() {
        let session = sample();
        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back.token.as_deref(), Some("tok-123"));
        assert_eq!(back.last_analyzed_meal_name.as_deref(), Some("Grilled Salmon"));
        assert_eq!(back.selected_dashboard_date.as_deref(), Some("2025-03-14"));
    }

    #[test]
    fn empty_json_loads_as_unauthenticated() {
        let session: Session = serde_json::from_str("{}").unwrap();
        assert!(!session.is_authenticated());
        assert!(session.user_profile.is_none());
    }

    #[test]
    fn clear_auth_keeps_dashboard_date() {
        let mut session = sample();
        session.clear_auth();
        assert!(!session.is_authenticated());
        assert!(session.user_profile.is_none());
        assert_eq!(session.selected_dashboard_date.as_deref(), Some("2025-03-14"));
    }

    #[test]
    fn empty_token_is_not_authenticated() {
        let session = Session {
            token: Some(String::new()),
            ..Default::default()
        };
        assert!(!session.is_authenticated());
    }
}
