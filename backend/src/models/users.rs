use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::constants::UNKNOWN_USER_NAME;

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
}

impl UserProfile {
    /// `full_name` when set, otherwise "first last". `None` if neither yields anything.
    pub fn display_name(&self) -> Option<String> {
        if let Some(full) = self.full_name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return Some(full.to_string());
        }

        let joined = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        );
        let joined = joined.trim();
        if joined.is_empty() {
            None
        } else {
            Some(joined.to_string())
        }
    }
}

pub fn display_name_or_unknown(profile: Option<&UserProfile>) -> String {
    profile
        .and_then(UserProfile::display_name)
        .unwrap_or_else(|| UNKNOWN_USER_NAME.to_string())
}
