use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::ConversationState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Page-scoped subscriber id assigned by the platform.
    pub id: String,
    pub conversation_state: ConversationState,
    pub first_name: String,
    pub last_name: String,
    pub timezone: Option<f64>,
    pub gender: Option<String>,
    pub building_poll_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn name(&self) -> String {
        let last = self.last_name.trim();
        if last.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, last)
        }
    }
}

/// Profile fields returned by the Graph API user lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub timezone: Option<f64>,
    #[serde(default)]
    pub gender: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> User {
        User {
            id: "1".into(),
            conversation_state: ConversationState::Default,
            first_name: first.into(),
            last_name: last.into(),
            timezone: None,
            gender: None,
            building_poll_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn name_joins_first_and_last() {
        assert_eq!(user("Ada", "Lovelace").name(), "Ada Lovelace");
        assert_eq!(user("Ada", "").name(), "Ada");
    }

    #[test]
    fn profile_tolerates_missing_fields() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"first_name":"Ada","timezone":-7}"#).unwrap();
        assert_eq!(profile.first_name, "Ada");
        assert_eq!(profile.last_name, "");
        assert_eq!(profile.timezone, Some(-7.0));
    }
}
