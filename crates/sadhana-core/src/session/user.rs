use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserType {
    Guest,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub user_type: UserType,
}

impl CurrentUser {
    /// Guests carry no durable identity.
    pub fn guest() -> Self {
        Self {
            id: "guest".into(),
            username: "Gast".into(),
            display_name: None,
            user_type: UserType::Guest,
        }
    }

    pub fn registered(id: String, username: String, display_name: Option<String>) -> Self {
        Self {
            id,
            username,
            display_name,
            user_type: UserType::User,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.user_type == UserType::User
    }

    /// Name to greet the user with.
    pub fn greeting_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// One chakra's retention result, appended when the user taps out of RETENTION.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionHistoryItem {
    pub chakra: String,
    pub time: u64,
}
