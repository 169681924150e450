//! Wire types of the login, session-save and stats endpoints.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{RetentionHistoryItem, UserType};
use crate::stats::UserStats;

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub user: ApiUser,
}

/// Body of `POST /api/sessions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSessionRequest {
    pub total_duration: u64,
    pub user_type: UserType,
    /// Only sent for registered users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub records: Vec<RetentionHistoryItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRecord {
    pub chakra: String,
    pub seconds: u64,
}

/// Key of a stored session. Backends differ on text or numeric keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionId {
    Text(String),
    Number(u64),
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionId::Text(id) => f.write_str(id),
            SessionId::Number(id) => write!(f, "{id}"),
        }
    }
}

/// Echo of a stored session. Every field is optional: a 2xx status is
/// what marks the save as done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSession {
    #[serde(default)]
    pub id: Option<SessionId>,
    #[serde(default)]
    pub total_duration: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub records: Vec<SavedRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveSessionResponse {
    #[serde(default)]
    pub session: Option<SavedSession>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatsResponse {
    pub stats: UserStats,
}

/// Error payload returned by every endpoint at 4xx/5xx.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_request_omits_user_id() {
        let request = SaveSessionRequest {
            total_duration: 61,
            user_type: UserType::Guest,
            user_id: None,
            records: vec![RetentionHistoryItem {
                chakra: "Wortel (Muladhara)".into(),
                time: 12,
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "totalDuration": 61,
                "userType": "GUEST",
                "records": [{"chakra": "Wortel (Muladhara)", "time": 12}]
            })
        );
    }

    #[test]
    fn saved_session_accepts_numeric_id() {
        let body: SaveSessionResponse =
            serde_json::from_str(r#"{"success":true,"session":{"id":42}}"#).unwrap();
        let session = body.session.unwrap();
        assert_eq!(session.id, Some(SessionId::Number(42)));
        assert_eq!(session.id.unwrap().to_string(), "42");
        assert!(session.records.is_empty());
    }

    #[test]
    fn save_reply_without_session_decodes() {
        let body: SaveSessionResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(body.session.is_none());
    }

    #[test]
    fn user_request_carries_user_id() {
        let request = SaveSessionRequest {
            total_duration: 0,
            user_type: UserType::User,
            user_id: Some("u-1".into()),
            records: Vec::new(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["userType"], "USER");
        assert_eq!(json["userId"], "u-1");
    }
}
