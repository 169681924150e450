use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::types::ApiErrorBody;

pub const SAVE_FAILED: &str = "Kon sessie niet opslaan";
pub const STATS_FAILED: &str = "Kon statistieken niet ophalen.";
pub const LOGIN_FAILED: &str = "Inloggen mislukt.";

static URL_USERINFO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-z][a-z0-9+.\-]*://)[^\s/@]+@").expect("valid userinfo pattern")
});

static SECRET_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(password|passwd|pwd|secret|token|api_?key)\s*=\s*[^\s&;,]+")
        .expect("valid secret pattern")
});

/// Strip credentials and connection-string secrets from text shown to users.
pub fn redact(text: &str) -> String {
    let text = URL_USERINFO.replace_all(text, "${1}***@");
    SECRET_PAIR.replace_all(&text, "${1}=***").into_owned()
}

/// Failure talking to one of the collaborator endpoints.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a 4xx/5xx status.
    #[error("server returned {status}: {}", .body.error.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, body: ApiErrorBody },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Message for the user: the server's message when it sent one,
    /// augmented with `[code]` and `(detail)`, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Rejected { body, .. } => body.describe(fallback),
            _ => fallback.to_string(),
        }
    }
}

impl ApiErrorBody {
    pub fn describe(&self, fallback: &str) -> String {
        let mut parts = vec![self
            .error
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(fallback)
            .to_string()];
        if let Some(code) = self.code.as_deref().filter(|c| !c.is_empty()) {
            parts.push(format!("[{code}]"));
        }
        if let Some(detail) = self.detail.as_deref().filter(|d| !d.is_empty()) {
            parts.push(format!("({})", redact(detail)));
        }
        parts.join(" ")
    }
}
