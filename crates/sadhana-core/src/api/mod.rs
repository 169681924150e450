//! HTTP client for the collaborator endpoints.
//!
//! - `POST /api/auth/login`: credentials -> user
//! - `POST /api/sessions`: completed round -> 2xx (body echoed when understood)
//! - `GET  /api/users/me/stats?userId=`: aggregate statistics
//!
//! Every failure is returned as an `ApiError`; the controller turns it into
//! a message for the user. Nothing here retries.

mod error;
mod types;

pub use error::{redact, ApiError, LOGIN_FAILED, SAVE_FAILED, STATS_FAILED};
pub use types::{
    ApiErrorBody, ApiUser, LoginRequest, SaveSessionRequest, SavedRecord, SavedSession,
    SessionId,
};

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::session::CurrentUser;
use crate::stats::UserStats;
use types::{LoginResponse, SaveSessionResponse, StatsResponse};

pub struct ApiClient {
    base_url: Url,
    http_client: Client,
}

impl ApiClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        // Relative joins keep any path prefix of the base.
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url: Url::parse(&base)?,
            http_client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    /// Exchange credentials for a registered user.
    pub async fn login(&self, username: &str, password: &str) -> Result<CurrentUser, ApiError> {
        let url = self.endpoint("api/auth/login")?;
        let resp = self
            .http_client
            .post(url)
            .json(&LoginRequest { username, password })
            .send()
            .await?;
        let body: LoginResponse = read_json(resp).await?;
        debug!(user_id = %body.user.id, "login succeeded");
        Ok(CurrentUser::registered(
            body.user.id,
            body.user.username,
            body.user.display_name,
        ))
    }

    /// Persist a completed round.
    ///
    /// Any 2xx counts as saved. The echoed session is returned when the body
    /// can be read; an unfamiliar or empty body yields `None`.
    pub async fn save_session(
        &self,
        request: &SaveSessionRequest,
    ) -> Result<Option<SavedSession>, ApiError> {
        let url = self.endpoint("api/sessions")?;
        let resp = self.http_client.post(url).json(request).send().await?;
        let bytes = success_body(resp).await?;
        let session = match serde_json::from_slice::<SaveSessionResponse>(&bytes) {
            Ok(body) => body.session,
            Err(err) => {
                debug!(error = %err, "save reply body not understood");
                None
            }
        };
        match session.as_ref().and_then(|s| s.id.as_ref()) {
            Some(id) => debug!(session_id = %id, "session saved"),
            None => debug!("session saved"),
        }
        Ok(session)
    }

    /// Fetch aggregate statistics for a registered user.
    pub async fn fetch_stats(&self, user_id: &str) -> Result<UserStats, ApiError> {
        let mut url = self.endpoint("api/users/me/stats")?;
        url.query_pairs_mut().append_pair("userId", user_id);
        let resp = self.http_client.get(url).send().await?;
        let body: StatsResponse = read_json(resp).await?;
        Ok(body.stats)
    }
}

/// Decode a success body, or turn a 4xx/5xx into `ApiError::Rejected`.
async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let bytes = success_body(resp).await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Raw body of a 2xx reply, or `ApiError::Rejected`.
async fn success_body(resp: Response) -> Result<Vec<u8>, ApiError> {
    let status = resp.status();
    let bytes = resp.bytes().await?;
    if !status.is_success() {
        let body: ApiErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
        warn!(status = status.as_u16(), code = ?body.code, "request rejected");
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            body,
        });
    }
    Ok(bytes.to_vec())
}
