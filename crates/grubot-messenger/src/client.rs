use std::time::Duration;

use grubot_models::UserProfile;
use reqwest::Client;
use serde::Deserialize;

use crate::send::{SendRequest, SendResponse};
use crate::{MessengerBackend, MessengerError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const PROFILE_FIELDS: &str = "first_name,last_name,locale,timezone,gender";

/// Graph API error envelope: `{"error": {"message": ..., "type": ..., "code": ...}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
    #[serde(default)]
    code: Option<i64>,
}

/// HTTP client for the Send API and user profile lookups.
#[derive(Debug, Clone)]
pub struct GraphClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl GraphClient {
    pub fn new(base_url: &str, access_token: &str) -> Result<Self, MessengerError> {
        let http = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(concat!("Grubot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MessengerError::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, MessengerError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => match envelope.error.code {
                Some(code) => format!("{} (code {code})", envelope.error.message),
                None => envelope.error.message,
            },
            Err(_) => body,
        };
        Err(MessengerError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl MessengerBackend for GraphClient {
    async fn send(&self, request: &SendRequest) -> Result<SendResponse, MessengerError> {
        let url = format!("{}/me/messages", self.base_url);
        let resp = self
            .http
            .post(&url)
            .query(&[("access_token", self.access_token.as_str())])
            .json(request)
            .send()
            .await
            .map_err(|e| MessengerError::Http(e.to_string()))?;
        let resp = Self::check(resp).await?;
        let body: SendResponse = resp
            .json()
            .await
            .map_err(|e| MessengerError::Decode(format!("invalid send response: {e}")))?;
        tracing::debug!(
            recipient_id = request.recipient_id(),
            message_id = body.message_id.as_deref().unwrap_or_default(),
            "delivered"
        );
        Ok(body)
    }

    async fn fetch_profile(&self, user_id: &str) -> Result<UserProfile, MessengerError> {
        let url = format!("{}/{}", self.base_url, user_id);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("fields", PROFILE_FIELDS),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| MessengerError::Http(e.to_string()))?;
        let resp = Self::check(resp).await?;
        resp.json()
            .await
            .map_err(|e| MessengerError::Decode(format!("invalid profile response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = GraphClient::new("https://graph.facebook.com/v2.6/", "token").unwrap();
        assert_eq!(client.base_url(), "https://graph.facebook.com/v2.6");
    }

    #[test]
    fn graph_error_envelope_parses() {
        let body = r#"{"error":{"message":"Invalid OAuth access token.","type":"OAuthException","code":190}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.error.message, "Invalid OAuth access token.");
        assert_eq!(envelope.error.code, Some(190));
    }
}
