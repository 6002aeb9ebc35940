//! Authenticated StackPath API client
//!
//! Exchanges an API client ID and secret for a bearer token once, then sends
//! every request with that token and a fixed user agent. The token is never
//! refreshed, so one client lives for one demo run.

use crate::error::{Result, StackPathError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://gateway.stackpath.com";
pub const DEFAULT_USER_AGENT: &str = concat!("edgedemo/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings needed to reach and authenticate against the API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    /// Limit on a whole request, from connecting to reading the body
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// StackPath API client
///
/// Cheap to share behind an `Arc`; nothing in it changes after
/// authentication.
#[derive(Debug, Clone)]
pub struct StackPathClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl StackPathClient {
    /// Authenticate with the client credentials grant
    ///
    /// See: https://stackpath.dev/reference/authentication#getaccesstoken
    pub async fn authenticate(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        let base_url = normalize_base_url(&config.base_url);

        let request = TokenRequest {
            grant_type: "client_credentials",
            client_id: &config.client_id,
            client_secret: &config.client_secret,
        };

        tracing::debug!("Requesting access token from {}", base_url);
        let response = http
            .post(format!("{}/identity/v1/oauth2/token", base_url))
            .json(&request)
            .send()
            .await?;
        let body = check_status(response).await?.text().await?;
        let token: TokenResponse = serde_json::from_str(&body)?;

        if token.access_token.is_empty() {
            return Err(StackPathError::AuthenticationFailed(
                "the token endpoint returned an empty access token".to_string(),
            ));
        }

        Ok(Self {
            http,
            base_url,
            access_token: token.access_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let body = self.get_text(path, query).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) async fn get_text(&self, path: &str, query: &[(&str, String)]) -> Result<String> {
        tracing::debug!("GET {}", path);
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;

        Ok(check_status(response).await?.text().await?)
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.post(path, body).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// POST and return the raw response body
    pub(crate) async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String> {
        tracing::debug!("POST {}", path);
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;

        Ok(check_status(response).await?.text().await?)
    }
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Treat every status of 300 and above as an error carrying the body
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.as_u16() >= 300 {
        let body = response.text().await.unwrap_or_default();
        return Err(StackPathError::Api { status, body });
    }
    Ok(response)
}

/// Timestamp format the API accepts in query strings
pub(crate) fn query_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The `{ "results": [...] }` envelope of list endpoints
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct ResultsPage<T> {
    #[serde(default)]
    pub results: Vec<T>,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
}
