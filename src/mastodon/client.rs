use anyhow::{Context as _, Result};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use std::env;
use std::time::Duration;

use crate::archive::sync::StatusSource;
use crate::mastodon::models::{Account, Context, Status};

const REQUEST_TIMEOUT_SECS: u64 = 45;

/// The four values the archiver needs to talk to an instance. Client id
/// and secret are carried for parity with the registered OAuth app; the
/// calls themselves only use the access token.
#[derive(Debug, Clone)]
pub struct MastodonConfig {
    pub server: String,
    #[allow(dead_code)]
    pub client_id: String,
    #[allow(dead_code)]
    pub client_secret: String,
    pub access_token: String,
}

fn required_env(var: &str) -> Result<String> {
    let value = env::var(var).with_context(|| format!("{var} is required"))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        anyhow::bail!("{var} is required and cannot be empty");
    }
    Ok(trimmed.to_string())
}

fn optional_env(var: &str) -> String {
    env::var(var).map(|v| v.trim().to_string()).unwrap_or_default()
}

impl MastodonConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: required_env("SERVER_ENDPOINT")?,
            client_id: optional_env("OAUTH_CLIENT_ID"),
            client_secret: optional_env("OAUTH_CLIENT_SECRET"),
            access_token: required_env("OAUTH_ACCESS_TOKEN")?,
        })
    }
}

pub struct MastodonClient {
    http: Client,
    config: MastodonConfig,
}

impl MastodonClient {
    pub fn new(config: MastodonConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("building HTTP client")?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.server.trim_end_matches('/'))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.config.access_token)
            .query(query)
            .send()
            .with_context(|| format!("requesting {url}"))?;
        if !response.status().is_success() {
            anyhow::bail!("{url} returned status {}", response.status());
        }
        response
            .json()
            .with_context(|| format!("decoding response from {url}"))
    }
}

impl StatusSource for MastodonClient {
    fn current_account(&self) -> Result<Account> {
        self.get_json(&self.endpoint("/api/v1/accounts/verify_credentials"), &[])
    }

    fn account_statuses(
        &self,
        account_id: &str,
        max_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Status>> {
        let url = self.endpoint(&format!("/api/v1/accounts/{account_id}/statuses"));
        let limit = limit.to_string();
        let mut query = vec![("limit", limit.as_str())];
        if let Some(max_id) = max_id {
            query.push(("max_id", max_id));
        }
        self.get_json(&url, &query)
    }

    fn status_context(&self, status_id: &str) -> Result<Vec<Status>> {
        let url = self.endpoint(&format!("/api/v1/statuses/{status_id}/context"));
        let context: Context = self.get_json(&url, &[])?;
        Ok(context.descendants)
    }
}
