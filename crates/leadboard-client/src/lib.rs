// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use leadboard_app::{
    BackendError, CHAT_ENDPOINT, ChatHandle, DEFAULT_BACKEND_URL, LEADS_ENDPOINT, LeadBackend,
    LeadRecord, UserId,
};
use reqwest::StatusCode;
use reqwest::blocking::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("backend.base_url must not be empty");
        }

        let parsed = Url::parse(&base_url)
            .with_context(|| format!("backend.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "backend.base_url {base_url:?} must use http or https, got {}",
                parsed.scheme()
            );
        }
        if config.timeout.is_zero() {
            bail!("backend.timeout must be positive");
        }

        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout: config.timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn list_leads(&self) -> Result<Vec<LeadRecord>, BackendError> {
        let url = format!("{}{LEADS_ENDPOINT}", self.base_url);
        debug!(%url, "fetching leads");

        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|error| self.connection_error(error))?;
        let leads: Vec<LeadRecord> = decode_response(response).inspect_err(|error| {
            warn!(%url, %error, "lead list request failed");
        })?;
        debug!(count = leads.len(), "received leads");
        Ok(leads)
    }

    pub fn resolve_chat_handle(&self, user_id: &UserId) -> Result<ChatHandle, BackendError> {
        let url = format!("{}{CHAT_ENDPOINT}", self.base_url);
        debug!(%url, %user_id, "resolving chat handle");

        let response = self
            .http
            .post(&url)
            .json(&ChatLookupRequest {
                chat_id: user_id.as_str(),
            })
            .send()
            .map_err(|error| self.connection_error(error))?;
        decode_response(response).inspect_err(|error| {
            warn!(%url, %user_id, %error, "chat handle request failed");
        })
    }

    fn connection_error(&self, error: reqwest::Error) -> BackendError {
        let message = if error.is_timeout() {
            format!(
                "{} did not answer within {}s",
                self.base_url,
                self.timeout.as_secs_f32()
            )
        } else {
            format!("{} ({error})", self.base_url)
        };
        warn!(%message, "backend unreachable");
        BackendError::Transport(message)
    }
}

impl LeadBackend for Client {
    fn base_url(&self) -> &str {
        Client::base_url(self)
    }

    fn list_leads(&self) -> Result<Vec<LeadRecord>, BackendError> {
        Client::list_leads(self)
    }

    fn resolve_chat_handle(&self, user_id: &UserId) -> Result<ChatHandle, BackendError> {
        Client::resolve_chat_handle(self, user_id)
    }
}

fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|error| BackendError::Transport(format!("read response body: {error}")))?;

    if !status.is_success() {
        return Err(clean_error_response(status, &body));
    }

    serde_json::from_str(&body).map_err(|error| BackendError::Parse(error.to_string()))
}

fn clean_error_response(status: StatusCode, body: &str) -> BackendError {
    let status = status.as_u16();

    if let Ok(parsed) = serde_json::from_str::<WebhookErrorEnvelope>(body)
        && let Some(message) = parsed.message.or(parsed.error)
        && !message.trim().is_empty()
    {
        return BackendError::Status {
            status,
            detail: Some(message.trim().to_owned()),
        };
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('{') {
        return BackendError::Status {
            status,
            detail: Some(trimmed.to_owned()),
        };
    }

    BackendError::Status {
        status,
        detail: None,
    }
}

#[derive(Debug, Serialize)]
struct ChatLookupRequest<'a> {
    #[serde(rename = "chatId")]
    chat_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct WebhookErrorEnvelope {
    message: Option<String>,
    error: Option<String>,
}
