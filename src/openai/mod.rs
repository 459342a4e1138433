
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};
use ureq::unversioned::multipart::Form;
use url::Url;

use crate::config::OpenAiConfig;

const EXPONENTIAL_BACKOFF_BASE: u32 = 2;

/// Failures talking to the OpenAI-compatible API.
///
/// Only [`ProviderError::is_retryable`] variants are retried by the client.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("API key environment variable {0} is not set")]
    MissingApiKey(String),
    #[error("Input of ~{tokens} tokens exceeds the provider limit of {limit} tokens")]
    InputTooLong { tokens: usize, limit: usize },
    #[error("Request timed out")]
    Timeout,
    #[error("Rate limited by provider (HTTP 429)")]
    RateLimited,
    #[error("Server error: HTTP {0}")]
    Server(u16),
    #[error("Authentication rejected: HTTP {0}")]
    Unauthorized(u16),
    #[error("Client error: HTTP {0}")]
    BadRequest(u16),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ProviderError {
    /// Timeouts, rate limits, server errors and transport failures may succeed on a later attempt.
    #[inline]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::RateLimited | Self::Server(_) | Self::Transport(_)
        )
    }
}

impl From<ureq::Error> for ProviderError {
    #[inline]
    fn from(error: ureq::Error) -> Self {
        match error {
            ureq::Error::StatusCode(429) => Self::RateLimited,
            ureq::Error::StatusCode(status @ (401 | 403)) => Self::Unauthorized(status),
            ureq::Error::StatusCode(status) if status >= 500 => Self::Server(status),
            ureq::Error::StatusCode(status) => Self::BadRequest(status),
            ureq::Error::Timeout(_) => Self::Timeout,
            ureq::Error::ConnectionFailed | ureq::Error::HostNotFound | ureq::Error::Io(_) => {
                Self::Transport(error.to_string())
            }
            other => Self::InvalidResponse(other.to_string()),
        }
    }
}

/// Blocking client for the OpenAI HTTP API shared by every remote stage.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    base_url: Url,
    api_key: String,
    agent: ureq::Agent,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl OpenAiClient {
    /// Build a client reading the API key from the configured environment variable.
    #[inline]
    pub fn new(config: &OpenAiConfig) -> Result<Self, ProviderError> {
        let api_key = config.api_key()?;
        Self::with_api_key(config, api_key)
    }

    #[inline]
    pub fn with_api_key(
        config: &OpenAiConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            api_key: api_key.into(),
            agent: build_agent(Duration::from_secs(config.timeout_secs)),
            retry_attempts: config.retry_attempts,
            retry_delay: Duration::from_secs(1),
        })
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts.max(1);
        self
    }

    /// Base delay before the first retry; later retries double it.
    #[inline]
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    #[inline]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[inline]
    pub fn endpoint(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ProviderError::InvalidUrl(format!("{}: {}", path, e)))
    }

    /// POST a JSON body and decode a JSON response.
    #[inline]
    pub fn post_json<Req, Resp>(&self, path: &str, request: &Req) -> Result<Resp, ProviderError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let request_json = serde_json::to_string(request)?;

        let response_text = self.execute(&url, || {
            self.agent
                .post(url.as_str())
                .header("Authorization", self.authorization())
                .header("Content-Type", "application/json")
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        serde_json::from_str(&response_text).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse response from {}: {}", url, e))
        })
    }

    /// POST a JSON body and return the raw response bytes, e.g. synthesized audio.
    #[inline]
    pub fn post_json_for_bytes<Req>(&self, path: &str, request: &Req) -> Result<Vec<u8>, ProviderError>
    where
        Req: Serialize,
    {
        let url = self.endpoint(path)?;
        let request_json = serde_json::to_string(request)?;

        self.execute(&url, || {
            self.agent
                .post(url.as_str())
                .header("Authorization", self.authorization())
                .header("Content-Type", "application/json")
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_vec())
        })
    }

    /// POST a multipart form and return the response body as text.
    ///
    /// `build_form` is called once per attempt, since a form is consumed by sending it.
    #[inline]
    pub fn post_multipart<'a, F>(&self, path: &str, build_form: F) -> Result<String, ProviderError>
    where
        F: Fn() -> Result<Form<'a>, ureq::Error>,
    {
        let url = self.endpoint(path)?;

        self.execute(&url, || {
            let form = build_form()?;
            self.agent
                .post(url.as_str())
                .header("Authorization", self.authorization())
                .send(form)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    fn execute<T, F>(&self, url: &Url, mut request_fn: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Result<T, ureq::Error>,
    {
        let mut attempt = 1;

        loop {
            debug!(
                "HTTP request to {} attempt {}/{}",
                url.path(),
                attempt,
                self.retry_attempts
            );

            let error = match request_fn() {
                Ok(response) => return Ok(response),
                Err(error) => ProviderError::from(error),
            };

            if !error.is_retryable() {
                warn!("Non-retryable error from {}: {}", url.path(), error);
                return Err(error);
            }

            if attempt >= self.retry_attempts {
                error!(
                    "All {} attempts failed for request to {}",
                    self.retry_attempts,
                    url.path()
                );
                return Err(error);
            }

            let delay = self.retry_delay * EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1);
            warn!(
                "{}, attempt {}/{}; retrying in {:?}",
                error, attempt, self.retry_attempts, delay
            );
            std::thread::sleep(delay);
            attempt += 1;
        }
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}
