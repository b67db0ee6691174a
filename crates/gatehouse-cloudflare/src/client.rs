//! Cloudflare API client
//!
//! Every response is wrapped in the v4 envelope
//! `{ success, errors[], messages[], result }`.

use crate::error::{CloudflareError, Result};
use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::OnceCell;

pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Overrides the API base URL
pub const API_BASE_ENV: &str = "CLOUDFLARE_API_BASE";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// API base URL, honoring `CLOUDFLARE_API_BASE`
pub fn default_base_url() -> String {
    std::env::var(API_BASE_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| CLOUDFLARE_API_BASE.to_string())
}

/// Authenticated Cloudflare API client
///
/// One instance is used per run. The resolved account id is cached on the
/// instance after the first lookup.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    pub(crate) account_id: OnceCell<String>,
}

impl ApiClient {
    /// Create a client against the default API base URL
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(token, default_base_url())
    }

    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            account_id: OnceCell::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The bearer token this client authenticates with
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Account id, if it was already resolved during this run
    pub fn cached_account_id(&self) -> Option<&str> {
        self.account_id.get().map(String::as_str)
    }

    /// Send a request and unwrap the response envelope
    ///
    /// `path` is relative to the base URL and may carry a query string.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        let context = format!("{} {}", method, strip_query(path));
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Cloudflare API request: {}", context);

        let mut request = self.http.request(method, &url).bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        tracing::debug!(status = status.as_u16(), "Cloudflare API response: {}", context);

        let envelope: ApiResponse<T> =
            serde_json::from_str(&text).map_err(|e| CloudflareError::InvalidResponse {
                context: context.clone(),
                message: format!("HTTP {}: {}", status.as_u16(), e),
            })?;
        envelope.into_result(&context, status.as_u16())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        self.request(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::DELETE, path, None).await
    }
}

fn strip_query(path: &str) -> &str {
    path.split_once('?').map(|(p, _)| p).unwrap_or(path)
}

// ============ API Types ============

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    #[serde(default)]
    messages: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

impl<T: DeserializeOwned> ApiResponse<T> {
    fn into_result(self, context: &str, status: u16) -> Result<T> {
        for message in &self.messages {
            tracing::debug!(code = message.code, "Cloudflare API message: {}", message.message);
        }

        if !self.success {
            let message = if self.errors.is_empty() {
                "unknown error".to_string()
            } else {
                self.errors
                    .iter()
                    .map(|e| format!("{} (code {})", e.message, e.code))
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            return Err(CloudflareError::RemoteApi {
                context: context.to_string(),
                status,
                message,
            });
        }

        match self.result {
            Some(result) => Ok(result),
            // `null` is acceptable for callers that ignore the result
            None => serde_json::from_value(Value::Null).map_err(|_| {
                CloudflareError::InvalidResponse {
                    context: context.to_string(),
                    message: "missing result".to_string(),
                }
            }),
        }
    }
}
