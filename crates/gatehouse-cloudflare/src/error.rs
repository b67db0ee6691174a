//! Cloudflare provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudflareError {
    #[error("Cloudflare API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Cloudflare API error ({context}): {message}")]
    RemoteApi {
        context: String,
        /// HTTP status of the rejected request
        status: u16,
        message: String,
    },

    #[error("Unexpected Cloudflare API response ({context}): {message}")]
    InvalidResponse { context: String, message: String },

    #[error("API token is not active (status: {0})")]
    TokenInactive(String),

    #[error(
        "Invalid subdomain '{0}': use 1-63 letters, digits or hyphens, without a leading or trailing hyphen"
    )]
    InvalidSubdomain(String),

    #[error("Domain '{domain}' is not an active zone for this token (available: {available})")]
    DomainNotFound { domain: String, available: String },

    #[error("No active zones found for this token")]
    NoZones,

    #[error("No Cloudflare account is accessible with this token")]
    NoAccount,

    #[error(transparent)]
    Prompt(#[from] gatehouse_core::CoreError),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CloudflareError {
    /// Network-level failures may succeed when attempted again.
    /// Rejections by the API never do.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RemoteApi { status: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, CloudflareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_rejection_is_not_retryable() {
        let err = CloudflareError::RemoteApi {
            context: "GET /accounts".to_string(),
            status: 403,
            message: "Authentication error".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("Authentication error"));
    }
}
