//! Subdomain validation and tunnel naming

use crate::error::{CloudflareError, Result};
use base64::Engine as _;

const MAX_LABEL_LEN: usize = 63;

/// Validate a DNS label and return it lowercased
///
/// Accepts `^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$` case-insensitively.
pub fn validate_subdomain(subdomain: &str) -> Result<String> {
    let label = subdomain.to_ascii_lowercase();
    let bytes = label.as_bytes();

    let valid = match (bytes.first(), bytes.last()) {
        (Some(first), Some(last)) => {
            bytes.len() <= MAX_LABEL_LEN
                && *first != b'-'
                && *last != b'-'
                && bytes
                    .iter()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        }
        _ => false,
    };

    if valid {
        Ok(label)
    } else {
        Err(CloudflareError::InvalidSubdomain(subdomain.to_string()))
    }
}

/// `n8n-{host}-{4 hex}` where host is the local host name lowercased with
/// non-alphanumerics removed
pub fn generate_tunnel_name(host: &str) -> String {
    let mut normalized: String = host
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if normalized.is_empty() {
        normalized.push_str("host");
    }
    format!("n8n-{}-{:04x}", normalized, rand::random::<u16>())
}

/// 32 random bytes, base64 encoded
pub fn generate_tunnel_secret() -> String {
    let raw: [u8; 32] = rand::random();
    base64::engine::general_purpose::STANDARD.encode(raw)
}
