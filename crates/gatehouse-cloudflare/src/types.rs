//! Cloudflare API resource types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Service of the mandatory last ingress rule
pub const CATCH_ALL_SERVICE: &str = "http_status:404";

/// Result of `GET /user/tokens/verify`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenStatus {
    pub id: String,
    pub status: String,
}

impl TokenStatus {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Owning account as embedded in a zone
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ZoneAccount {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub account: ZoneAccount,
}

impl Zone {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tunnel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub content: String,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default)]
    pub ttl: u32,
}

/// Body for creating or updating a DNS record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecordRequest {
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub proxied: bool,
    /// 1 = automatic
    pub ttl: u32,
}

impl DnsRecordRequest {
    /// Proxied CNAME pointing `hostname` at the tunnel
    pub fn tunnel_cname(hostname: &str, tunnel_id: &str) -> Self {
        Self {
            record_type: "CNAME".to_string(),
            name: hostname.to_string(),
            content: format!("{}.cfargotunnel.com", tunnel_id),
            proxied: true,
            ttl: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub service: String,
}

impl IngressRule {
    pub fn new(hostname: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            hostname: Some(hostname.into()),
            service: service.into(),
        }
    }

    pub fn catch_all() -> Self {
        Self {
            hostname: None,
            service: CATCH_ALL_SERVICE.to_string(),
        }
    }

    pub fn is_catch_all(&self) -> bool {
        self.hostname.is_none()
    }
}

/// Remotely managed tunnel configuration
///
/// Always ends with exactly one catch-all rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressConfig {
    pub ingress: Vec<IngressRule>,
}

impl IngressConfig {
    /// Build from hostname rules. Any catch-all passed in is dropped and the
    /// fixed one is appended last.
    pub fn new(rules: impl IntoIterator<Item = IngressRule>) -> Self {
        let mut ingress: Vec<IngressRule> =
            rules.into_iter().filter(|r| !r.is_catch_all()).collect();
        ingress.push(IngressRule::catch_all());
        Self { ingress }
    }

    pub fn for_hostname(hostname: &str, service: &str) -> Self {
        Self::new([IngressRule::new(hostname, service)])
    }

    /// Rules that match a hostname
    pub fn hostname_rules(&self) -> impl Iterator<Item = &IngressRule> {
        self.ingress.iter().filter(|r| !r.is_catch_all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catch_all_is_last() {
        for count in [0, 1, 3] {
            let rules = (0..count)
                .map(|i| IngressRule::new(format!("h{i}.example.com"), "http://n8n:5678"));
            let config = IngressConfig::new(rules);

            assert_eq!(config.ingress.len(), count + 1);
            let last = config.ingress.last().unwrap();
            assert_eq!(last.hostname, None);
            assert_eq!(last.service, CATCH_ALL_SERVICE);
        }
    }

    #[test]
    fn test_supplied_catch_all_is_replaced() {
        let config = IngressConfig::new([
            IngressRule {
                hostname: None,
                service: "http://wrong".to_string(),
            },
            IngressRule::new("n8n.example.com", "http://n8n:5678"),
        ]);

        assert_eq!(
            config.ingress,
            vec![
                IngressRule::new("n8n.example.com", "http://n8n:5678"),
                IngressRule::catch_all()
            ]
        );
        assert_eq!(config.hostname_rules().count(), 1);
    }

    #[test]
    fn test_ingress_json_shape() {
        let json = serde_json::to_value(IngressConfig::for_hostname(
            "n8n.example.com",
            "http://n8n:5678",
        ))
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ingress": [
                    {"hostname": "n8n.example.com", "service": "http://n8n:5678"},
                    {"service": "http_status:404"}
                ]
            })
        );
    }

    #[test]
    fn test_tunnel_cname() {
        let request = DnsRecordRequest::tunnel_cname("n8n.example.com", "tid-1");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "CNAME");
        assert_eq!(json["content"], "tid-1.cfargotunnel.com");
        assert_eq!(json["proxied"], true);
        assert_eq!(json["ttl"], 1);
    }

    #[test]
    fn test_zone_without_account() {
        let zone: Zone =
            serde_json::from_str(r#"{"id":"z1","name":"example.com","status":"active"}"#).unwrap();
        assert!(zone.is_active());
        assert!(zone.account.id.is_empty());
    }
}
