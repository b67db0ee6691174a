//! 永続化される設定モデル

use chrono::{DateTime, Utc};
use gatehouse_core::RuntimeKind;
use serde::{Deserialize, Serialize};

/// n8n のデフォルト公開ポート
pub const DEFAULT_N8N_PORT: u16 = 5678;

/// プロビジョニング済みトンネルの全情報
///
/// すべてのリモート操作が成功した後にだけ作成される。
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunnelConfig {
    /// Cloudflare API トークン
    pub api_token: String,
    pub account_id: String,
    pub zone_id: String,
    pub zone_name: String,
    pub tunnel_id: String,
    pub tunnel_name: String,
    /// cloudflared が使うトンネルトークン
    pub tunnel_token: String,
    /// 公開ホスト名（イングレスと DNS の両方で同じ値）
    pub hostname: String,
    pub dns_record_id: String,
    pub tunnel_created_at: DateTime<Utc>,
}

impl TunnelConfig {
    /// CNAME の向き先
    pub fn dns_target(&self) -> String {
        format!("{}.cfargotunnel.com", self.tunnel_id)
    }
}

// トークン類はログに出さない
impl std::fmt::Debug for TunnelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TunnelConfig")
            .field("api_token", &"****")
            .field("account_id", &self.account_id)
            .field("zone_id", &self.zone_id)
            .field("zone_name", &self.zone_name)
            .field("tunnel_id", &self.tunnel_id)
            .field("tunnel_name", &self.tunnel_name)
            .field("tunnel_token", &"****")
            .field("hostname", &self.hostname)
            .field("dns_record_id", &self.dns_record_id)
            .field("tunnel_created_at", &self.tunnel_created_at)
            .finish()
    }
}

/// モードに依らない共通設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallSettings {
    pub runtime: RuntimeKind,
    pub n8n_port: u16,
    pub timezone: String,
    pub installed_at: DateTime<Utc>,
}

impl InstallSettings {
    pub fn new(runtime: RuntimeKind, n8n_port: u16) -> Self {
        Self {
            runtime,
            n8n_port,
            timezone: std::env::var("TZ").unwrap_or_else(|_| "UTC".to_string()),
            installed_at: Utc::now(),
        }
    }
}

/// インストール設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InstallConfig {
    /// ローカルのみ（トンネルなし）
    LocalOnly { settings: InstallSettings },
    /// Cloudflare Tunnel 経由で公開
    Tunneled {
        settings: InstallSettings,
        tunnel: TunnelConfig,
    },
}

impl InstallConfig {
    pub fn settings(&self) -> &InstallSettings {
        match self {
            Self::LocalOnly { settings } | Self::Tunneled { settings, .. } => settings,
        }
    }

    pub fn tunnel(&self) -> Option<&TunnelConfig> {
        match self {
            Self::LocalOnly { .. } => None,
            Self::Tunneled { tunnel, .. } => Some(tunnel),
        }
    }

    pub fn is_tunneled(&self) -> bool {
        matches!(self, Self::Tunneled { .. })
    }

    /// モード名
    pub fn mode_name(&self) -> &'static str {
        match self {
            Self::LocalOnly { .. } => "local",
            Self::Tunneled { .. } => "tunnel",
        }
    }

    pub fn local_url(&self) -> String {
        format!("http://localhost:{}", self.settings().n8n_port)
    }

    /// 公開 URL（トンネル時のみ）
    pub fn public_url(&self) -> Option<String> {
        self.tunnel().map(|t| format!("https://{}", t.hostname))
    }

    /// n8n から見た自身の URL（Webhook の生成に使われる）
    pub fn webhook_url(&self) -> String {
        match self.public_url() {
            Some(url) => format!("{}/", url),
            None => format!("{}/", self.local_url()),
        }
    }

    /// docker compose のプロファイル
    pub fn compose_profile(&self) -> Option<&'static str> {
        match self {
            Self::LocalOnly { .. } => None,
            Self::Tunneled { .. } => Some(crate::compose::TUNNEL_PROFILE),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 9, 30, 0).unwrap()
    }

    pub(crate) fn sample_tunnel() -> TunnelConfig {
        TunnelConfig {
            api_token: "cf-secret-token".to_string(),
            account_id: "acc-123".to_string(),
            zone_id: "zone-456".to_string(),
            zone_name: "example.com".to_string(),
            tunnel_id: "tid-789".to_string(),
            tunnel_name: "n8n-myhost-ab12".to_string(),
            tunnel_token: "tunnel-secret-token".to_string(),
            hostname: "n8n.example.com".to_string(),
            dns_record_id: "rec-abc".to_string(),
            tunnel_created_at: fixed_time(),
        }
    }

    pub(crate) fn sample_settings() -> InstallSettings {
        InstallSettings {
            runtime: RuntimeKind::Docker,
            n8n_port: DEFAULT_N8N_PORT,
            timezone: "Asia/Tokyo".to_string(),
            installed_at: fixed_time(),
        }
    }

    #[test]
    fn test_debug_masks_secrets() {
        let debug = format!("{:?}", sample_tunnel());
        assert!(!debug.contains("cf-secret-token"));
        assert!(!debug.contains("tunnel-secret-token"));
        assert!(debug.contains("n8n.example.com"));
    }

    #[test]
    fn test_tagged_serialization() {
        let config = InstallConfig::Tunneled {
            settings: sample_settings(),
            tunnel: sample_tunnel(),
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["mode"], "tunneled");
        assert_eq!(json["tunnel"]["hostname"], "n8n.example.com");
        assert_eq!(json["settings"]["runtime"], "docker");

        let local = InstallConfig::LocalOnly {
            settings: sample_settings(),
        };
        let json = serde_json::to_value(&local).unwrap();
        assert_eq!(json["mode"], "local_only");
        assert!(json.get("tunnel").is_none());
    }

    #[test]
    fn test_urls() {
        let local = InstallConfig::LocalOnly {
            settings: sample_settings(),
        };
        assert_eq!(local.local_url(), "http://localhost:5678");
        assert_eq!(local.public_url(), None);
        assert_eq!(local.webhook_url(), "http://localhost:5678/");
        assert_eq!(local.compose_profile(), None);

        let tunneled = InstallConfig::Tunneled {
            settings: sample_settings(),
            tunnel: sample_tunnel(),
        };
        assert_eq!(
            tunneled.public_url().as_deref(),
            Some("https://n8n.example.com")
        );
        assert_eq!(tunneled.webhook_url(), "https://n8n.example.com/");
        assert_eq!(tunneled.compose_profile(), Some("tunnel"));
    }

    #[test]
    fn test_dns_target() {
        assert_eq!(sample_tunnel().dns_target(), "tid-789.cfargotunnel.com");
    }
}
