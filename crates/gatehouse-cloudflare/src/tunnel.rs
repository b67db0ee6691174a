//! Cloudflare Tunnel API (`cfd_tunnel`)

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{IngressConfig, Tunnel};
use serde::de::IgnoredAny;
use serde_json::json;

impl ApiClient {
    /// Create a remotely managed tunnel
    ///
    /// The secret is sent once and never read back.
    pub async fn create_tunnel(
        &self,
        account_id: &str,
        name: &str,
        secret: &str,
    ) -> Result<Tunnel> {
        self.post(
            &format!("/accounts/{}/cfd_tunnel", account_id),
            &json!({
                "name": name,
                "tunnel_secret": secret,
                "config_src": "cloudflare",
            }),
        )
        .await
    }

    /// List tunnels that are not deleted, optionally filtered by name
    pub async fn list_tunnels(&self, account_id: &str, name: Option<&str>) -> Result<Vec<Tunnel>> {
        let mut path = format!("/accounts/{}/cfd_tunnel?is_deleted=false", account_id);
        if let Some(name) = name {
            path.push_str(&format!("&name={}", name));
        }
        self.get(&path).await
    }

    /// Delete a tunnel, even when connections are still registered
    pub async fn delete_tunnel(&self, account_id: &str, tunnel_id: &str) -> Result<()> {
        let _: IgnoredAny = self
            .delete(&format!(
                "/accounts/{}/cfd_tunnel/{}?force=true",
                account_id, tunnel_id
            ))
            .await?;
        Ok(())
    }

    pub async fn put_tunnel_configuration(
        &self,
        account_id: &str,
        tunnel_id: &str,
        config: &IngressConfig,
    ) -> Result<()> {
        let _: IgnoredAny = self
            .put(
                &format!(
                    "/accounts/{}/cfd_tunnel/{}/configurations",
                    account_id, tunnel_id
                ),
                &json!({ "config": config }),
            )
            .await?;
        Ok(())
    }

    /// Token `cloudflared` uses to run the tunnel
    pub async fn get_tunnel_token(&self, account_id: &str, tunnel_id: &str) -> Result<String> {
        self.get(&format!(
            "/accounts/{}/cfd_tunnel/{}/token",
            account_id, tunnel_id
        ))
        .await
    }
}
