//! Token verification, account and zone lookup

use crate::client::ApiClient;
use crate::error::{CloudflareError, Result};
use crate::types::{Account, TokenStatus, Zone};

impl ApiClient {
    /// Verify the bearer token
    pub async fn verify_token(&self) -> Result<TokenStatus> {
        self.get("/user/tokens/verify").await
    }

    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.get("/accounts").await
    }

    /// List active zones, optionally scoped to one account
    pub async fn list_zones(&self, account_id: Option<&str>) -> Result<Vec<Zone>> {
        let path = match account_id {
            Some(id) => format!("/zones?account.id={}&status=active&per_page=50", id),
            None => "/zones?status=active&per_page=50".to_string(),
        };
        let zones: Vec<Zone> = self.get(&path).await?;
        Ok(zones.into_iter().filter(Zone::is_active).collect())
    }

    /// Resolve the account id once per client
    ///
    /// Tokens scoped to zones only may not list accounts. In that case the
    /// account embedded in the first zone is used instead.
    pub async fn resolve_account_id(&self) -> Result<String> {
        let id = self
            .account_id
            .get_or_try_init(|| async {
                match self.list_accounts().await {
                    Ok(accounts) => match accounts.into_iter().next() {
                        Some(account) => Ok(account.id),
                        None => {
                            tracing::debug!("No accounts listed, falling back to zone listing");
                            self.account_from_zones().await
                        }
                    },
                    Err(e @ CloudflareError::RemoteApi { .. }) => {
                        tracing::debug!(
                            "Account listing not permitted ({}), falling back to zone listing",
                            e
                        );
                        self.account_from_zones().await
                    }
                    Err(e) => Err(e),
                }
            })
            .await?;

        tracing::debug!(account_id = %id, "Resolved Cloudflare account");
        Ok(id.clone())
    }

    async fn account_from_zones(&self) -> Result<String> {
        self.list_zones(None)
            .await?
            .into_iter()
            .map(|z| z.account.id)
            .find(|id| !id.is_empty())
            .ok_or(CloudflareError::NoAccount)
    }
}
