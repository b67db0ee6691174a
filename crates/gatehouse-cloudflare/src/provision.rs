//! Tunnel provisioning
//!
//! | # | step                      | on failure                    |
//! |---|---------------------------|-------------------------------|
//! | 1 | verify token              | fail                          |
//! | 2 | resolve account           | fail                          |
//! | 3 | select zone               | fail                          |
//! | 4 | check existing DNS record | confirm or stop unchanged     |
//! | 5 | create tunnel             | fail                          |
//! | 6 | configure ingress         | delete tunnel, fail           |
//! | 7 | fetch tunnel token        | delete tunnel, fail           |
//! | 8 | create/update DNS record  | delete tunnel, fail           |
//!
//! A DNS record is never deleted as compensation: step 8 is the last remote
//! write, and an updated record existed before this run.

use crate::client::ApiClient;
use crate::error::{CloudflareError, Result};
use crate::naming::{generate_tunnel_name, generate_tunnel_secret, validate_subdomain};
use crate::teardown::{DeletionResult, Teardown};
use crate::types::{DnsRecord, IngressConfig, Tunnel, Zone};
use chrono::Utc;
use gatehouse_config::{N8N_SERVICE_URL, TunnelConfig};
use gatehouse_core::{ProgressSink, Prompter, Step};

/// Parameters of one provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub subdomain: String,
    /// Zone to use. When absent the user picks one.
    pub domain: Option<String>,
    /// Origin the tunnel forwards to, as seen from `cloudflared`
    pub service_url: String,
    /// Local host name used to derive the tunnel name
    pub host: String,
}

impl ProvisionRequest {
    pub fn new(subdomain: impl Into<String>, domain: Option<String>) -> Self {
        Self {
            subdomain: subdomain.into(),
            domain,
            service_url: N8N_SERVICE_URL.to_string(),
            host: gatehouse_core::host_identity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Provisioned(TunnelConfig),
    /// The user declined to overwrite an existing DNS record. Nothing was
    /// changed remotely.
    Declined { hostname: String },
}

pub struct Provisioner<'a> {
    client: &'a ApiClient,
    sink: &'a dyn ProgressSink,
    prompter: &'a dyn Prompter,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        client: &'a ApiClient,
        sink: &'a dyn ProgressSink,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            client,
            sink,
            prompter,
        }
    }

    pub async fn provision(&self, request: &ProvisionRequest) -> Result<ProvisionOutcome> {
        // no remote call for invalid input
        let subdomain = validate_subdomain(&request.subdomain)?;

        // 1. token
        self.sink.step_started(Step::ValidateToken);
        let status = self.check(self.client.verify_token().await)?;
        if !status.is_active() {
            return self.check(Err(CloudflareError::TokenInactive(status.status)));
        }
        self.sink.step_succeeded(None);

        // 2. account
        self.sink.step_started(Step::ResolveAccount);
        let account_id = self.check(self.client.resolve_account_id().await)?;
        self.sink.step_succeeded(Some(&account_id));

        // 3. zone
        self.sink.step_started(Step::SelectZone);
        let zone = self.check(self.select_zone(&account_id, request.domain.as_deref()).await)?;
        self.sink.step_succeeded(Some(&zone.name));
        let hostname = format!("{}.{}", subdomain, zone.name);

        // 4. existing record
        self.sink.step_started(Step::CheckDnsRecord);
        let existing = self.check(self.client.find_dns_record(&zone.id, &hostname).await)?;
        match &existing {
            Some(record) => {
                self.sink.step_succeeded(Some(&format!(
                    "{} {} -> {}",
                    record.record_type, record.name, record.content
                )));
                let message = format!(
                    "{} には既に {} レコード ({}) があります。このトンネルに向け直しますか？",
                    hostname, record.record_type, record.content
                );
                if !self.prompter.confirm(&message, false)? {
                    tracing::info!(
                        hostname = %hostname,
                        "Existing DNS record kept, provisioning stopped"
                    );
                    return Ok(ProvisionOutcome::Declined { hostname });
                }
            }
            None => self.sink.step_succeeded(None),
        }

        // 5. tunnel
        self.sink.step_started(Step::CreateTunnel);
        let name = generate_tunnel_name(&request.host);
        let secret = generate_tunnel_secret();
        let tunnel = self.check(self.client.create_tunnel(&account_id, &name, &secret).await)?;
        self.sink.step_succeeded(Some(&tunnel.name));
        tracing::info!(tunnel_id = %tunnel.id, tunnel_name = %tunnel.name, "Created tunnel");

        // 6-8. anything failing from here leaves a tunnel behind
        let (tunnel_token, record) = match self
            .configure(&account_id, &zone, &tunnel, &hostname, existing.as_ref(), request)
            .await
        {
            Ok(done) => done,
            Err(e) => {
                let rollback = Teardown::new(self.client, self.sink)
                    .rollback_tunnel(&account_id, &tunnel.id)
                    .await;
                if let DeletionResult::Failed(reason) = rollback {
                    self.sink.warn(&format!(
                        "トンネル {} ({}) を削除できませんでした。Cloudflare ダッシュボードから削除してください: {}",
                        tunnel.name, tunnel.id, reason
                    ));
                }
                return Err(e);
            }
        };

        Ok(ProvisionOutcome::Provisioned(TunnelConfig {
            api_token: self.client.token().to_string(),
            account_id,
            zone_id: zone.id,
            zone_name: zone.name,
            tunnel_id: tunnel.id,
            tunnel_name: tunnel.name,
            tunnel_token,
            hostname,
            dns_record_id: record.id,
            tunnel_created_at: tunnel.created_at.unwrap_or_else(Utc::now),
        }))
    }

    async fn configure(
        &self,
        account_id: &str,
        zone: &Zone,
        tunnel: &Tunnel,
        hostname: &str,
        existing: Option<&DnsRecord>,
        request: &ProvisionRequest,
    ) -> Result<(String, DnsRecord)> {
        self.sink.step_started(Step::ConfigureIngress);
        let ingress = IngressConfig::for_hostname(hostname, &request.service_url);
        self.check(
            self.client
                .put_tunnel_configuration(account_id, &tunnel.id, &ingress)
                .await,
        )?;
        self.sink
            .step_succeeded(Some(&format!("{} -> {}", hostname, request.service_url)));

        self.sink.step_started(Step::FetchTunnelToken);
        let token = self.check(self.client.get_tunnel_token(account_id, &tunnel.id).await)?;
        self.sink.step_succeeded(None);

        self.sink.step_started(Step::ReconcileDnsRecord);
        let record = self.check(
            self.client
                .ensure_tunnel_cname(&zone.id, existing, hostname, &tunnel.id)
                .await,
        )?;
        self.sink.step_succeeded(Some(&record.name));

        Ok((token, record))
    }

    async fn select_zone(&self, account_id: &str, domain: Option<&str>) -> Result<Zone> {
        let mut zones = self.client.list_zones(Some(account_id)).await?;
        if zones.is_empty() {
            return Err(CloudflareError::NoZones);
        }

        if let Some(domain) = domain {
            let wanted = domain.trim().trim_end_matches('.');
            return match zones.iter().position(|z| z.name.eq_ignore_ascii_case(wanted)) {
                Some(index) => Ok(zones.swap_remove(index)),
                None => Err(CloudflareError::DomainNotFound {
                    domain: domain.to_string(),
                    available: zones
                        .iter()
                        .map(|z| z.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                }),
            };
        }

        if zones.len() == 1 {
            return Ok(zones.swap_remove(0));
        }

        let names: Vec<String> = zones.iter().map(|z| z.name.clone()).collect();
        let index = self.prompter.select("使用するドメインを選択してください", &names)?;
        zones.into_iter().nth(index).ok_or(CloudflareError::NoZones)
    }

    /// Report a failed step to the sink
    fn check<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.sink.step_failed(&e.to_string());
        }
        result
    }
}
