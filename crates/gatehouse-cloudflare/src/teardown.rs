//! Teardown of provisioned Cloudflare resources
//!
//! Deletions run in reverse order of creation: DNS record, then tunnel.
//! Each one is attempted independently; a failure is reported and the next
//! deletion still runs.

use crate::client::ApiClient;
use crate::error::{CloudflareError, Result};
use gatehouse_config::TunnelConfig;
use gatehouse_core::{ProgressSink, Prompter, Step};

/// Outcome of a single deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionResult {
    Deleted,
    /// The resource did not exist any more
    AlreadyGone,
    Failed(String),
}

impl DeletionResult {
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    fn from_result(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self::Deleted,
            Err(e) if e.is_not_found() => Self::AlreadyGone,
            Err(e) => Self::Failed(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    pub dns_record: DeletionResult,
    pub tunnel: DeletionResult,
}

impl TeardownReport {
    pub fn is_complete(&self) -> bool {
        self.dns_record.is_ok() && self.tunnel.is_ok()
    }

    /// Failure messages, labelled by resource
    pub fn failures(&self) -> Vec<String> {
        let mut failures = Vec::new();
        if let DeletionResult::Failed(e) = &self.dns_record {
            failures.push(format!("DNS record: {}", e));
        }
        if let DeletionResult::Failed(e) = &self.tunnel {
            failures.push(format!("tunnel: {}", e));
        }
        failures
    }
}

pub struct Teardown<'a> {
    client: &'a ApiClient,
    sink: &'a dyn ProgressSink,
}

impl<'a> Teardown<'a> {
    pub fn new(client: &'a ApiClient, sink: &'a dyn ProgressSink) -> Self {
        Self { client, sink }
    }

    /// Delete a tunnel created earlier in a failed provisioning run
    pub async fn rollback_tunnel(&self, account_id: &str, tunnel_id: &str) -> DeletionResult {
        self.sink.step_started(Step::Rollback);
        tracing::info!(tunnel_id, "Rolling back tunnel");

        let result =
            DeletionResult::from_result(self.client.delete_tunnel(account_id, tunnel_id).await);
        self.report(&result, tunnel_id);
        result
    }

    /// Ask for confirmation, then remove everything recorded in `config`
    ///
    /// Returns `None` when the user declined.
    pub async fn confirm_and_teardown(
        &self,
        config: &TunnelConfig,
        prompter: &dyn Prompter,
    ) -> Result<Option<TeardownReport>> {
        let message = format!(
            "Cloudflare の DNS レコード {} とトンネル {} を削除しますか？",
            config.hostname, config.tunnel_name
        );
        if !prompter.confirm(&message, false).map_err(CloudflareError::from)? {
            tracing::info!("Teardown declined");
            return Ok(None);
        }
        Ok(Some(self.teardown(config).await))
    }

    /// Remove the DNS record, then the tunnel
    pub async fn teardown(&self, config: &TunnelConfig) -> TeardownReport {
        self.sink.step_started(Step::DeleteDnsRecord);
        let dns_record = DeletionResult::from_result(
            self.client
                .delete_dns_record(&config.zone_id, &config.dns_record_id)
                .await,
        );
        self.report(&dns_record, &config.hostname);

        self.sink.step_started(Step::DeleteTunnel);
        let tunnel = DeletionResult::from_result(
            self.client
                .delete_tunnel(&config.account_id, &config.tunnel_id)
                .await,
        );
        self.report(&tunnel, &config.tunnel_name);

        let report = TeardownReport { dns_record, tunnel };
        if !report.is_complete() {
            tracing::warn!(failures = ?report.failures(), "Teardown incomplete");
        }
        report
    }

    fn report(&self, result: &DeletionResult, target: &str) {
        match result {
            DeletionResult::Deleted => self.sink.step_succeeded(Some(target)),
            DeletionResult::AlreadyGone => {
                self.sink
                    .step_skipped(&format!("{} は既に存在しません", target));
            }
            DeletionResult::Failed(e) => {
                tracing::warn!("Failed to delete {}: {}", target, e);
                self.sink.step_failed(e);
            }
        }
    }
}
