//! Cloudflare DNS API
//!
//! DNS record lookup and management for the tunnel hostname.

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{DnsRecord, DnsRecordRequest};
use serde::de::IgnoredAny;

impl ApiClient {
    /// Find DNS records of any type with exactly this name
    pub async fn find_dns_records(&self, zone_id: &str, name: &str) -> Result<Vec<DnsRecord>> {
        self.get(&format!("/zones/{}/dns_records?name={}", zone_id, name))
            .await
    }

    pub async fn find_dns_record(&self, zone_id: &str, name: &str) -> Result<Option<DnsRecord>> {
        Ok(self.find_dns_records(zone_id, name).await?.into_iter().next())
    }

    pub async fn create_dns_record(
        &self,
        zone_id: &str,
        record: &DnsRecordRequest,
    ) -> Result<DnsRecord> {
        self.post(
            &format!("/zones/{}/dns_records", zone_id),
            &serde_json::to_value(record)?,
        )
        .await
    }

    /// Update a record in place. The record id stays the same.
    pub async fn update_dns_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &DnsRecordRequest,
    ) -> Result<DnsRecord> {
        self.patch(
            &format!("/zones/{}/dns_records/{}", zone_id, record_id),
            &serde_json::to_value(record)?,
        )
        .await
    }

    pub async fn delete_dns_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        let _: IgnoredAny = self
            .delete(&format!("/zones/{}/dns_records/{}", zone_id, record_id))
            .await?;
        Ok(())
    }

    /// Point `hostname` at the tunnel, updating `existing` when given
    pub async fn ensure_tunnel_cname(
        &self,
        zone_id: &str,
        existing: Option<&DnsRecord>,
        hostname: &str,
        tunnel_id: &str,
    ) -> Result<DnsRecord> {
        let request = DnsRecordRequest::tunnel_cname(hostname, tunnel_id);
        match existing {
            Some(record) => {
                tracing::info!(
                    "Updating DNS record {} from {} {} to CNAME {}",
                    record.name,
                    record.record_type,
                    record.content,
                    request.content
                );
                self.update_dns_record(zone_id, &record.id, &request).await
            }
            None => {
                tracing::info!("Creating DNS record: {} -> {}", hostname, request.content);
                self.create_dns_record(zone_id, &request).await
            }
        }
    }
}
