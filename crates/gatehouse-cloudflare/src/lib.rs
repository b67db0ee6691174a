//! Cloudflare Tunnel provisioning
//!
//! Talks to the Cloudflare v4 API with a bearer token and drives the
//! provisioning and teardown of a single tunnel that publishes the local
//! n8n instance under `{subdomain}.{zone}`.

pub mod account;
pub mod client;
pub mod dns;
pub mod error;
pub mod naming;
pub mod provision;
pub mod teardown;
pub mod tunnel;
pub mod types;

pub use client::{API_BASE_ENV, ApiClient, CLOUDFLARE_API_BASE, default_base_url};
pub use error::{CloudflareError, Result};
pub use naming::{generate_tunnel_name, generate_tunnel_secret, validate_subdomain};
pub use provision::{ProvisionOutcome, ProvisionRequest, Provisioner};
pub use teardown::{DeletionResult, Teardown, TeardownReport};
pub use types::{
    Account, CATCH_ALL_SERVICE, DnsRecord, DnsRecordRequest, IngressConfig, IngressRule,
    TokenStatus, Tunnel, Zone, ZoneAccount,
};
