// # DNS Record Client Trait
//
// Defines the interface for reading and writing one A record via a DNS
// provider's HTTP API.
//
// ## Implementations
//
// - Cloudflare: `ipsync-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ipsync_core::DnsRecordClient;
//
// let record = client.get_record("zone123", "home.example.com").await?;
// if record.proxied {
//     client.update_record("zone123", &record.id, ip, false).await?;
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// A DNS record as reported by the provider
///
/// The record is owned by the provider; ipsync never creates or deletes one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-specific record id, required for updates
    pub id: String,
    /// The record name
    #[serde(default)]
    pub name: String,
    /// Current content (the IP address as text)
    pub content: String,
    /// Whether traffic is routed through the provider's edge
    #[serde(default)]
    pub proxied: bool,
    /// Time-to-live, if reported
    #[serde(default)]
    pub ttl: Option<u32>,
}

/// Trait for DNS record client implementations
///
/// Both operations are single HTTP round trips carrying the bearer
/// credential. Clients keep no state between calls and never retry;
/// deciding whether an update is needed belongs to the engine.
#[async_trait]
pub trait DnsRecordClient: Send + Sync {
    /// Fetch the A record `record_name` in `zone_id`
    ///
    /// # Returns
    ///
    /// - `Ok(DnsRecord)`: The first matching record
    /// - `Err(Error::Lookup)`: If the call failed or no such record exists
    async fn get_record(
        &self,
        zone_id: &str,
        record_name: &str,
    ) -> Result<DnsRecord, crate::Error>;

    /// Set the content and proxied flag of an existing record
    ///
    /// # Returns
    ///
    /// - `Ok(DnsRecord)`: The record as acknowledged by the provider
    /// - `Err(Error::Update)`: On any non-success response
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        new_ip: Ipv4Addr,
        proxied: bool,
    ) -> Result<DnsRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
