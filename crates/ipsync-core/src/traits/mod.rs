//! Component traits for ipsync
//!
//! - [`IpResolver`]: Learn the current public IPv4 address
//! - [`DnsRecordClient`]: Read and write the managed A record
//! - [`Notifier`]: Report successful updates to a human

pub mod ip_resolver;
pub mod dns_client;
pub mod notifier;

pub use ip_resolver::IpResolver;
pub use dns_client::{DnsRecord, DnsRecordClient};
pub use notifier::Notifier;
