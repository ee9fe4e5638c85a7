// # IP Resolver Trait
//
// Defines the interface for learning the caller's public IPv4 address.
//
// ## Implementations
//
// - HTTP echo services: `ipsync-resolver-http` crate

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for public-IP resolver implementations
///
/// A resolver is stateless and single-shot: one call to [`IpResolver::resolve`]
/// performs at most one request per configured endpoint, without retries.
/// The next engine cycle is the retry.
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The first valid address obtained
    /// - `Err(Error::Resolution)`: If no endpoint produced a valid address
    async fn resolve(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Get the resolver name (for logging/debugging)
    fn resolver_name(&self) -> &'static str;
}
