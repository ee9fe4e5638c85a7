// # HTTP IP Resolver
//
// This crate provides the public-IP resolver for ipsync.
//
// ## Architecture
//
// Queries an ordered list of "what is my IP" services (e.g. api.ipify.org,
// ifconfig.me, checkip.amazonaws.com) that answer with the caller's address
// as plain text. The first endpoint returning a valid IPv4 address wins.
// Endpoints provide redundancy, not consensus: there is no voting and no
// retry of a single endpoint.

use async_trait::async_trait;
use ipsync_core::config::SyncConfig;
use ipsync_core::traits::IpResolver;
use ipsync_core::{Error, Result};

use std::net::Ipv4Addr;
use std::time::Duration;

/// Default timeout for a single endpoint request
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest reply accepted from an echo endpoint
const MAX_BODY_BYTES: usize = 256;

/// Public-IP resolver backed by plain-text HTTP echo services
#[derive(Debug)]
pub struct HttpIpResolver {
    /// Endpoints, queried in order
    endpoints: Vec<String>,

    /// Reject non-public addresses
    require_public: bool,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a resolver over `endpoints`
    ///
    /// # Parameters
    ///
    /// - `endpoints`: URLs queried in order (e.g., "https://api.ipify.org")
    /// - `timeout`: Per-request timeout
    pub fn new(endpoints: Vec<String>, timeout: Duration) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(Error::config("at least one IP endpoint is required"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoints,
            require_public: false,
            client,
        })
    }

    /// Create a resolver with the default endpoints and timeout
    pub fn with_defaults() -> Result<Self> {
        Self::new(
            ipsync_core::config::DEFAULT_IP_ENDPOINTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            DEFAULT_HTTP_TIMEOUT,
        )
    }

    /// Create a resolver from the ipsync configuration
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Ok(Self::new(config.ip_endpoints.clone(), config.request_timeout())?
            .require_public(config.require_public_ip))
    }

    /// Reject private, loopback and link-local addresses
    pub fn require_public(mut self, require_public: bool) -> Self {
        self.require_public = require_public;
        self
    }

    /// Endpoints in query order
    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Fetch and validate the address reported by one endpoint
    async fn fetch_ip(&self, url: &str) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::http(format!("HTTP error: {}", response.status())));
        }

        let body = read_body(response).await?;
        let ip = parse_ipv4(&body)?;

        if self.require_public && !is_public_ipv4(ip) {
            return Err(Error::resolution(format!("Not a public IPv4 address: {}", ip)));
        }

        Ok(ip)
    }
}

#[async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve(&self) -> Result<Ipv4Addr> {
        let mut last_error = None;

        for url in &self.endpoints {
            match self.fetch_ip(url).await {
                Ok(ip) => {
                    tracing::debug!("Public IP from {}: {}", url, ip);
                    return Ok(ip);
                }
                Err(e) => {
                    tracing::warn!("IP endpoint {} rejected: {}", url, e);
                    last_error = Some(e);
                }
            }
        }

        Err(Error::resolution(format!(
            "no endpoint returned a valid IPv4 address (last error: {})",
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "none".to_string())
        )))
    }

    fn resolver_name(&self) -> &'static str {
        "http"
    }
}

/// Read the reply, giving up once it exceeds [`MAX_BODY_BYTES`]
async fn read_body(mut response: reqwest::Response) -> Result<String> {
    let mut body = Vec::new();

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?
    {
        if body.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(Error::resolution(format!(
                "Response larger than {} bytes",
                MAX_BODY_BYTES
            )));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Parse a plain-text response body as an IPv4 address
///
/// Surrounding whitespace is ignored; anything else, IPv6 included, is rejected.
pub fn parse_ipv4(body: &str) -> Result<Ipv4Addr> {
    let text = body.trim();
    text.parse()
        .map_err(|_| Error::resolution(format!("Invalid IPv4 address: '{}'", text)))
}

/// Whether `ip` is routable on the public internet
///
/// Rejects private (10/8, 172.16/12, 192.168/16), loopback, link-local,
/// unspecified and broadcast addresses.
pub fn is_public_ipv4(ip: Ipv4Addr) -> bool {
    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast())
}
