// # Cloudflare DNS Record Client
//
// This crate provides the Cloudflare implementation of `DnsRecordClient`.
//
// ## Behavior
//
// - One HTTP request per call (GET to read, PATCH to write)
// - No retry, no backoff, no caching (the engine's next cycle is the retry)
// - HTTP timeout configured on the client
// - Specific messages for HTTP status codes (401/403, 404, 429, 5xx)
// - The `success: false` envelope is treated as a failure even on 2xx
//
// ## Security Requirements
//
// - API token NEVER appears in logs, errors or Debug output
// - Client construction fails fast if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=A`
// - Patch DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ipsync_core::config::SyncConfig;
use ipsync_core::traits::{DnsRecord, DnsRecordClient};
use ipsync_core::{Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest error body carried into error messages
const MAX_ERROR_BODY: usize = 512;

/// Cloudflare v4 response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    result: Option<T>,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    success: bool,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

/// Cloudflare DNS record client
///
/// Stateless and single-shot; all coordination belongs to `SyncEngine`.
pub struct CloudflareClient {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareClient")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareClient {
    /// Create a new Cloudflare client
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permission
    /// - `timeout`: Per-request timeout
    pub fn new(api_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_token = api_token.into();

        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
        })
    }

    /// Create a client with the default timeout
    pub fn with_token(api_token: impl Into<String>) -> Result<Self> {
        Self::new(api_token, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create a client from the ipsync configuration
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Self::new(config.api_token.clone(), config.request_timeout())
    }

    /// Point the client at another API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl DnsRecordClient for CloudflareClient {
    /// Fetch the A record `record_name`
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=home.example.com&type=A
    /// Authorization: Bearer <token>
    /// ```
    async fn get_record(&self, zone_id: &str, record_name: &str) -> Result<DnsRecord> {
        tracing::debug!("Looking up record: {} (type: A)", record_name);

        let url = format!("{}/zones/{}/dns_records", self.base_url, zone_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .query(&[("name", record_name), ("type", "A")])
            .send()
            .await
            .map_err(|e| Error::lookup(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = read_error_body(response).await;
            return Err(Error::lookup(describe_status(status, &error_text, "Record lookup failed")));
        }

        let body: ApiResponse<Vec<DnsRecord>> = response
            .json()
            .await
            .map_err(|e| Error::lookup(format!("Failed to parse response: {}", e)))?;

        if !body.success {
            return Err(Error::lookup(format!(
                "Cloudflare reported failure: {}",
                describe_api_errors(&body.errors)
            )));
        }

        let record = body
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| {
                Error::lookup(format!("DNS record not found: {} (type: A)", record_name))
            })?;

        tracing::debug!("Found record ID: {}", record.id);
        Ok(record)
    }

    /// Set content and proxied flag of record `record_id`
    ///
    /// # API Call
    ///
    /// ```http
    /// PATCH /zones/:zone_id/dns_records/:record_id
    /// {
    ///   "content": "203.0.113.5",
    ///   "proxied": false
    /// }
    /// ```
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        new_ip: Ipv4Addr,
        proxied: bool,
    ) -> Result<DnsRecord> {
        let url = format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record_id);

        let payload = serde_json::json!({
            "content": new_ip.to_string(),
            "proxied": proxied,
        });

        tracing::debug!("PATCH record {} with payload: {}", record_id, payload);

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::update(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = read_error_body(response).await;
            return Err(Error::update(describe_status(status, &error_text, "Failed to update record")));
        }

        let body: ApiResponse<DnsRecord> = response
            .json()
            .await
            .map_err(|e| Error::update(format!("Failed to parse response: {}", e)))?;

        if !body.success {
            return Err(Error::update(format!(
                "Cloudflare reported failure: {}",
                describe_api_errors(&body.errors)
            )));
        }

        let record = body
            .result
            .ok_or_else(|| Error::update("Invalid response format: result is missing"))?;

        tracing::debug!(
            "Record {} now {} (proxied={})",
            record.id,
            record.content,
            record.proxied
        );
        Ok(record)
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

/// Map a non-success HTTP status to an operator-facing message
fn describe_status(status: StatusCode, error_text: &str, context: &str) -> String {
    match status.as_u16() {
        401 | 403 => format!(
            "Authentication failed: Invalid API token or insufficient permissions. Status: {}",
            status
        ),
        404 => format!("Not found: zone or record does not exist. Status: {}", status),
        429 => format!("Rate limit exceeded. Please retry later. Status: {}", status),
        500..=599 => format!(
            "Cloudflare server error (transient): {} - {}",
            status, error_text
        ),
        _ => format!("{}: {} - {}", context, status, error_text),
    }
}

/// Read at most [`MAX_ERROR_BODY`] bytes of an error response
async fn read_error_body(mut response: reqwest::Response) -> String {
    let mut body = Vec::new();

    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let room = MAX_ERROR_BODY - body.len();
                if chunk.len() > room {
                    body.extend_from_slice(&chunk[..room]);
                    return format!("{} [truncated]", String::from_utf8_lossy(&body));
                }
                body.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(_) if body.is_empty() => return "Unable to read error response".to_string(),
            Err(_) => break,
        }
    }

    String::from_utf8_lossy(&body).into_owned()
}

fn describe_api_errors(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }

    errors
        .iter()
        .map(|e| format!("Cloudflare error {}: {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}
