//! Test doubles shared by the engine contract tests
//!
//! Every double is `Clone`; clones share their counters, so a test can keep
//! one copy for assertions and hand a boxed copy to the engine.

#![allow(dead_code)]

use ipsync_core::error::{Error, Result};
use ipsync_core::traits::{DnsRecord, DnsRecordClient, IpResolver, Notifier};
use ipsync_core::SyncConfig;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ZONE_ID: &str = "zone123";
pub const RECORD_NAME: &str = "home.example.com";
pub const RECORD_ID: &str = "rec-1";

/// A resolver returning a fixed address, or failing
#[derive(Clone)]
pub struct MockResolver {
    ip: Option<Ipv4Addr>,
    calls: Arc<AtomicUsize>,
}

impl MockResolver {
    pub fn returning(ip: Ipv4Addr) -> Self {
        Self {
            ip: Some(ip),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            ip: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times resolve() was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpResolver for MockResolver {
    async fn resolve(&self) -> Result<Ipv4Addr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ip
            .ok_or_else(|| Error::resolution("no endpoint returned a valid IPv4 address"))
    }

    fn resolver_name(&self) -> &'static str {
        "mock"
    }
}

/// One recorded update_record() call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub zone_id: String,
    pub record_id: String,
    pub ip: Ipv4Addr,
    pub proxied: bool,
}

/// An in-memory DNS provider holding a single record
///
/// Successful updates are applied to the stored record, so the following
/// cycle observes them.
#[derive(Clone)]
pub struct MockDnsClient {
    record: Arc<Mutex<DnsRecord>>,
    get_calls: Arc<AtomicUsize>,
    updates: Arc<Mutex<Vec<UpdateCall>>>,
    fail_lookup: Arc<AtomicBool>,
    fail_update: Arc<AtomicBool>,
}

impl MockDnsClient {
    pub fn with_record(content: &str, proxied: bool) -> Self {
        Self {
            record: Arc::new(Mutex::new(DnsRecord {
                id: RECORD_ID.to_string(),
                name: RECORD_NAME.to_string(),
                content: content.to_string(),
                proxied,
                ttl: Some(1),
            })),
            get_calls: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(Mutex::new(Vec::new())),
            fail_lookup: Arc::new(AtomicBool::new(false)),
            fail_update: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_fail_lookup(&self, fail: bool) {
        self.fail_lookup.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    /// Get the number of times get_record() was called
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// All update_record() calls, including failed ones
    pub fn updates(&self) -> Vec<UpdateCall> {
        self.updates.lock().unwrap().clone()
    }

    pub fn record(&self) -> DnsRecord {
        self.record.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsRecordClient for MockDnsClient {
    async fn get_record(&self, _zone_id: &str, record_name: &str) -> Result<DnsRecord> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(Error::lookup(format!("DNS record not found: {record_name}")));
        }

        Ok(self.record())
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        new_ip: Ipv4Addr,
        proxied: bool,
    ) -> Result<DnsRecord> {
        self.updates.lock().unwrap().push(UpdateCall {
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
            ip: new_ip,
            proxied,
        });

        if self.fail_update.load(Ordering::SeqCst) {
            return Err(Error::update("Cloudflare server error (transient): 502"));
        }

        let mut record = self.record.lock().unwrap();
        record.content = new_ip.to_string();
        record.proxied = proxied;
        Ok(record.clone())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A notifier recording every message it is asked to send
#[derive(Clone)]
pub struct MockNotifier {
    messages: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Messages received, including those that "failed"
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());

        if self.fail {
            return Err(Error::notify("chat 42: 403 Forbidden"));
        }
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create a minimal valid SyncConfig for testing
pub fn minimal_config() -> SyncConfig {
    SyncConfig::new("test-token", ZONE_ID, RECORD_NAME)
}
