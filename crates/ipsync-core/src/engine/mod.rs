//! Synchronization engine
//!
//! The SyncEngine is responsible for:
//! - Resolving the current public IP via IpResolver
//! - Reading the managed record via DnsRecordClient
//! - Deciding whether the record must be rewritten
//! - Updating the record and notifying the operator
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐          ┌──────────────┐          ┌─────────────────┐
//! │ IpResolver  │── ip ───▶│  SyncEngine  │◀─ read ─▶│ DnsRecordClient │
//! └─────────────┘          └──────────────┘  write   └─────────────────┘
//!                                  │
//!                                  ▼
//!                          ┌──────────────┐
//!                          │   Notifier   │
//!                          └──────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. Resolve the public IP (failure skips the cycle)
//! 2. Fetch the record (failure skips the cycle)
//! 3. Update when content differs or the record is proxied
//! 4. On success, notify (best effort)
//! 5. Sleep for the poll interval

pub mod decision;

use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::error::Result;
use crate::traits::{DnsRecordClient, IpResolver, Notifier};

pub use decision::{UpdateReason, change_message, decide_update};

/// State carried from one cycle to the next
///
/// Nothing here is needed for correctness: the DNS record is the
/// authoritative "last applied" value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncState {
    /// Public IP seen by the last cycle that completed
    pub last_known_ip: Option<Ipv4Addr>,
}

/// Result of one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No endpoint produced an address
    ResolutionFailed {
        error: String,
    },

    /// The record could not be read
    LookupFailed {
        ip: Ipv4Addr,
        error: String,
    },

    /// The record already matched and was DNS-only
    InSync {
        ip: Ipv4Addr,
    },

    /// The record was rewritten
    Updated {
        reason: UpdateReason,
        previous_content: String,
        new_ip: Ipv4Addr,
        /// Whether a configured notifier accepted the message
        notified: bool,
    },

    /// The provider rejected the update
    UpdateFailed {
        ip: Ipv4Addr,
        reason: UpdateReason,
        error: String,
    },
}

/// Core synchronization engine
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`] (validates configuration)
/// 2. Start with [`SyncEngine::run()`], which never returns
/// 3. Stop by terminating the process
///
/// ## Threading
///
/// Every step is awaited in sequence; nothing runs concurrently.
pub struct SyncEngine {
    resolver: Box<dyn IpResolver>,
    client: Box<dyn DnsRecordClient>,
    notifier: Option<Box<dyn Notifier>>,
    zone_id: String,
    record_name: String,
    poll_interval: Duration,
}

impl SyncEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `resolver`: Public-IP resolver
    /// - `client`: DNS record client
    /// - `notifier`: Optional notifier
    /// - `config`: Validated before anything else happens
    pub fn new(
        resolver: Box<dyn IpResolver>,
        client: Box<dyn DnsRecordClient>,
        notifier: Option<Box<dyn Notifier>>,
        config: &SyncConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            resolver,
            client,
            notifier,
            zone_id: config.zone_id.clone(),
            record_name: config.record_name.clone(),
            poll_interval: config.poll_interval(),
        })
    }

    /// Override the sleep between cycles
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Name of the managed record
    pub fn record_name(&self) -> &str {
        &self.record_name
    }

    /// Run cycles forever, sleeping `poll_interval` after each
    pub async fn run(&self, state: SyncState) {
        self.run_until(state, std::future::pending()).await;
    }

    /// Run cycles until `shutdown` fires, returning the last state
    ///
    /// A cycle in progress is abandoned when the signal arrives. Dropping
    /// the sender counts as a signal.
    pub async fn run_with_shutdown(
        &self,
        state: SyncState,
        shutdown: oneshot::Receiver<()>,
    ) -> SyncState {
        self.run_until(state, async move {
            let _ = shutdown.await;
        })
        .await
    }

    async fn run_until(&self, mut state: SyncState, shutdown: impl Future<Output = ()>) -> SyncState {
        info!(
            "Starting sync loop for {} (interval {:?}, resolver {}, provider {}, notifier {})",
            self.record_name,
            self.poll_interval,
            self.resolver.resolver_name(),
            self.client.provider_name(),
            self.notifier
                .as_ref()
                .map(|n| n.notifier_name())
                .unwrap_or("none"),
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                (next, _outcome) = self.run_cycle(state) => {
                    state = next;
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    return state;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    return state;
                }
            }
        }
    }

    /// Run a single cycle
    ///
    /// Never fails: every error is logged and reported through the outcome.
    pub async fn run_cycle(&self, state: SyncState) -> (SyncState, CycleOutcome) {
        let ip = match self.resolver.resolve().await {
            Ok(ip) => ip,
            Err(e) => {
                error!("Failed to resolve public IP: {}", e);
                return (
                    state,
                    CycleOutcome::ResolutionFailed {
                        error: e.to_string(),
                    },
                );
            }
        };

        match state.last_known_ip {
            Some(last) if last != ip => info!("Public IP changed: {} -> {}", last, ip),
            None => info!("Public IP: {}", ip),
            _ => debug!("Public IP unchanged: {}", ip),
        }

        let record = match self.client.get_record(&self.zone_id, &self.record_name).await {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to fetch record {}: {}", self.record_name, e);
                return (
                    state,
                    CycleOutcome::LookupFailed {
                        ip,
                        error: e.to_string(),
                    },
                );
            }
        };

        debug!(
            "Record {}: content={}, proxied={}",
            self.record_name, record.content, record.proxied
        );

        let Some(reason) = decide_update(&record, ip) else {
            debug!("Record {} already in sync", self.record_name);
            return (
                SyncState {
                    last_known_ip: Some(ip),
                },
                CycleOutcome::InSync { ip },
            );
        };

        info!(
            "Updating {} -> {} (proxied=false, {})",
            self.record_name, ip, reason
        );

        if let Err(e) = self
            .client
            .update_record(&self.zone_id, &record.id, ip, false)
            .await
        {
            error!("Failed to update record {}: {}", self.record_name, e);
            return (
                state,
                CycleOutcome::UpdateFailed {
                    ip,
                    reason,
                    error: e.to_string(),
                },
            );
        }

        info!("Record {} updated", self.record_name);

        let message = change_message(&self.record_name, &record.content, ip, reason);
        let notified = self.notify(&message).await;

        (
            SyncState {
                last_known_ip: Some(ip),
            },
            CycleOutcome::Updated {
                reason,
                previous_content: record.content,
                new_ip: ip,
                notified,
            },
        )
    }

    /// Send `message` if a notifier is configured; failures are only logged
    async fn notify(&self, message: &str) -> bool {
        let Some(notifier) = &self.notifier else {
            debug!("No notifier configured, skipping notification");
            return false;
        };

        match notifier.notify(message).await {
            Ok(()) => {
                debug!("Notification sent via {}", notifier.notifier_name());
                true
            }
            Err(e) => {
                warn!("Notification via {} failed: {}", notifier.notifier_name(), e);
                false
            }
        }
    }
}
