// # ipsync-core
//
// Core library for the ipsync public-IP to DNS record synchronizer.
//
// ## Architecture Overview
//
// - **IpResolver**: Trait for learning the current public IPv4 address
// - **DnsRecordClient**: Trait for reading and writing one A record
// - **Notifier**: Trait for best-effort operator notifications
// - **SyncEngine**: The periodic resolve → compare → update → notify loop
// - **SyncConfig**: Static configuration loaded once at startup
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Components are plain HTTP wrappers; every decision lives in the engine
// 2. **Failure Isolation**: Only configuration errors are fatal; each cycle stands alone
// 3. **Explicit State**: The last known IP is a value passed through the loop, not a global

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{DnsRecord, DnsRecordClient, IpResolver, Notifier};
pub use engine::{CycleOutcome, SyncEngine, SyncState, UpdateReason};
pub use config::{ChatId, SyncConfig, TelegramConfig};
pub use error::{Error, Result};
