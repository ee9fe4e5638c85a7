//! Update decision and operator message framing

use std::fmt;
use std::net::Ipv4Addr;

use crate::traits::DnsRecord;

/// Why a cycle writes the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateReason {
    /// Record content differs from the public IP
    AddressChanged,
    /// Content is current but the record is proxied
    ProxyEnabled,
    /// Both of the above
    AddressChangedAndProxyEnabled,
}

impl UpdateReason {
    /// Whether the record content changes
    pub fn changes_address(self) -> bool {
        matches!(
            self,
            UpdateReason::AddressChanged | UpdateReason::AddressChangedAndProxyEnabled
        )
    }

    /// Whether the proxied flag flips to false
    pub fn disables_proxy(self) -> bool {
        matches!(
            self,
            UpdateReason::ProxyEnabled | UpdateReason::AddressChangedAndProxyEnabled
        )
    }
}

impl fmt::Display for UpdateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateReason::AddressChanged => f.write_str("address changed"),
            UpdateReason::ProxyEnabled => f.write_str("proxy enabled"),
            UpdateReason::AddressChangedAndProxyEnabled => {
                f.write_str("address changed, proxy enabled")
            }
        }
    }
}

/// Decide whether `record` must be rewritten for `current_ip`
///
/// The record must end up DNS-only: a proxied record is corrected even when
/// its content already matches.
pub fn decide_update(record: &DnsRecord, current_ip: Ipv4Addr) -> Option<UpdateReason> {
    let address_changed = record.content.trim() != current_ip.to_string();

    match (address_changed, record.proxied) {
        (false, false) => None,
        (true, false) => Some(UpdateReason::AddressChanged),
        (false, true) => Some(UpdateReason::ProxyEnabled),
        (true, true) => Some(UpdateReason::AddressChangedAndProxyEnabled),
    }
}

/// Human-readable notification text for a successful update
pub fn change_message(
    record_name: &str,
    previous_content: &str,
    new_ip: Ipv4Addr,
    reason: UpdateReason,
) -> String {
    if !reason.changes_address() {
        return format!("Proxy disabled for {record_name} ({new_ip})");
    }

    let mut message = format!("Public IP for {record_name} updated:\n{previous_content} -> {new_ip}");
    if reason.disables_proxy() {
        message.push_str("\nProxy disabled");
    }
    message
}
