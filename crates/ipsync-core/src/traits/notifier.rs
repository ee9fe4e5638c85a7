// # Notifier Trait
//
// Side channel for telling the operator that the record changed.
//
// ## Implementations
//
// - Telegram bot API: `ipsync-notify-telegram` crate

use async_trait::async_trait;

/// Trait for notifier implementations
///
/// Delivery is best effort. The engine logs a returned error and carries on;
/// a notifier must never be the reason a cycle fails.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a short text message
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The message was accepted by every target
    /// - `Err(Error::Notify)`: At least one target rejected it
    async fn notify(&self, message: &str) -> Result<(), crate::Error>;

    /// Get the notifier name (for logging/debugging)
    fn notifier_name(&self) -> &'static str;
}
