//! # Journal Port
//!
//! Append-only log of [`JournalMessage`]s. A message is durable once
//! `record` returns.

use crate::domain::JournalMessage;
use crate::errors::JournalError;
use async_trait::async_trait;

/// Deployment journal - outbound port.
#[async_trait]
pub trait Journal: Send + Sync {
    /// Appends one message.
    async fn record(&self, message: &JournalMessage) -> Result<(), JournalError>;

    /// Every message recorded so far, oldest first.
    async fn read(&self) -> Result<Vec<JournalMessage>, JournalError>;
}
