//! Notification delivery.
//!
//! [`NotifySender`] is the dispatch collaborator seam; [`discord`] holds
//! the production implementation posting embeds over the Discord REST API.

use async_trait::async_trait;

use sentinel_db::models::Account;

use crate::message::NotifyMessage;

pub mod discord;

/// Delivery failure, reduced to the scheduler's policy taxonomy.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SendError {
    /// The dispatch target is gone (channel deleted, permissions revoked).
    /// The scheduler disables the affected config.
    #[error("Permanent delivery failure: {0}")]
    Permanent(String),

    /// Retry-eligible: the scheduler leaves dispatch state untouched and
    /// the next due tick tries again.
    #[error("Transient delivery failure: {0}")]
    Transient(String),
}

/// Sends one rendered notification to an account's dispatch target.
///
/// Implementations retry transient failures at most once internally; they
/// never retry indefinitely.
#[async_trait]
pub trait NotifySender: Send + Sync {
    async fn send(&self, account: &Account, message: &NotifyMessage) -> Result<(), SendError>;
}
