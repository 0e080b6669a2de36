//! Discord REST delivery.
//!
//! [`DiscordDelivery`] posts a notification as an embed to the account's
//! configured channel. A 401/403/404 means the bot can no longer reach the
//! target and is permanent; everything else is transient and retried once
//! after a short delay.

use std::time::Duration;

use async_trait::async_trait;

use sentinel_db::models::Account;

use crate::delivery::{NotifySender, SendError};
use crate::message::NotifyMessage;

/// Discord REST API base.
const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay before the single transient-failure retry.
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Delivers notifications to Discord channels via the REST API.
pub struct DiscordDelivery {
    client: reqwest::Client,
    token: String,
    api_base: String,
}

impl DiscordDelivery {
    /// Create a delivery service authenticating with the given bot token.
    pub fn new(token: String) -> Result<Self, reqwest::Error> {
        Self::with_api_base(token, DEFAULT_API_BASE.to_string())
    }

    /// Create a delivery service against a non-default API base (tests,
    /// proxies).
    pub fn with_api_base(token: String, api_base: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            token,
            api_base,
        })
    }

    /// Execute a single create-message request and classify the outcome.
    async fn try_send(
        &self,
        channel_id: i64,
        payload: &serde_json::Value,
    ) -> Result<(), SendError> {
        let url = format!("{}/channels/{channel_id}/messages", self.api_base);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(payload)
            .send()
            .await
            .map_err(|e| SendError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        match status.as_u16() {
            401 | 403 | 404 => Err(SendError::Permanent(format!("Discord returned {status}"))),
            _ => Err(SendError::Transient(format!("Discord returned {status}"))),
        }
    }
}

#[async_trait]
impl NotifySender for DiscordDelivery {
    async fn send(&self, account: &Account, message: &NotifyMessage) -> Result<(), SendError> {
        let payload = serde_json::json!({
            "embeds": [{
                "title": message.title,
                "description": message.description,
                "color": message.color,
            }]
        });

        match self.try_send(account.discord_channel_id, &payload).await {
            Ok(()) => Ok(()),
            Err(SendError::Transient(first)) => {
                tracing::warn!(
                    account_id = account.id,
                    channel_id = account.discord_channel_id,
                    error = %first,
                    "Delivery attempt failed, retrying once"
                );
                tokio::time::sleep(RETRY_DELAY).await;
                self.try_send(account.discord_channel_id, &payload).await
            }
            Err(permanent) => Err(permanent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_does_not_fail() {
        assert!(DiscordDelivery::new("token".into()).is_ok());
    }

    #[test]
    fn send_error_display() {
        let err = SendError::Permanent("Discord returned 404 Not Found".into());
        assert_eq!(
            err.to_string(),
            "Permanent delivery failure: Discord returned 404 Not Found"
        );
    }
}
