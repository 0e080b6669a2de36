//! Game account models and DTOs.

use serde::{Deserialize, Serialize};
use sentinel_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `accounts` table: one linked game account.
///
/// `cookies` is the opaque Hoyolab auth cookie map; the engine only ever
/// forwards it to the game API client.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Account {
    pub id: DbId,
    pub uid: i64,
    pub game: String,
    pub username: String,
    pub nickname: Option<String>,
    pub cookies: serde_json::Value,
    pub discord_user_id: i64,
    pub discord_channel_id: i64,
    pub daily_checkin: bool,
    pub last_checkin_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Account {
    /// Short display handle used in log fields and message footers.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.username)
    }
}

/// DTO for linking (or re-linking) an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccount {
    pub uid: i64,
    pub game: String,
    pub username: String,
    pub nickname: Option<String>,
    pub cookies: serde_json::Value,
    pub discord_user_id: i64,
    pub discord_channel_id: i64,
}
