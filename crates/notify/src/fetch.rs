//! Notes-fetcher collaborator seam.
//!
//! [`NotesFetcher`] reduces the game-API client's error surface to the two
//! cases the scheduler's policy distinguishes: dead credentials (permanent
//! for the whole account) and everything else (retry next due tick).

use async_trait::async_trait;

use sentinel_db::models::Account;
use sentinel_hoyo::{HoyoApi, HoyoError, NotesSnapshot};

/// Fetch failure, reduced to the scheduler's policy taxonomy.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The account's credentials are invalid or unusable. The scheduler
    /// disables all of the account's configs.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Anything retry-eligible: network trouble, rate limits, upstream
    /// hiccups, malformed payloads.
    #[error("Transient fetch failure: {0}")]
    Transient(String),
}

/// Fetches the current notes snapshot for an account.
#[async_trait]
pub trait NotesFetcher: Send + Sync {
    async fn fetch_notes(&self, account: &Account) -> Result<NotesSnapshot, FetchError>;
}

/// Production fetcher over the Hoyolab API client.
pub struct HoyoNotesFetcher {
    api: HoyoApi,
}

impl HoyoNotesFetcher {
    /// Create a fetcher owning the given API client.
    pub fn new(api: HoyoApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl NotesFetcher for HoyoNotesFetcher {
    async fn fetch_notes(&self, account: &Account) -> Result<NotesSnapshot, FetchError> {
        let game = account
            .game
            .parse()
            .map_err(|e| FetchError::Transient(format!("account {}: {e}", account.id)))?;

        self.api
            .fetch_notes(game, account.uid, &account.cookies)
            .await
            .map_err(|e| match e {
                HoyoError::InvalidCookies { .. } => FetchError::Auth(e.to_string()),
                // A uid with no reachable server will never succeed either.
                HoyoError::UnknownServer { .. } => FetchError::Auth(e.to_string()),
                HoyoError::Request(_) | HoyoError::Api { .. } | HoyoError::MalformedResponse(_) => {
                    FetchError::Transient(e.to_string())
                }
            })
    }
}
