//! REST client for the overseas Hoyolab endpoints.
//!
//! Wraps the game-record notes endpoints and the daily check-in sign
//! endpoints using [`reqwest`]. Every response uses the common
//! `{ retcode, message, data }` envelope; [`HoyoError`] distinguishes dead
//! credentials from upstream/API failures so the scheduler can apply the
//! right policy per account.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use sentinel_core::game::Game;

use crate::ds;
use crate::notes::{GenshinNotes, NotesSnapshot, StarRailNotes};

/// Base URL for game-record endpoints.
const RECORD_BASE: &str = "https://bbs-api-os.hoyolab.com";

/// Base URL + activity id for the Genshin daily check-in event.
const GENSHIN_SIGN_BASE: &str = "https://sg-hk4e-api.hoyolab.com";
const GENSHIN_SIGN_ACT_ID: &str = "e202102251931481";

/// Base URL + activity id for the Star Rail daily check-in event.
const HSR_SIGN_BASE: &str = "https://sg-public-api.hoyolab.com";
const HSR_SIGN_ACT_ID: &str = "e202303301540311";

/// HTTP request timeout for a single API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Retcodes that mean the account's cookies are invalid or expired.
const INVALID_COOKIE_RETCODES: [i32; 3] = [-100, 10001, 10103];

/// Retcode returned when today's check-in reward was already claimed.
const RETCODE_ALREADY_SIGNED: i32 = -5003;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Errors from the Hoyolab API layer.
#[derive(Debug, thiserror::Error)]
pub enum HoyoError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The account's cookies were rejected.
    #[error("Credentials rejected (retcode {retcode})")]
    InvalidCookies { retcode: i32 },

    /// The API returned a non-zero retcode other than a credential failure.
    #[error("Hoyolab API error (retcode {retcode}): {message}")]
    Api { retcode: i32, message: String },

    /// The response envelope was missing data or otherwise unparseable.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The uid does not map to a known overseas server.
    #[error("No known {game} server for uid {uid}")]
    UnknownServer { game: Game, uid: i64 },
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The common response envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    retcode: i32,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwrap the envelope, mapping non-zero retcodes to errors.
    fn into_data(self) -> Result<T, HoyoError> {
        if INVALID_COOKIE_RETCODES.contains(&self.retcode) {
            return Err(HoyoError::InvalidCookies {
                retcode: self.retcode,
            });
        }
        if self.retcode != 0 {
            return Err(HoyoError::Api {
                retcode: self.retcode,
                message: self.message,
            });
        }
        self.data
            .ok_or_else(|| HoyoError::MalformedResponse("retcode 0 but no data".into()))
    }
}

// ---------------------------------------------------------------------------
// Server regions
// ---------------------------------------------------------------------------

/// Map a Genshin uid to its overseas server code.
pub fn genshin_server(uid: i64) -> Result<&'static str, HoyoError> {
    match leading_digit(uid) {
        6 => Ok("os_usa"),
        7 => Ok("os_euro"),
        8 => Ok("os_asia"),
        9 => Ok("os_cht"),
        _ => Err(HoyoError::UnknownServer {
            game: Game::Genshin,
            uid,
        }),
    }
}

/// Map a Star Rail uid to its overseas server code.
pub fn starrail_server(uid: i64) -> Result<&'static str, HoyoError> {
    match leading_digit(uid) {
        6 => Ok("prod_official_usa"),
        7 => Ok("prod_official_eur"),
        8 => Ok("prod_official_asia"),
        9 => Ok("prod_official_cht"),
        _ => Err(HoyoError::UnknownServer {
            game: Game::StarRail,
            uid,
        }),
    }
}

fn leading_digit(uid: i64) -> i64 {
    let mut n = uid.abs();
    while n >= 10 {
        n /= 10;
    }
    n
}

// ---------------------------------------------------------------------------
// HoyoApi
// ---------------------------------------------------------------------------

/// Outcome of a daily check-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckinOutcome {
    /// The reward was claimed by this call.
    Claimed,
    /// The reward had already been claimed today.
    AlreadyClaimed,
}

/// HTTP client for the overseas Hoyolab API.
pub struct HoyoApi {
    client: reqwest::Client,
}

impl HoyoApi {
    /// Create a new API client with a pre-configured HTTP client.
    pub fn new() -> Result<Self, HoyoError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch the notes snapshot for an account.
    pub async fn fetch_notes(
        &self,
        game: Game,
        uid: i64,
        cookies: &serde_json::Value,
    ) -> Result<NotesSnapshot, HoyoError> {
        match game {
            Game::Genshin => Ok(NotesSnapshot::Genshin(
                self.genshin_notes(uid, cookies).await?,
            )),
            Game::StarRail => Ok(NotesSnapshot::StarRail(
                self.starrail_notes(uid, cookies).await?,
            )),
        }
    }

    /// Fetch the Genshin real-time daily note.
    pub async fn genshin_notes(
        &self,
        uid: i64,
        cookies: &serde_json::Value,
    ) -> Result<GenshinNotes, HoyoError> {
        let server = genshin_server(uid)?;
        let url = format!(
            "{RECORD_BASE}/game_record/genshin/api/dailyNote?role_id={uid}&server={server}"
        );
        self.get_record(&url, cookies).await
    }

    /// Fetch the Star Rail real-time note.
    pub async fn starrail_notes(
        &self,
        uid: i64,
        cookies: &serde_json::Value,
    ) -> Result<StarRailNotes, HoyoError> {
        let server = starrail_server(uid)?;
        let url = format!("{RECORD_BASE}/game_record/hsr/api/note?role_id={uid}&server={server}");
        self.get_record(&url, cookies).await
    }

    /// Claim the daily check-in reward for an account's game.
    ///
    /// An already-claimed response is reported as a distinct success, not
    /// an error, so the caller can stamp the account either way.
    pub async fn claim_daily(
        &self,
        game: Game,
        cookies: &serde_json::Value,
    ) -> Result<CheckinOutcome, HoyoError> {
        let (base, act_id, path) = match game {
            Game::Genshin => (GENSHIN_SIGN_BASE, GENSHIN_SIGN_ACT_ID, "event/sol/sign"),
            Game::StarRail => (HSR_SIGN_BASE, HSR_SIGN_ACT_ID, "event/luna/os/sign"),
        };

        let response = self
            .client
            .post(format!("{base}/{path}"))
            .header("Cookie", cookie_header(cookies))
            .header("x-rpc-app_version", "1.5.0")
            .header("x-rpc-client_type", "5")
            .header("x-rpc-language", "en-us")
            .json(&serde_json::json!({ "act_id": act_id }))
            .send()
            .await?;

        let envelope: Envelope<serde_json::Value> = response.json().await?;
        match envelope.retcode {
            0 => Ok(CheckinOutcome::Claimed),
            RETCODE_ALREADY_SIGNED => Ok(CheckinOutcome::AlreadyClaimed),
            retcode if INVALID_COOKIE_RETCODES.contains(&retcode) => {
                Err(HoyoError::InvalidCookies { retcode })
            }
            retcode => Err(HoyoError::Api {
                retcode,
                message: envelope.message,
            }),
        }
    }

    /// Execute a DS-signed game-record GET and unwrap the envelope.
    async fn get_record<T: DeserializeOwned>(
        &self,
        url: &str,
        cookies: &serde_json::Value,
    ) -> Result<T, HoyoError> {
        let response = self
            .client
            .get(url)
            .header("Cookie", cookie_header(cookies))
            .header("DS", ds::generate())
            .header("x-rpc-app_version", "1.5.0")
            .header("x-rpc-client_type", "5")
            .header("x-rpc-language", "en-us")
            .send()
            .await?;

        let status = response.status().as_u16();
        let envelope: Envelope<T> = response.json().await?;
        tracing::debug!(url, status, retcode = envelope.retcode, "Game record fetched");
        envelope.into_data()
    }
}

/// Render a stored cookie map as a `Cookie` header value.
///
/// Non-string values are skipped; the upstream only ever issues string
/// cookies.
fn cookie_header(cookies: &serde_json::Value) -> String {
    let Some(map) = cookies.as_object() else {
        return String::new();
    };
    map.iter()
        .filter_map(|(k, v)| v.as_str().map(|v| format!("{k}={v}")))
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
