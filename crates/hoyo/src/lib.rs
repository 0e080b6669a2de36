//! Hoyolab game-API client.
//!
//! [`HoyoApi`] wraps the overseas Hoyolab endpoints the engine needs:
//! real-time notes for Genshin Impact and Honkai: Star Rail, and the daily
//! check-in sign endpoints. Responses arrive in the standard
//! `{ retcode, message, data }` envelope; retcodes are mapped to a small
//! error taxonomy so callers can tell dead credentials from a flaky
//! upstream.

pub mod api;
pub mod ds;
pub mod notes;

pub use api::{CheckinOutcome, HoyoApi, HoyoError};
pub use notes::NotesSnapshot;
