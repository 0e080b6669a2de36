//! The hoyo-sentinel notification engine.
//!
//! This crate wires the pure domain logic from `sentinel-core` to the
//! outside world:
//!
//! - [`NotesChecker`] — the periodic poll loop that scans due configs,
//!   fetches account state, evaluates reminder conditions, and dispatches.
//! - [`ConfigStore`], [`NotesFetcher`], [`NotifySender`] — the three
//!   collaborator seams the checker is built against, with production
//!   implementations backed by PostgreSQL, the Hoyolab API, and the
//!   Discord REST API respectively.
//! - [`DailyCheckin`] — the once-a-day sign-in reward claimer.

pub mod checkin;
pub mod delivery;
pub mod fetch;
pub mod message;
pub mod scheduler;
pub mod store;

pub use checkin::DailyCheckin;
pub use delivery::discord::DiscordDelivery;
pub use delivery::{NotifySender, SendError};
pub use fetch::{FetchError, HoyoNotesFetcher, NotesFetcher};
pub use message::NotifyMessage;
pub use scheduler::{CheckerConfig, NotesChecker, TickSummary};
pub use store::{ConfigStore, PgConfigStore};
