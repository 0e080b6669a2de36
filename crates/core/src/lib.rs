//! Pure domain logic for the hoyo-sentinel notification engine.
//!
//! This crate holds everything that can be reasoned about without IO:
//!
//! - [`notify::NotifyType`] — the closed catalog of tracked game counters
//!   and their per-variant semantics (style, direction, intervals, limits).
//! - [`evaluate`] — the threshold/completion evaluator.
//! - [`backoff`] — the dispatch gate (cooldown, cap, reset-on-clear).
//! - [`game::Game`] — the supported games.
//!
//! It has zero internal dependencies so it can be used by the persistence
//! layer, the scheduler, and any future CLI tooling alike.

pub mod backoff;
pub mod error;
pub mod evaluate;
pub mod game;
pub mod notify;
pub mod types;

pub use error::CoreError;
