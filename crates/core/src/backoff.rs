//! Dispatch gating: cooldown, cap, and reset-on-clear.
//!
//! The scheduler funnels every would-be notification through
//! [`should_dispatch`]. Three gates must all hold: the config is enabled,
//! the notify-count cap has not been reached, and the per-config cooldown
//! has elapsed. [`reset_on_clear`] re-arms the cap when the underlying
//! condition stops holding, so a user who lets a reminder lapse is notified
//! again the next time the condition re-triggers.

use chrono::Duration;

use crate::types::Timestamp;

/// The dispatch-relevant slice of a notify config's state.
///
/// Mutations happen through [`record_dispatch`] and [`reset_on_clear`];
/// the caller persists the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchState {
    pub enabled: bool,
    pub notify_interval_minutes: i32,
    pub max_notify_count: i32,
    pub current_notify_count: i32,
    pub last_notify_at: Option<Timestamp>,
}

/// Whether a notification may be dispatched now.
pub fn should_dispatch(state: &DispatchState, now: Timestamp) -> bool {
    if !state.enabled {
        return false;
    }
    if state.current_notify_count >= state.max_notify_count {
        return false;
    }
    match state.last_notify_at {
        None => true,
        Some(last) => now - last >= Duration::minutes(i64::from(state.notify_interval_minutes)),
    }
}

/// Record a successful dispatch: bump the count and stamp the time.
///
/// The count saturates at the cap so replays can never push it past
/// `max_notify_count`.
pub fn record_dispatch(state: &mut DispatchState, now: Timestamp) {
    state.current_notify_count = (state.current_notify_count + 1).min(state.max_notify_count);
    state.last_notify_at = Some(now);
}

/// Re-arm the cap after the underlying condition cleared.
pub fn reset_on_clear(state: &mut DispatchState) {
    state.current_notify_count = 0;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
