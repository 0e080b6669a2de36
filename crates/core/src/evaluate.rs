//! Reminder condition evaluation.
//!
//! [`evaluate`] is a pure function from one observation of a counter to a
//! [`NotifyDecision`]. Threshold-style types compare the observed value
//! against the configured boundary in the type's direction; completion-style
//! types fire edge-triggered on newly-completed tasks, using the persisted
//! prior observation so a restart does not replay old completions.

use crate::notify::{Direction, NotifyStyle, NotifyType};

// ---------------------------------------------------------------------------
// Inputs / outputs
// ---------------------------------------------------------------------------

/// One observation of a counter, as extracted from a notes snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    /// The value observed this check. For completion-style types this is the
    /// number of finished-and-uncollected tasks (0 or 1 for single-slot
    /// cooldowns like the parametric transformer).
    pub current: i32,
    /// The value persisted from the previous check, if any.
    pub prior: Option<i32>,
    /// The configured threshold, for threshold-style types.
    pub threshold: Option<i32>,
}

/// Why a notification should fire. Carried into the message builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyReason {
    /// A threshold-style counter crossed its boundary.
    ThresholdReached { current: i32, threshold: i32 },
    /// One or more completion-style tasks newly finished.
    TasksCompleted { newly_completed: i32, total_finished: i32 },
}

/// The outcome of evaluating one config against one observation.
#[derive(Debug, Clone, Copy)]
pub struct NotifyDecision {
    /// Whether a notification is warranted this check (before dispatch
    /// gating).
    pub should_notify: bool,
    /// Whether the underlying condition currently holds. The scheduler
    /// resets the notify count when this goes false, re-arming the cap.
    pub condition_active: bool,
    /// Present iff `should_notify`.
    pub reason: Option<NotifyReason>,
}

impl NotifyDecision {
    fn quiet(condition_active: bool) -> Self {
        Self {
            should_notify: false,
            condition_active,
            reason: None,
        }
    }

    fn fire(reason: NotifyReason) -> Self {
        Self {
            should_notify: true,
            condition_active: true,
            reason: Some(reason),
        }
    }
}

/// Data problems that make an observation unevaluable.
///
/// These are contained by the scheduler as transient per-config failures;
/// they never abort a tick.
#[derive(Debug, thiserror::Error)]
pub enum EvaluateError {
    #[error("{0} is threshold-style but no threshold is configured")]
    MissingThreshold(NotifyType),
}

// ---------------------------------------------------------------------------
// evaluate
// ---------------------------------------------------------------------------

/// Evaluate one observation for one notify type.
pub fn evaluate(ty: NotifyType, obs: Observation) -> Result<NotifyDecision, EvaluateError> {
    match ty.style() {
        NotifyStyle::Threshold(direction) => {
            let threshold = obs.threshold.ok_or(EvaluateError::MissingThreshold(ty))?;
            let crossed = match direction {
                Direction::Above => obs.current >= threshold,
                Direction::Below => obs.current < threshold,
            };
            if crossed {
                Ok(NotifyDecision::fire(NotifyReason::ThresholdReached {
                    current: obs.current,
                    threshold,
                }))
            } else {
                Ok(NotifyDecision::quiet(false))
            }
        }
        NotifyStyle::Completion => {
            // Edge-triggered: only tasks that finished since the last
            // persisted observation count. An unknown prior (first check
            // after creation or restart) never fires.
            let newly_completed = match obs.prior {
                Some(prior) => obs.current - prior,
                None => 0,
            };
            if newly_completed > 0 {
                Ok(NotifyDecision::fire(NotifyReason::TasksCompleted {
                    newly_completed,
                    total_finished: obs.current,
                }))
            } else {
                Ok(NotifyDecision::quiet(obs.current > 0))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
