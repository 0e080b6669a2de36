//! The closed catalog of reminder types and their per-variant semantics.
//!
//! Every counter the engine can watch is one [`NotifyType`] variant. The
//! variant decides everything the scheduler needs to know about it: which
//! game it belongs to, whether it is threshold- or completion-style, which
//! direction a threshold comparison runs, how often the account is checked,
//! and the bounds user-supplied settings must satisfy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::game::Game;

// ---------------------------------------------------------------------------
// NotifyType
// ---------------------------------------------------------------------------

/// A tracked game counter a user can be reminded about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyType {
    /// Genshin resin (capped stamina resource).
    Resin,
    /// Genshin Serenitea Pot realm currency (rotating currency).
    RealmCurrency,
    /// Genshin parametric transformer cooldown completion.
    ParametricTransformer,
    /// Genshin expedition completion.
    GiExpedition,
    /// Star Rail trailblaze power (capped stamina resource).
    #[serde(rename = "tb_power")]
    TrailblazePower,
    /// Star Rail reserved trailblaze power (overflow reserve capacity).
    #[serde(rename = "reserved_tb_power")]
    ReservedTrailblazePower,
    /// Star Rail assignment (expedition) completion.
    HsrExpedition,
}

/// Whether a type fires on a numeric boundary or on task completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyStyle {
    /// Fires when the observed value crosses the configured threshold.
    Threshold(Direction),
    /// Fires once per newly-completed asynchronous task.
    Completion,
}

/// Comparison direction for threshold-style types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Fires while `value >= threshold` (accumulating resources).
    Above,
    /// Fires while `value < threshold` (draining reserve capacity).
    Below,
}

impl NotifyType {
    /// All known reminder types.
    pub const ALL: [NotifyType; 7] = [
        NotifyType::Resin,
        NotifyType::RealmCurrency,
        NotifyType::ParametricTransformer,
        NotifyType::GiExpedition,
        NotifyType::TrailblazePower,
        NotifyType::ReservedTrailblazePower,
        NotifyType::HsrExpedition,
    ];

    /// The game whose notes carry this counter.
    pub fn game(self) -> Game {
        match self {
            NotifyType::Resin
            | NotifyType::RealmCurrency
            | NotifyType::ParametricTransformer
            | NotifyType::GiExpedition => Game::Genshin,
            NotifyType::TrailblazePower
            | NotifyType::ReservedTrailblazePower
            | NotifyType::HsrExpedition => Game::StarRail,
        }
    }

    /// Evaluation style for this type.
    ///
    /// The reserved trailblaze power reserve drains as it refills the main
    /// stamina pool, so its threshold comparison runs in the opposite
    /// direction to the accumulating counters.
    pub fn style(self) -> NotifyStyle {
        match self {
            NotifyType::Resin | NotifyType::RealmCurrency | NotifyType::TrailblazePower => {
                NotifyStyle::Threshold(Direction::Above)
            }
            NotifyType::ReservedTrailblazePower => NotifyStyle::Threshold(Direction::Below),
            NotifyType::ParametricTransformer
            | NotifyType::GiExpedition
            | NotifyType::HsrExpedition => NotifyStyle::Completion,
        }
    }

    /// Fixed account-check cadence for this type, in minutes.
    ///
    /// Fast-moving stamina counters are checked every 10 minutes; everything
    /// else every 30.
    pub fn check_interval_minutes(self) -> i32 {
        match self {
            NotifyType::Resin | NotifyType::TrailblazePower => 10,
            _ => 30,
        }
    }

    /// Smallest notify interval a user may configure, in minutes.
    pub fn min_notify_interval_minutes(self) -> i32 {
        match self {
            NotifyType::Resin | NotifyType::TrailblazePower => 10,
            _ => 30,
        }
    }

    /// Largest meaningful threshold for threshold-style types.
    ///
    /// `None` for completion-style types, which take no threshold at all.
    pub fn threshold_max(self) -> Option<i32> {
        match self {
            NotifyType::Resin => Some(160),
            NotifyType::RealmCurrency => Some(2400),
            NotifyType::TrailblazePower => Some(240),
            NotifyType::ReservedTrailblazePower => Some(2400),
            NotifyType::ParametricTransformer
            | NotifyType::GiExpedition
            | NotifyType::HsrExpedition => None,
        }
    }

    /// Stable string code used in the database and in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            NotifyType::Resin => "resin",
            NotifyType::RealmCurrency => "realm_currency",
            NotifyType::ParametricTransformer => "parametric_transformer",
            NotifyType::GiExpedition => "gi_expedition",
            NotifyType::TrailblazePower => "tb_power",
            NotifyType::ReservedTrailblazePower => "reserved_tb_power",
            NotifyType::HsrExpedition => "hsr_expedition",
        }
    }
}

impl fmt::Display for NotifyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotifyType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotifyType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::UnknownCode(format!("notify type '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Settings validation
// ---------------------------------------------------------------------------

/// Validate user-supplied reminder settings against the type's bounds.
///
/// - threshold-style types require a threshold in `1..=threshold_max`
/// - completion-style types must not carry a threshold
/// - the notify interval must be at least the type's minimum
/// - the notify cap must be positive
pub fn validate_settings(
    ty: NotifyType,
    threshold: Option<i32>,
    notify_interval_minutes: i32,
    max_notify_count: i32,
) -> Result<(), CoreError> {
    match (ty.threshold_max(), threshold) {
        (Some(max), Some(value)) => {
            if !(1..=max).contains(&value) {
                return Err(CoreError::Validation(format!(
                    "{ty} threshold must be between 1 and {max}, got {value}"
                )));
            }
        }
        (Some(_), None) => {
            return Err(CoreError::Validation(format!("{ty} requires a threshold")));
        }
        (None, Some(_)) => {
            return Err(CoreError::Validation(format!(
                "{ty} does not take a threshold"
            )));
        }
        (None, None) => {}
    }

    let min_interval = ty.min_notify_interval_minutes();
    if notify_interval_minutes < min_interval {
        return Err(CoreError::Validation(format!(
            "{ty} notify interval must be at least {min_interval} minutes, got {notify_interval_minutes}"
        )));
    }

    if max_notify_count < 1 {
        return Err(CoreError::Validation(format!(
            "{ty} max notify count must be positive, got {max_notify_count}"
        )));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for ty in NotifyType::ALL {
            assert_eq!(ty.as_str().parse::<NotifyType>().unwrap(), ty);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!("stamina".parse::<NotifyType>().is_err());
    }

    #[test]
    fn threshold_types_have_a_max() {
        for ty in NotifyType::ALL {
            match ty.style() {
                NotifyStyle::Threshold(_) => assert!(ty.threshold_max().is_some(), "{ty}"),
                NotifyStyle::Completion => assert!(ty.threshold_max().is_none(), "{ty}"),
            }
        }
    }

    #[test]
    fn reserved_power_fires_below() {
        assert_eq!(
            NotifyType::ReservedTrailblazePower.style(),
            NotifyStyle::Threshold(Direction::Below)
        );
    }

    #[test]
    fn stamina_counters_check_fastest() {
        assert_eq!(NotifyType::Resin.check_interval_minutes(), 10);
        assert_eq!(NotifyType::TrailblazePower.check_interval_minutes(), 10);
        assert_eq!(NotifyType::RealmCurrency.check_interval_minutes(), 30);
        assert_eq!(NotifyType::GiExpedition.check_interval_minutes(), 30);
    }

    #[test]
    fn game_partition_is_consistent() {
        for ty in NotifyType::ALL {
            match ty {
                NotifyType::Resin
                | NotifyType::RealmCurrency
                | NotifyType::ParametricTransformer
                | NotifyType::GiExpedition => assert_eq!(ty.game(), Game::Genshin),
                _ => assert_eq!(ty.game(), Game::StarRail),
            }
        }
    }

    #[test]
    fn validate_accepts_threshold_in_range() {
        assert!(validate_settings(NotifyType::Resin, Some(150), 30, 3).is_ok());
        assert!(validate_settings(NotifyType::Resin, Some(160), 10, 1).is_ok());
    }

    #[test]
    fn validate_rejects_threshold_out_of_range() {
        assert!(validate_settings(NotifyType::Resin, Some(0), 30, 3).is_err());
        assert!(validate_settings(NotifyType::Resin, Some(161), 30, 3).is_err());
    }

    #[test]
    fn validate_rejects_missing_threshold() {
        assert!(validate_settings(NotifyType::TrailblazePower, None, 30, 3).is_err());
    }

    #[test]
    fn validate_rejects_threshold_on_completion_type() {
        assert!(validate_settings(NotifyType::GiExpedition, Some(5), 30, 3).is_err());
    }

    #[test]
    fn validate_enforces_min_notify_interval() {
        assert!(validate_settings(NotifyType::RealmCurrency, Some(2000), 29, 3).is_err());
        assert!(validate_settings(NotifyType::RealmCurrency, Some(2000), 30, 3).is_ok());
    }

    #[test]
    fn validate_rejects_non_positive_cap() {
        assert!(validate_settings(NotifyType::GiExpedition, None, 30, 0).is_err());
    }
}
