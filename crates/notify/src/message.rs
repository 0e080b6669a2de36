//! Notification message building.
//!
//! Turns a fired [`NotifyReason`] into the small embed-shaped payload the
//! delivery layer sends. Content is deliberately minimal: a title naming
//! the reminder, one line of state, and one line naming the account.

use sentinel_core::evaluate::NotifyReason;
use sentinel_core::notify::NotifyType;
use sentinel_db::models::Account;

/// Embed accent color.
const EMBED_COLOR: u32 = 0x8AC9E6;

/// A rendered notification, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyMessage {
    pub title: String,
    pub description: String,
    pub color: u32,
}

/// Human title for a reminder type.
fn title(ty: NotifyType) -> &'static str {
    match ty {
        NotifyType::Resin => "Resin Reminder",
        NotifyType::RealmCurrency => "Realm Currency Reminder",
        NotifyType::ParametricTransformer => "Parametric Transformer Reminder",
        NotifyType::GiExpedition | NotifyType::HsrExpedition => "Expedition Reminder",
        NotifyType::TrailblazePower => "Trailblaze Power Reminder",
        NotifyType::ReservedTrailblazePower => "Reserved Trailblaze Power Reminder",
    }
}

/// Counter label used in threshold state lines.
fn counter_label(ty: NotifyType) -> &'static str {
    match ty {
        NotifyType::Resin => "Resin",
        NotifyType::RealmCurrency => "Realm currency",
        NotifyType::TrailblazePower => "Trailblaze power",
        NotifyType::ReservedTrailblazePower => "Reserved trailblaze power",
        NotifyType::ParametricTransformer => "Parametric transformer",
        NotifyType::GiExpedition | NotifyType::HsrExpedition => "Expeditions",
    }
}

/// Build the notification for one fired reminder.
pub fn build(ty: NotifyType, account: &Account, reason: NotifyReason) -> NotifyMessage {
    let state_line = match reason {
        NotifyReason::ThresholdReached { current, threshold } => {
            format!("{}: {current} (threshold: {threshold})", counter_label(ty))
        }
        NotifyReason::TasksCompleted { newly_completed, total_finished } => match ty {
            NotifyType::ParametricTransformer => "Parametric transformer is ready".to_string(),
            _ => format!(
                "{newly_completed} newly finished ({total_finished} waiting to be collected)"
            ),
        },
    };

    NotifyMessage {
        title: title(ty).to_string(),
        description: format!(
            "{state_line}\nAccount: {} ({})",
            account.display_name(),
            account.uid
        ),
        color: EMBED_COLOR,
    }
}
