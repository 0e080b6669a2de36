//! Real-time notes data model.
//!
//! Typed views of the `dailyNote` (Genshin) and `note` (Star Rail)
//! endpoint payloads, plus [`NotesSnapshot::observed_value`], the single
//! mapping from a raw snapshot to the counter value a notify type watches.

use serde::Deserialize;

use sentinel_core::game::Game;
use sentinel_core::notify::NotifyType;

// ---------------------------------------------------------------------------
// Genshin
// ---------------------------------------------------------------------------

/// Payload of `game_record/genshin/api/dailyNote`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenshinNotes {
    pub current_resin: i32,
    pub max_resin: i32,
    #[serde(default)]
    pub current_home_coin: i32,
    #[serde(default)]
    pub max_home_coin: i32,
    #[serde(default)]
    pub expeditions: Vec<GenshinExpedition>,
    /// Absent for accounts that have not unlocked the transformer.
    #[serde(default)]
    pub transformer: Option<Transformer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenshinExpedition {
    pub status: ExpeditionStatus,
    /// Seconds until completion, as a decimal string.
    #[serde(default)]
    pub remained_time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Transformer {
    pub obtained: bool,
    pub recovery_time: TransformerRecovery,
}

/// The transformer cooldown clock. Field names are capitalized upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformerRecovery {
    #[serde(rename = "Day")]
    pub day: i32,
    #[serde(rename = "Hour")]
    pub hour: i32,
    #[serde(rename = "Minute")]
    pub minute: i32,
    #[serde(rename = "Second")]
    pub second: i32,
    pub reached: bool,
}

// ---------------------------------------------------------------------------
// Star Rail
// ---------------------------------------------------------------------------

/// Payload of `game_record/hsr/api/note`.
#[derive(Debug, Clone, Deserialize)]
pub struct StarRailNotes {
    pub current_stamina: i32,
    pub max_stamina: i32,
    #[serde(default)]
    pub stamina_recover_time: i64,
    #[serde(default)]
    pub current_reserve_stamina: i32,
    #[serde(default)]
    pub is_reserve_stamina_full: bool,
    #[serde(default)]
    pub expeditions: Vec<StarRailExpedition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StarRailExpedition {
    pub status: ExpeditionStatus,
    /// Seconds until completion.
    #[serde(default)]
    pub remaining_time: i64,
    #[serde(default)]
    pub name: String,
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Expedition state as reported by both games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ExpeditionStatus {
    Ongoing,
    Finished,
    #[serde(other)]
    Unknown,
}

/// One account's notes, tagged by game.
#[derive(Debug, Clone)]
pub enum NotesSnapshot {
    Genshin(GenshinNotes),
    StarRail(StarRailNotes),
}

impl NotesSnapshot {
    /// The game this snapshot belongs to.
    pub fn game(&self) -> Game {
        match self {
            NotesSnapshot::Genshin(_) => Game::Genshin,
            NotesSnapshot::StarRail(_) => Game::StarRail,
        }
    }

    /// Extract the counter value a notify type watches.
    ///
    /// Returns `None` when the snapshot cannot answer for this type: wrong
    /// game, or a transformer reminder on an account without one. Callers
    /// treat that as a transient data problem, not an error.
    pub fn observed_value(&self, ty: NotifyType) -> Option<i32> {
        match (self, ty) {
            (NotesSnapshot::Genshin(notes), NotifyType::Resin) => Some(notes.current_resin),
            (NotesSnapshot::Genshin(notes), NotifyType::RealmCurrency) => {
                Some(notes.current_home_coin)
            }
            (NotesSnapshot::Genshin(notes), NotifyType::ParametricTransformer) => {
                let transformer = notes.transformer.as_ref()?;
                if !transformer.obtained {
                    return None;
                }
                Some(i32::from(transformer.recovery_time.reached))
            }
            (NotesSnapshot::Genshin(notes), NotifyType::GiExpedition) => Some(
                notes
                    .expeditions
                    .iter()
                    .filter(|e| e.status == ExpeditionStatus::Finished)
                    .count() as i32,
            ),
            (NotesSnapshot::StarRail(notes), NotifyType::TrailblazePower) => {
                Some(notes.current_stamina)
            }
            (NotesSnapshot::StarRail(notes), NotifyType::ReservedTrailblazePower) => {
                Some(notes.current_reserve_stamina)
            }
            (NotesSnapshot::StarRail(notes), NotifyType::HsrExpedition) => Some(
                notes
                    .expeditions
                    .iter()
                    .filter(|e| e.status == ExpeditionStatus::Finished)
                    .count() as i32,
            ),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
