//! Supported Hoyoverse games.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// The games an account can belong to.
///
/// Stored in the database as the snake_case codes returned by
/// [`as_str`](Self::as_str).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Game {
    /// Genshin Impact.
    Genshin,
    /// Honkai: Star Rail.
    StarRail,
}

impl Game {
    /// All supported games.
    pub const ALL: [Game; 2] = [Game::Genshin, Game::StarRail];

    /// Stable string code used in the database and in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Game::Genshin => "genshin",
            Game::StarRail => "star_rail",
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Game {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "genshin" => Ok(Game::Genshin),
            "star_rail" => Ok(Game::StarRail),
            other => Err(CoreError::UnknownCode(format!("game '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for game in Game::ALL {
            assert_eq!(game.as_str().parse::<Game>().unwrap(), game);
        }
    }

    #[test]
    fn rejects_unknown_code() {
        assert!("honkai".parse::<Game>().is_err());
    }
}
