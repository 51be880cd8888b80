//! Per-room game options as they travel on the wire.
//!
//! Every field has a default, so a client may send a partial object;
//! unknown fields are ignored. Clamping into legal ranges is done by the
//! game layer, not here.

use serde::{Deserialize, Serialize};

use crate::PackId;

/// Options the host can change while the room is in the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameOptions {
    pub maximum_players: usize,
    pub win_conditions: WinConditions,
    pub timers: TimerOptions,
    pub winner_becomes_card_czar: bool,
    pub allow_kicked_player_join: bool,
    pub allow_card_czar_popular_vote: bool,
    pub card_packs: Vec<PackId>,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self {
            maximum_players: 10,
            win_conditions: WinConditions::default(),
            timers: TimerOptions::default(),
            winner_becomes_card_czar: false,
            allow_kicked_player_join: true,
            allow_card_czar_popular_vote: false,
            card_packs: Vec::new(),
        }
    }
}

/// When the game returns to the lobby on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WinConditions {
    pub score_limit: u32,
    pub use_score_limit: bool,
    pub round_limit: u32,
    pub use_round_limit: bool,
}

impl Default for WinConditions {
    fn default() -> Self {
        Self {
            score_limit: 5,
            use_score_limit: true,
            round_limit: 10,
            use_round_limit: false,
        }
    }
}

/// Per-phase time limits in seconds, each with its own on/off switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerOptions {
    pub select_black_card: u32,
    pub use_select_black_card: bool,
    pub select_white_cards: u32,
    pub use_select_white_cards: bool,
    pub read_black_card: u32,
    pub use_read_black_card: bool,
    pub select_winner: u32,
    pub use_select_winner: bool,
    pub round_end: u32,
    pub use_round_end: bool,
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            select_black_card: 30,
            use_select_black_card: true,
            select_white_cards: 60,
            use_select_white_cards: true,
            read_black_card: 60,
            use_read_black_card: true,
            select_winner: 45,
            use_select_winner: true,
            round_end: 15,
            use_round_end: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_options_fill_defaults() {
        let json = r#"{"maximumPlayers": 6, "timers": {"roundEnd": 20}}"#;
        let options: GameOptions = serde_json::from_str(json).unwrap();
        assert_eq!(options.maximum_players, 6);
        assert_eq!(options.timers.round_end, 20);
        assert_eq!(options.timers.select_black_card, 30);
        assert_eq!(options.win_conditions, WinConditions::default());
    }

    #[test]
    fn test_options_unknown_fields_are_ignored() {
        let json = r#"{"avatarStyle": "retro", "winnerBecomesCardCzar": true}"#;
        let options: GameOptions = serde_json::from_str(json).unwrap();
        assert!(options.winner_becomes_card_czar);
    }

    #[test]
    fn test_options_serialize_camel_case() {
        let json = serde_json::to_value(GameOptions::default()).unwrap();
        assert!(json["winConditions"]["useScoreLimit"].as_bool().unwrap());
        assert_eq!(json["timers"]["selectWhiteCards"], 60);
    }
}
