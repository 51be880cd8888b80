//! Fixed game constants.
//!
//! Unlike [`GameOptions`](cardczar_protocol::GameOptions), which the host
//! edits per room, these are set once for the whole server.

use std::time::Duration;

/// Server-wide rules every room plays by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRules {
    /// Active players needed to start, and to keep a game going.
    pub minimum_players: usize,

    /// Hard cap for the per-room `maximumPlayers` option.
    pub maximum_players: usize,

    /// Prompt cards dealt to the czar to choose from.
    pub black_cards_to_choose_from: usize,

    /// Hand size each active player is topped up to every round.
    pub starting_white_card_count: usize,

    /// Added to every phase timer so slow clients still make it.
    pub grace_period: Duration,

    /// Points taken from a czar who lets a decision time out.
    pub card_czar_punishment: i32,

    /// Points for winning a round.
    pub points_per_round: i32,

    pub player_name_max_len: usize,

    /// How long a room with nobody connected survives.
    pub inactive_room_ttl: Duration,

    /// Completed rounds kept in a room's history and sent to clients.
    pub round_history_limit: usize,

    /// How long clients show notifications, in milliseconds.
    pub notification_ms: u64,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            minimum_players: 3,
            maximum_players: 20,
            black_cards_to_choose_from: 3,
            starting_white_card_count: 10,
            grace_period: Duration::from_secs(2),
            card_czar_punishment: 1,
            points_per_round: 1,
            player_name_max_len: 50,
            inactive_room_ttl: Duration::from_secs(300),
            round_history_limit: 20,
            notification_ms: 5000,
        }
    }
}
