//! Outward (redacted) views of a room.
//!
//! These types are the only shapes the server ever sends about a room.
//! They are built by explicit projection functions in `cardczar-game`,
//! so a field added to the internal room never leaks by accident: it has
//! to be added here first.

use serde::{Deserialize, Serialize};

use crate::{BlackCard, GameId, GameOptions, PlayerId, PublicId, WhiteCard};

/// Phase of a room as clients see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    Lobby,
    PickingBlackCard,
    PlayingWhiteCards,
    ReadingCards,
    ShowingCards,
    RoundEnd,
}

/// Lifecycle state of a player as clients see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerStatus {
    PickingName,
    Joining,
    Active,
    Playing,
    Waiting,
    Spectating,
    Disconnected,
}

/// The room, minus everything private.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub id: GameId,
    pub state: GamePhase,
    pub options: GameOptions,
    /// Completed rounds, oldest first.
    pub rounds: Vec<RoundView>,
    pub current_round: Option<RoundView>,
    pub timers: TimerView,
}

/// One round. Which submissions appear, and whether they carry their
/// owner, depends on the phase the round is in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    pub round: u32,
    pub black_card: BlackCard,
    pub card_czar: Option<PublicId>,
    /// Always the true number of submissions, even while their content
    /// is hidden.
    pub submission_count: usize,
    pub submissions: Vec<SubmissionView>,
}

/// One player's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    /// `None` until the round has ended.
    pub player: Option<PublicId>,
    pub white_cards: Vec<WhiteCard>,
    pub won_round: bool,
    pub popular_vote: u32,
}

/// The active phase timer, in whole seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    pub duration: Option<u32>,
    pub passed_time: Option<u32>,
}

/// Another player, as everybody sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub public_id: PublicId,
    pub name: String,
    pub state: PlayerStatus,
    pub score: i32,
    pub is_card_czar: bool,
    pub is_host: bool,
}

/// The receiving player's own record, including their hand and token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnPlayerView {
    pub id: PlayerId,
    pub public_id: PublicId,
    pub name: String,
    pub state: PlayerStatus,
    pub score: i32,
    pub popular_vote_score: u32,
    pub is_card_czar: bool,
    pub is_host: bool,
    pub white_cards: Vec<WhiteCard>,
}
