//! Inbound and outbound events.
//!
//! Every frame in either direction is a JSON object of the form
//! `{"event": "<name>", "data": {...}}`.
//!
//! Inbound frames are parsed in two steps: first the required field
//! names for the event are checked for presence, then the typed payload
//! is decoded. Keeping the presence check separate lets the server tell
//! the sender exactly which fields were missing, while any other decode
//! failure is dropped silently.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    BlackCard, CardId, GameId, GameOptions, GameView, OwnPlayerView, PackId, PlayerId,
    PlayerView, ProtocolError, PublicId, WhiteCard,
};

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// A parsed inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// `join_game`: both fields are optional. A known `player_id`
    /// reattaches to its room even without a `game_id`.
    JoinGame {
        game_id: Option<GameId>,
        player_id: Option<PlayerId>,
    },

    /// Every other event: an action by a seated player.
    Action {
        game_id: GameId,
        player_id: PlayerId,
        action: PlayerAction,
    },
}

/// What a seated player wants to do.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerAction {
    Leave,
    StartGame,
    SelectBlackCard {
        selected: CardId,
        discarded: Vec<CardId>,
    },
    PlayWhiteCards(Vec<CardId>),
    ShowNextWhiteCard,
    PickWinningCard(Vec<CardId>),
    GivePopularVote(Vec<CardId>),
    SetPlayerName(String),
    TogglePlayerMode,
    UpdateGameOptions(GameOptions),
    AddCardPack(PackId),
    RemoveCardPack(PackId),
    DrawBlackCards,
    StartRound,
    ReturnToLobby,
    KickPlayer {
        target: PublicId,
        remove_from_game: bool,
    },
}

impl PlayerAction {
    /// The wire name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Leave => "leave_game",
            Self::StartGame => "start_game",
            Self::SelectBlackCard { .. } => "select_black_card",
            Self::PlayWhiteCards(_) => "play_white_cards",
            Self::ShowNextWhiteCard => "show_next_white_card",
            Self::PickWinningCard(_) => "pick_winning_card",
            Self::GivePopularVote(_) => "give_popular_vote",
            Self::SetPlayerName(_) => "set_player_name",
            Self::TogglePlayerMode => "toggle_player_mode",
            Self::UpdateGameOptions(_) => "update_game_options",
            Self::AddCardPack(_) => "add_card_pack",
            Self::RemoveCardPack(_) => "remove_card_pack",
            Self::DrawBlackCards => "draw_black_cards",
            Self::StartRound => "start_round",
            Self::ReturnToLobby => "return_to_lobby",
            Self::KickPlayer { .. } => "kick_player",
        }
    }
}

#[derive(Deserialize)]
struct Frame {
    event: String,
    #[serde(default)]
    data: Value,
}

#[derive(Deserialize)]
struct JoinData {
    #[serde(rename = "gameID", default)]
    game_id: Option<GameId>,
    #[serde(rename = "playerID", default)]
    player_id: Option<PlayerId>,
}

#[derive(Deserialize)]
struct Seat {
    #[serde(rename = "gameID")]
    game_id: GameId,
    #[serde(rename = "playerID")]
    player_id: PlayerId,
}

#[derive(Deserialize)]
struct SelectBlackCardData {
    #[serde(rename = "selectedCardID")]
    selected: CardId,
    #[serde(rename = "discardedCardIDs")]
    discarded: Vec<CardId>,
}

#[derive(Deserialize)]
struct WhiteCardsData {
    #[serde(rename = "whiteCardIDs")]
    cards: Vec<CardId>,
}

#[derive(Deserialize)]
struct NameData {
    #[serde(rename = "playerName")]
    name: String,
}

#[derive(Deserialize)]
struct OptionsData {
    options: GameOptions,
}

#[derive(Deserialize)]
struct PackData {
    #[serde(rename = "cardPackID")]
    pack: PackId,
}

#[derive(Deserialize)]
struct KickData {
    #[serde(rename = "targetID")]
    target: PublicId,
    #[serde(rename = "removeFromGame")]
    remove_from_game: bool,
}

/// Fields every seated action carries.
const SEAT_FIELDS: [&str; 2] = ["gameID", "playerID"];

/// Required payload fields beyond the seat, or `None` for unknown events.
fn extra_fields(event: &str) -> Option<&'static [&'static str]> {
    Some(match event {
        "leave_game" | "start_game" | "show_next_white_card" | "toggle_player_mode"
        | "draw_black_cards" | "start_round" | "return_to_lobby" => &[],
        "select_black_card" => &["selectedCardID", "discardedCardIDs"],
        "play_white_cards" | "pick_winning_card" | "give_popular_vote" => &["whiteCardIDs"],
        "set_player_name" => &["playerName"],
        "update_game_options" => &["options"],
        "add_card_pack" | "remove_card_pack" => &["cardPackID"],
        "kick_player" => &["targetID", "removeFromGame"],
        _ => return None,
    })
}

fn decode<'a, T: Deserialize<'a>>(data: &'a Value) -> Result<T, ProtocolError> {
    T::deserialize(data).map_err(ProtocolError::Decode)
}

impl ClientEvent {
    /// Parses one inbound frame.
    ///
    /// # Errors
    /// - [`ProtocolError::Decode`] for malformed JSON or mistyped fields.
    /// - [`ProtocolError::UnknownEvent`] for event names nobody handles.
    /// - [`ProtocolError::MissingFields`] when required fields are absent
    ///   or `null`.
    pub fn parse(frame: &[u8]) -> Result<Self, ProtocolError> {
        let Frame { event, data } =
            serde_json::from_slice(frame).map_err(ProtocolError::Decode)?;

        if event == "join_game" {
            let join: JoinData = if data.is_null() {
                JoinData {
                    game_id: None,
                    player_id: None,
                }
            } else {
                decode(&data)?
            };
            return Ok(Self::JoinGame {
                game_id: join.game_id,
                player_id: join.player_id,
            });
        }

        let extra = extra_fields(&event).ok_or_else(|| ProtocolError::UnknownEvent(event.clone()))?;
        let missing: Vec<&'static str> = SEAT_FIELDS
            .iter()
            .chain(extra.iter())
            .copied()
            .filter(|field| data.get(*field).is_none_or(Value::is_null))
            .collect();
        if !missing.is_empty() {
            return Err(ProtocolError::MissingFields(missing));
        }

        let seat: Seat = decode(&data)?;
        let action = match event.as_str() {
            "leave_game" => PlayerAction::Leave,
            "start_game" => PlayerAction::StartGame,
            "show_next_white_card" => PlayerAction::ShowNextWhiteCard,
            "toggle_player_mode" => PlayerAction::TogglePlayerMode,
            "draw_black_cards" => PlayerAction::DrawBlackCards,
            "start_round" => PlayerAction::StartRound,
            "return_to_lobby" => PlayerAction::ReturnToLobby,
            "select_black_card" => {
                let d: SelectBlackCardData = decode(&data)?;
                PlayerAction::SelectBlackCard {
                    selected: d.selected,
                    discarded: d.discarded,
                }
            }
            "play_white_cards" => PlayerAction::PlayWhiteCards(decode::<WhiteCardsData>(&data)?.cards),
            "pick_winning_card" => PlayerAction::PickWinningCard(decode::<WhiteCardsData>(&data)?.cards),
            "give_popular_vote" => PlayerAction::GivePopularVote(decode::<WhiteCardsData>(&data)?.cards),
            "set_player_name" => PlayerAction::SetPlayerName(decode::<NameData>(&data)?.name),
            "update_game_options" => PlayerAction::UpdateGameOptions(decode::<OptionsData>(&data)?.options),
            "add_card_pack" => PlayerAction::AddCardPack(decode::<PackData>(&data)?.pack),
            "remove_card_pack" => PlayerAction::RemoveCardPack(decode::<PackData>(&data)?.pack),
            "kick_player" => {
                let d: KickData = decode(&data)?;
                PlayerAction::KickPlayer {
                    target: d.target,
                    remove_from_game: d.remove_from_game,
                }
            }
            other => return Err(ProtocolError::UnknownEvent(other.to_string())),
        };

        Ok(Self::Action {
            game_id: seat.game_id,
            player_id: seat.player_id,
            action,
        })
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Severity of a notification, which the client uses for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Default,
    Error,
}

/// A short message for the player's screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// How long to show it, in milliseconds.
    pub time: u64,
}

impl Notification {
    pub fn new(text: impl Into<String>, kind: NotificationKind, time: u64) -> Self {
        Self {
            text: text.into(),
            kind,
            time,
        }
    }
}

/// Events the server sends.
///
/// `#[serde(tag = "event", content = "data")]` produces exactly the
/// `{"event": ..., "data": ...}` frame clients expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full personalised snapshot.
    UpdateGameAndPlayers {
        game: GameView,
        players: Vec<PlayerView>,
        player: OwnPlayerView,
    },
    UpdateGame {
        game: GameView,
    },
    UpdatePlayers {
        players: Vec<PlayerView>,
    },
    /// Only ever sent to the player it describes.
    UpdatePlayer {
        player: OwnPlayerView,
    },
    /// Prompt choices, czar only.
    DealBlackCards {
        #[serde(rename = "blackCards")]
        black_cards: Vec<BlackCard>,
    },
    /// One reveal step: the cards of a single submission, no owner.
    ShowWhiteCard {
        #[serde(rename = "whiteCards")]
        white_cards: Vec<WhiteCard>,
    },
    UpgradedToHost {
        notification: Notification,
    },
    Notification {
        notification: Notification,
        #[serde(rename = "type")]
        kind: NotificationKind,
    },
}

// =========================================================================
// Tests
// =========================================================================
