//! Identity and card content types shared by every layer.
//!
//! These are the nouns of the wire format: who is talking (players,
//! sessions), where (games), and what is being played (cards).

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Renders `len` random bytes as lowercase hex.
///
/// 16 bytes (128 bits) is plenty for unguessable tokens; shorter values
/// are used where the id ends up in a URL.
fn random_hex(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| format!("{:02x}", rng.random::<u8>()))
        .collect()
}

/// The opaque id of a game room.
///
/// Also the URL path segment clients are redirected to after creation,
/// and the address used for room-wide fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub String);

impl GameId {
    /// Allocates a fresh random room id.
    pub fn generate() -> Self {
        Self(random_hex(8))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GameId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A player's private id.
///
/// This is a capability token: whoever presents it acts as the player.
/// Clients persist it locally to reconnect. It is never shown to other
/// players; they see the [`PublicId`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn generate() -> Self {
        Self(random_hex(16))
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Only a prefix is printed so logs never carry a usable token.
impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "{prefix}…")
    }
}

/// The id other players know a player by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicId(pub String);

impl PublicId {
    pub fn generate() -> Self {
        Self(random_hex(8))
    }
}

impl From<&str> for PublicId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for PublicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One live transport connection.
///
/// A player may hold several at once (two browser tabs). Session ids are
/// assigned by the server per connection and persisted with the room so
/// a dropped connection can be traced back to its player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// A card id, unique within its pack (packs namespace their ids).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl From<&str> for CardId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies a card pack in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackId(pub String);

impl From<&str> for PackId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for PackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A prompt card. `blanks` is how many answer cards a submission needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlackCard {
    pub id: CardId,
    pub text: String,
    #[serde(rename = "whiteCardsToPlay")]
    pub blanks: usize,
}

/// An answer card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhiteCard {
    pub id: CardId,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Recipient — who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event.
///
/// Game logic pairs every outbound event with a `Recipient`; the room
/// actor resolves it to concrete sessions against the committed room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every session of every player in the room.
    Room,

    /// Every session of one player.
    Player(PlayerId),

    /// Exactly these sessions, whether or not they still belong to a
    /// player (used for the acting connection and for kicked players).
    Sessions(Vec<SessionId>),
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&GameId::from("abc123")).unwrap();
        assert_eq!(json, "\"abc123\"");
    }

    #[test]
    fn test_generated_ids_are_hex_and_distinct() {
        let a = PlayerId::generate();
        let b = PlayerId::generate();
        assert_ne!(a, b);
        assert_eq!(a.0.len(), 32);
        assert!(a.0.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(GameId::generate().as_str().len(), 16);
    }

    #[test]
    fn test_player_id_display_hides_token() {
        let id = PlayerId::from("0123456789abcdef");
        assert_eq!(id.to_string(), "012345…");
    }

    #[test]
    fn test_session_id_display() {
        assert_eq!(SessionId(7).to_string(), "S-7");
    }

    #[test]
    fn test_black_card_uses_white_cards_to_play_key() {
        let card = BlackCard {
            id: CardId::from("b1"),
            text: "Why ____?".into(),
            blanks: 1,
        };
        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["whiteCardsToPlay"], 1);
        assert!(json.get("blanks").is_none());
    }
}
