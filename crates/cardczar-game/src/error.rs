//! Error types for the game layer.
//!
//! Only loading static card data can fail. Everything a player does is
//! answered with an `Outcome`/[`Rejection`](crate::Rejection) instead.

use cardczar_protocol::{CardId, PackId};

use crate::Phase;

/// Errors raised while building a [`CardCatalog`](crate::CardCatalog).
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The pack file is not valid JSON or has the wrong shape.
    #[error("card data could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two packs share an id.
    #[error("duplicate card pack {0}")]
    DuplicatePack(PackId),

    /// Two cards in the same pack share an id.
    #[error("duplicate card {card} in pack {pack}")]
    DuplicateCard { pack: PackId, card: CardId },

    /// A prompt card with no blanks can never be answered.
    #[error("black card {card} in pack {pack} has no blanks")]
    NoBlanks { pack: PackId, card: CardId },
}

/// Why an action or timer left a room untouched.
///
/// Rejections are logged, never sent to other players: a misbehaving
/// client learns nothing about the room from them, and a late timer or a
/// duplicate click racing a real action is simply dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("not allowed while the room is in {0}")]
    IllegalPhase(Phase),

    #[error("only the card czar may do that")]
    NotCardCzar,

    #[error("only the host may do that")]
    NotHost,

    #[error("player is not in this room")]
    UnknownPlayer,

    #[error("session belongs to no player")]
    UnknownSession,

    #[error("player is not in a state to do that")]
    WrongPlayerState,

    #[error("cards are not available to this player")]
    UnknownCards,

    #[error("card selection does not fit the prompt")]
    InvalidSelection,

    #[error("no single submission holds exactly those cards")]
    NoMatch,

    #[error("player already voted for that submission")]
    AlreadyVoted,

    #[error("player name is empty after cleaning")]
    InvalidName,

    #[error("player was kicked and may not rejoin")]
    Banned,

    #[error("unknown card pack {0}")]
    UnknownPack(PackId),

    #[error("game requirements not met: {0}")]
    RequirementsNotMet(&'static str),

    #[error("timer was superseded or no longer applies")]
    StaleTimer,

    #[error("room still has connected players")]
    RoomInUse,
}
