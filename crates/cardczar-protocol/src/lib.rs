//! Wire protocol for Cardczar.
//!
//! This crate defines the "language" that browsers and the server speak:
//!
//! - **Identity** ([`GameId`], [`PlayerId`], [`PublicId`], [`SessionId`])
//!   and **cards** ([`BlackCard`], [`WhiteCard`]).
//! - **Events** ([`ClientEvent`], [`ServerEvent`]) in their
//!   `{"event", "data"}` envelope.
//! - **Views** ([`GameView`], [`PlayerView`], ...): the redacted shapes a
//!   room is allowed to take on the wire.
//! - **Codec** ([`JsonCodec`] for outgoing text frames).
//!
//! It knows nothing about rules or rooms; it only knows how messages
//! look.

mod codec;
mod error;
mod event;
mod options;
mod types;
mod view;

pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use event::{ClientEvent, Notification, NotificationKind, PlayerAction, ServerEvent};
pub use options::{GameOptions, TimerOptions, WinConditions};
pub use types::{
    BlackCard, CardId, GameId, PackId, PlayerId, PublicId, Recipient, SessionId, WhiteCard,
};
pub use view::{
    GamePhase, GameView, OwnPlayerView, PlayerStatus, PlayerView, RoundView, SubmissionView,
    TimerView,
};
