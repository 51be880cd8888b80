//! Game rules for Cardczar rooms.
//!
//! Everything here is synchronous and free of I/O: a [`Room`] goes in,
//! the [`orchestrator`] changes it, and an [`Outbox`] says what to tell
//! the players. Persistence, timers and sockets live in the crates above.
//!
//! - **Cards**: [`CardCatalog`] (static packs) and [`Decks`] (per room).
//! - **Players**: [`Player`], [`PlayerState`], [`Roster`].
//! - **Phases**: [`Phase`] and [`Transition`], the room state machine.
//! - **Rounds**: [`Round`] and [`Submission`].
//! - **Views**: [`view`], the only way room data leaves this crate.

mod cards;
mod deck;
mod error;
mod options;
pub mod orchestrator;
mod outbox;
mod phase;
mod player;
mod room;
mod roster;
mod round;
mod rules;
pub mod view;

pub use cards::{CardCatalog, CardPack};
pub use deck::{Deck, Decks};
pub use error::{CatalogError, Rejection};
pub use options::{clamp_options, timer_seconds};
pub use orchestrator::{Context, OpResult};
pub use outbox::{Intent, Outbox};
pub use phase::{Phase, Transition};
pub use player::{Player, PlayerState};
pub use room::{PendingTimer, Room};
pub use roster::Roster;
pub use round::{Round, Submission};
pub use rules::GameRules;
