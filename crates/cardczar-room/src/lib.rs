//! Room directory for Cardczar.
//!
//! Each live room runs as an isolated Tokio task (actor model) that owns
//! every change to that room. State itself lives in a [`RoomStore`]: each
//! command is a load, mutate, save, emit transaction, so a failed save
//! never reaches the players and a restarted actor picks up exactly where
//! the store left off, pending timer included.
//!
//! # Key types
//!
//! - [`RoomDirectory`]: creates rooms, routes requests, spawns actors.
//! - [`RoomHandle`]: sends commands to a running room actor.
//! - [`RoomStore`] / [`MemoryStore`]: persistence with reconnect lookups.
//! - [`Emitter`]: where committed events go.
//! - [`Outcome`]: applied, rejected, or not found.

mod actor;
mod clock;
mod config;
mod directory;
mod emitter;
mod error;
mod store;

pub use actor::{Outcome, RoomHandle};
pub use clock::Clock;
pub use config::DirectoryConfig;
pub use directory::RoomDirectory;
pub use emitter::Emitter;
pub use error::{RoomError, StoreError};
pub use store::{MemoryStore, RoomStore};
