//! # Cardczar
//!
//! Server for a multiplayer card czar party game.
//!
//! Browsers create a room over HTTP and then talk to it over a WebSocket
//! with `{"event", "data"}` JSON frames. Each room runs as its own actor
//! (see `cardczar-room`); this crate only accepts connections, parses
//! frames, and fans committed events back out to sockets.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cardczar::prelude::*;
//!
//! # async fn run() -> Result<(), CardczarError> {
//! let server = CardczarServerBuilder::from_config(ServerConfig::from_env())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod http;
mod hub;
mod server;

pub use config::ServerConfig;
pub use error::CardczarError;
pub use hub::{Outgoing, SocketHub};
pub use server::{CardczarServer, CardczarServerBuilder, Directory};

pub mod prelude {
    pub use cardczar_game::{CardCatalog, GameRules, Phase, PlayerState};
    pub use cardczar_protocol::{ClientEvent, GameId, PlayerAction, PlayerId, ServerEvent, SessionId};
    pub use cardczar_room::{DirectoryConfig, Outcome, RoomStore};

    pub use crate::{CardczarError, CardczarServer, CardczarServerBuilder, ServerConfig};
}
