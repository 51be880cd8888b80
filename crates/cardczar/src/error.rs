//! Unified error type for the Cardczar server.

use cardczar_game::CatalogError;
use cardczar_protocol::ProtocolError;
use cardczar_room::{RoomError, StoreError};

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum CardczarError {
    /// Binding or accepting a socket failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The WebSocket handshake or a frame failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// A frame could not be encoded or parsed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The card pack file is unusable.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A room could not be reached or committed.
    #[error(transparent)]
    Room(#[from] RoomError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
