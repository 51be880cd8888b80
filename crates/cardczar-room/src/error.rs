//! Error types for the room layer.

use cardczar_protocol::GameId;

/// Failures of the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A stored record no longer deserializes into a room.
    #[error("room {0} is corrupt: {1}")]
    Corrupt(GameId, #[source] serde_json::Error),

    /// A room could not be serialized for storage.
    #[error("room {0} could not be encoded: {1}")]
    Encode(GameId, #[source] serde_json::Error),

    /// The backing store refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(GameId),

    /// Loading or committing the room failed. Nothing was sent to players.
    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),
}
