//! The seam between room actors and live connections.

use cardczar_protocol::{GameId, ServerEvent, SessionId};

/// Delivers committed room events to sessions.
///
/// Room actors call this only after the room has been saved. Delivery is
/// fire-and-forget: a session that has gone away is silently skipped.
pub trait Emitter: Send + Sync + 'static {
    /// Sends `event` to each of `sessions`.
    fn emit(&self, game_id: &GameId, sessions: &[SessionId], event: &ServerEvent);

    /// Disconnects `sessions` after any events already emitted to them.
    fn close(&self, sessions: &[SessionId]);
}
