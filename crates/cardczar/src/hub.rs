//! Fan-out from room actors to WebSocket connections.
//!
//! Every connection registers an outgoing queue keyed by its
//! [`SessionId`]. Room actors never touch sockets: they hand committed
//! events to the hub, which encodes each event once and pushes the text to
//! the queues of the addressed sessions.

use cardczar_protocol::{GameId, JsonCodec, ServerEvent, SessionId};
use cardczar_room::Emitter;
use dashmap::DashMap;
use tokio::sync::mpsc;

/// What a connection's writer task should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Text(String),
    /// Send a close frame and stop.
    Close,
}

/// Session registry and [`Emitter`] for the WebSocket server.
#[derive(Debug, Default)]
pub struct SocketHub {
    sessions: DashMap<SessionId, mpsc::UnboundedSender<Outgoing>>,
    codec: JsonCodec,
}

impl SocketHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session and returns the queue its writer drains.
    pub fn register(&self, session: SessionId) -> mpsc::UnboundedReceiver<Outgoing> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions.insert(session, tx);
        rx
    }

    pub fn unregister(&self, session: SessionId) {
        self.sessions.remove(&session);
    }

    pub fn is_connected(&self, session: SessionId) -> bool {
        self.sessions.contains_key(&session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sends an event to one session outside any room, e.g. a malformed
    /// request notice.
    pub fn send_to(&self, session: SessionId, event: &ServerEvent) {
        match self.codec.encode_text(event) {
            Ok(text) => self.push(session, Outgoing::Text(text)),
            Err(err) => tracing::error!(%session, error = %err, "event encode failed"),
        }
    }

    fn push(&self, session: SessionId, message: Outgoing) {
        if let Some(tx) = self.sessions.get(&session) {
            // A closed queue means the connection is already shutting down.
            let _ = tx.send(message);
        }
    }
}

impl Emitter for SocketHub {
    fn emit(&self, game_id: &GameId, sessions: &[SessionId], event: &ServerEvent) {
        let text = match self.codec.encode_text(event) {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(%game_id, error = %err, "event encode failed");
                return;
            }
        };
        for session in sessions {
            self.push(*session, Outgoing::Text(text.clone()));
        }
    }

    fn close(&self, sessions: &[SessionId]) {
        for session in sessions {
            if let Some((_, tx)) = self.sessions.remove(session) {
                tracing::debug!(%session, "closing session");
                let _ = tx.send(Outgoing::Close);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use cardczar_protocol::{Notification, NotificationKind};

    use super::*;

    fn notice(text: &str) -> ServerEvent {
        ServerEvent::Notification {
            notification: Notification::new(text, NotificationKind::Default, 5000),
            kind: NotificationKind::Default,
        }
    }

    #[test]
    fn test_emit_encodes_for_each_session() {
        let hub = SocketHub::new();
        let mut a = hub.register(SessionId(1));
        let mut b = hub.register(SessionId(2));
        let mut c = hub.register(SessionId(3));

        hub.emit(&GameId::from("g"), &[SessionId(1), SessionId(2)], &notice("hi"));

        let Ok(Outgoing::Text(text)) = a.try_recv() else {
            panic!("expected text");
        };
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["event"], "notification");
        assert_eq!(value["data"]["notification"]["text"], "hi");
        assert!(matches!(b.try_recv(), Ok(Outgoing::Text(_))));
        assert!(c.try_recv().is_err());
    }

    #[test]
    fn test_emit_unknown_session_is_ignored() {
        let hub = SocketHub::new();
        hub.emit(&GameId::from("g"), &[SessionId(9)], &notice("hi"));
        assert!(hub.is_empty());
    }

    #[test]
    fn test_close_sends_close_and_unregisters() {
        let hub = SocketHub::new();
        let mut rx = hub.register(SessionId(1));

        hub.emit(&GameId::from("g"), &[SessionId(1)], &notice("bye"));
        hub.close(&[SessionId(1)]);

        assert!(matches!(rx.try_recv(), Ok(Outgoing::Text(_))));
        assert_eq!(rx.try_recv(), Ok(Outgoing::Close));
        assert!(!hub.is_connected(SessionId(1)));
    }

    #[test]
    fn test_unregister_drops_queue() {
        let hub = SocketHub::new();
        let mut rx = hub.register(SessionId(1));
        hub.unregister(SessionId(1));
        hub.send_to(SessionId(1), &notice("late"));
        assert!(rx.try_recv().is_err());
        assert_eq!(hub.len(), 0);
    }
}
