//! Per-connection handler: session registration, frame parsing, routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. WebSocket handshake, then a fresh [`SessionId`] is registered with
//!      the hub and a writer task drains its queue into the socket.
//!   2. Loop: parse text frames into [`ClientEvent`]s and route them to the
//!      room directory.
//!   3. On exit the session guard unregisters the session and tells the
//!      directory it disconnected.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cardczar_protocol::{ClientEvent, Notification, NotificationKind, ProtocolError, ServerEvent, SessionId};
use cardczar_room::Outcome;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::CardczarError;
use crate::hub::Outgoing;
use crate::server::ServerState;

/// Counter for generating unique session ids.
static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Drop guard that disconnects the session when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, the directory call runs on a fire-and-forget task.
struct SessionGuard {
    session: SessionId,
    state: Arc<ServerState>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let session = self.session;
        let state = Arc::clone(&self.state);
        state.hub.unregister(session);
        tokio::spawn(async move {
            if let Err(err) = state.directory.disconnect(session).await {
                tracing::warn!(%session, error = %err, "disconnect failed");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(stream: TcpStream, state: Arc<ServerState>) -> Result<(), CardczarError> {
    let addr = stream.peer_addr()?;
    let ws = tokio_tungstenite::accept_async(stream).await?;

    let session = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
    tracing::debug!(%session, %addr, "session opened");

    let outgoing = state.hub.register(session);
    let _guard = SessionGuard {
        session,
        state: Arc::clone(&state),
    };

    let (sink, mut frames) = ws.split();
    let mut writer = tokio::spawn(write_loop(sink, outgoing));

    loop {
        tokio::select! {
            frame = frames.next() => match frame {
                Some(Ok(Message::Text(text))) => handle_frame(&state, session, text.as_bytes()).await,
                Some(Ok(Message::Binary(data))) => handle_frame(&state, session, &data).await,
                Some(Ok(Message::Close(_))) | None => {
                    tracing::debug!(%session, "connection closed by client");
                    break;
                }
                Some(Ok(_)) => {} // ping/pong/frame
                Some(Err(err)) => {
                    tracing::debug!(%session, error = %err, "recv error");
                    break;
                }
            },
            _ = &mut writer => {
                tracing::debug!(%session, "connection closed by server");
                break;
            }
        }
    }

    writer.abort();
    // _guard drops here → disconnect fires.
    Ok(())
}

/// Forwards the session's queue into the socket until the queue closes or
/// the hub asks for a close.
async fn write_loop(mut sink: WsSink, mut outgoing: mpsc::UnboundedReceiver<Outgoing>) {
    while let Some(message) = outgoing.recv().await {
        match message {
            Outgoing::Text(text) => {
                if sink.send(Message::Text(text.into())).await.is_err() {
                    return;
                }
            }
            Outgoing::Close => break,
        }
    }
    let _ = sink.close().await;
}

/// Parses one frame and routes it. Nothing here fails the connection:
/// malformed requests are answered with a notification, everything else
/// is logged.
async fn handle_frame(state: &ServerState, session: SessionId, frame: &[u8]) {
    let event = match ClientEvent::parse(frame) {
        Ok(event) => event,
        Err(ProtocolError::MissingFields(fields)) => {
            tracing::debug!(%session, ?fields, "missing fields");
            notify_error(state, session, format!("Missing fields: {}", fields.join(", ")));
            return;
        }
        Err(ProtocolError::UnknownEvent(name)) => {
            tracing::debug!(%session, event = %name, "ignoring unknown event");
            return;
        }
        Err(err) => {
            tracing::debug!(%session, error = %err, "malformed frame");
            notify_error(state, session, "Invalid request".to_string());
            return;
        }
    };

    let result = match event {
        ClientEvent::JoinGame { game_id, player_id } => state.directory.join(session, game_id, player_id).await,
        ClientEvent::Action {
            game_id,
            player_id,
            action,
        } => state.directory.act(&game_id, player_id, action).await,
    };

    match result {
        Ok(Outcome::Applied) => {}
        Ok(Outcome::Rejected(rejection)) => {
            tracing::debug!(%session, %rejection, "request rejected");
        }
        Ok(Outcome::NotFound) => {
            tracing::debug!(%session, "request for unknown room or player");
        }
        Err(err) => {
            tracing::warn!(%session, error = %err, "request failed");
        }
    }
}

/// Tells the acting session alone that its request was malformed.
fn notify_error(state: &ServerState, session: SessionId, text: String) {
    let event = ServerEvent::Notification {
        notification: Notification::new(text, NotificationKind::Error, state.directory.rules().notification_ms),
        kind: NotificationKind::Error,
    };
    state.hub.send_to(session, &event);
}
