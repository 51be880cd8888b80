//! JSON encoding for outgoing text frames.
//!
//! Inbound frames are parsed by [`ClientEvent::parse`](crate::ClientEvent::parse),
//! which needs the raw `data` object to report missing fields.

use serde::Serialize;

use crate::ProtocolError;

/// Encodes server events the way browsers expect them: one JSON object
/// per text frame.
///
/// ```rust
/// use cardczar_protocol::{JsonCodec, Notification, NotificationKind, ServerEvent};
///
/// let event = ServerEvent::Notification {
///     notification: Notification::new("hello", NotificationKind::Default, 5000),
///     kind: NotificationKind::Default,
/// };
/// let text = JsonCodec.encode_text(&event).unwrap();
/// let value: serde_json::Value = serde_json::from_str(&text).unwrap();
/// assert_eq!(value["event"], "notification");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Encodes straight to a `String`, which is what text frames carry.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    pub fn encode_text<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameId;

    #[test]
    fn test_encode_text_writes_plain_json() {
        let text = JsonCodec.encode_text(&GameId::from("abc")).unwrap();
        assert_eq!(text, "\"abc\"");
    }
}
