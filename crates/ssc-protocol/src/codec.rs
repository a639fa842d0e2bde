//! Frame encoding and decoding

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{ClientMessage, ServerMessage};
use tungstenite::Message;

/// Maximum frame size in bytes (16MB, matching the document size cap)
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

impl ClientMessage {
    /// Encode to a WebSocket text frame payload
    pub fn encode(&self) -> ProtocolResult<String> {
        let text =
            serde_json::to_string(self).map_err(|e| ProtocolError::InvalidJson(e.to_string()))?;
        if text.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: text.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        Ok(text)
    }

    /// Encode to a ready-to-send WebSocket frame
    pub fn encode_frame(&self) -> ProtocolResult<Message> {
        Ok(Message::Text(self.encode()?))
    }
}

impl ServerMessage {
    /// Decode from a WebSocket text frame payload
    pub fn decode(text: &str) -> ProtocolResult<Self> {
        if text.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: text.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))
    }

    /// Classify and decode an incoming WebSocket frame.
    ///
    /// Only text frames carry the envelope. `Ok(None)` is a keepalive frame
    /// with nothing to deliver; binary frames are a protocol violation and
    /// close frames surface as [`ProtocolError::Closed`] so the transport
    /// can treat them as a remote hangup.
    pub fn decode_frame(frame: &Message) -> ProtocolResult<Option<Self>> {
        match frame {
            Message::Text(text) => Self::decode(text).map(Some),
            Message::Binary(_) => Err(ProtocolError::UnexpectedBinary),
            Message::Close(_) => Err(ProtocolError::Closed),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ssc_core::ContentId;

    #[test]
    fn test_encode_decode_snapshot() {
        let text = r#"{"type":"snapshot","version":7,"data":{"count":5}}"#;
        let msg = ServerMessage::decode(text).unwrap();
        assert_eq!(
            msg,
            ServerMessage::Snapshot {
                version: 7,
                data: Some(json!({"count": 5})),
            }
        );
    }

    #[test]
    fn test_decode_malformed_json() {
        let err = ServerMessage::decode("{not json").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidJson(_)));
    }

    #[test]
    fn test_decode_unknown_type() {
        let err = ServerMessage::decode(r#"{"type":"bogus"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidJson(_)));
    }

    #[test]
    fn test_decode_oversized_frame() {
        let huge = " ".repeat(MAX_FRAME_SIZE + 1);
        let err = ServerMessage::decode(&huge).unwrap_err();
        assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
    }

    #[test]
    fn test_decode_frame_text_carries_envelope() {
        let frame = Message::Text(r#"{"type":"deleted"}"#.into());
        assert_eq!(
            ServerMessage::decode_frame(&frame).unwrap(),
            Some(ServerMessage::Deleted)
        );
    }

    #[test]
    fn test_decode_frame_rejects_binary() {
        let frame = Message::Binary(vec![0x82, 0xa4]);
        assert!(matches!(
            ServerMessage::decode_frame(&frame).unwrap_err(),
            ProtocolError::UnexpectedBinary
        ));
    }

    #[test]
    fn test_decode_frame_close_is_closed() {
        assert!(matches!(
            ServerMessage::decode_frame(&Message::Close(None)).unwrap_err(),
            ProtocolError::Closed
        ));
    }

    #[test]
    fn test_decode_frame_keepalive_is_empty() {
        assert_eq!(
            ServerMessage::decode_frame(&Message::Pong(vec![])).unwrap(),
            None
        );
    }

    #[test]
    fn test_encode_frame_is_text() {
        let id = ContentId::new("doc-1").unwrap();
        let frame = ClientMessage::subscribe(&id).encode_frame().unwrap();
        assert!(matches!(frame, Message::Text(_)));
    }

    #[test]
    fn test_encode_create() {
        let id = ContentId::new("doc-1").unwrap();
        let text = ClientMessage::create(&id, 1, json!({"count": 0}))
            .encode()
            .unwrap();
        let round: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(round["type"], "create");
        assert_eq!(round["collection"], "shared");
        assert_eq!(round["data"], json!({"count": 0}));
    }
}
