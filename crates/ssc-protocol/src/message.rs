//! Client and server message types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ssc_core::{ContentId, Operation};

/// Fixed collection that holds all shared-state documents; the content id is
/// the document key within it.
pub const COLLECTION: &str = "shared";

/// Messages sent by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to a document; answered with a `Snapshot`
    Subscribe { collection: String, id: String },

    /// First-writer create with seeded data; answered with `Created` or
    /// `Rejected` carrying the same `seq`
    Create {
        collection: String,
        id: String,
        seq: u64,
        data: Value,
    },

    /// Optimistic mutation; opaque to the client, validated by the server
    Op {
        collection: String,
        id: String,
        seq: u64,
        op: Value,
    },

    /// Stop receiving updates for a document
    Unsubscribe { collection: String, id: String },

    /// Join the presence channel scoped to a content id
    PresenceSubscribe { channel: String },

    /// Broadcast the local presence record; `None` clears it
    Presence {
        channel: String,
        record: Option<Value>,
    },
}

impl ClientMessage {
    pub fn subscribe(id: &ContentId) -> Self {
        ClientMessage::Subscribe {
            collection: COLLECTION.into(),
            id: id.as_str().into(),
        }
    }

    pub fn create(id: &ContentId, seq: u64, data: Value) -> Self {
        ClientMessage::Create {
            collection: COLLECTION.into(),
            id: id.as_str().into(),
            seq,
            data,
        }
    }

    pub fn op(id: &ContentId, seq: u64, op: Operation) -> Self {
        ClientMessage::Op {
            collection: COLLECTION.into(),
            id: id.as_str().into(),
            seq,
            op: op.into_value(),
        }
    }

    pub fn unsubscribe(id: &ContentId) -> Self {
        ClientMessage::Unsubscribe {
            collection: COLLECTION.into(),
            id: id.as_str().into(),
        }
    }

    pub fn presence_subscribe(id: &ContentId) -> Self {
        ClientMessage::PresenceSubscribe {
            channel: id.as_str().into(),
        }
    }

    pub fn presence(id: &ContentId, record: Option<Value>) -> Self {
        ClientMessage::Presence {
            channel: id.as_str().into(),
            record,
        }
    }
}

/// Messages sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Subscription acknowledgment; `data: None` means no document exists
    /// yet for this content id
    Snapshot { version: u64, data: Option<Value> },

    /// Authoritative state after an applied op batch. Also the vehicle for
    /// rollback: a rejected op is followed by an `Update` carrying the
    /// corrected state.
    Update { version: u64, data: Value },

    /// Create accepted; this client won the first-writer race
    Created { seq: u64 },

    /// Create or op rejected by server-side validation
    Rejected {
        seq: u64,
        code: String,
        message: String,
    },

    /// Document deleted server-side; terminal for the replica
    Deleted,

    /// Remote presence update, keyed by the server-assigned participant id;
    /// `record: None` means the participant departed or cleared presence
    Presence {
        participant: String,
        record: Option<Value>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subscribe_uses_fixed_collection() {
        let id = ContentId::new("doc-1").unwrap();
        let msg = ClientMessage::subscribe(&id);
        assert_eq!(
            msg,
            ClientMessage::Subscribe {
                collection: "shared".into(),
                id: "doc-1".into(),
            }
        );
    }

    #[test]
    fn test_client_message_tagging() {
        let id = ContentId::new("doc-1").unwrap();
        let msg = ClientMessage::op(&id, 3, Operation::from_value(json!([{"p": ["x"], "na": 1}])));
        let encoded = serde_json::to_value(&msg).unwrap();
        assert_eq!(encoded["type"], "op");
        assert_eq!(encoded["seq"], 3);
        assert_eq!(encoded["op"], json!([{"p": ["x"], "na": 1}]));
    }

    #[test]
    fn test_absent_snapshot_shape() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type":"snapshot","version":0,"data":null}"#).unwrap();
        assert_eq!(msg, ServerMessage::Snapshot { version: 0, data: None });
    }

    #[test]
    fn test_presence_departure_shape() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type":"presence","participant":"p2","record":null}"#)
                .unwrap();
        assert_eq!(
            msg,
            ServerMessage::Presence {
                participant: "p2".into(),
                record: None,
            }
        );
    }
}
