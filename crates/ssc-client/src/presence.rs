//! Remote presence tracking

use ssc_core::PresenceData;
use std::collections::HashMap;
use tracing::warn;

/// Map of remote participants' presence records, keyed by the
/// server-assigned per-connection participant id.
///
/// Mutated only by the client's event loop; consumers receive full
/// snapshots, never diffs. Presence is transient: nothing here is
/// persisted or rolled back.
#[derive(Debug)]
pub struct PresenceTracker<P: PresenceData> {
    remote: HashMap<String, P>,
}

impl<P: PresenceData> PresenceTracker<P> {
    pub fn new() -> Self {
        Self {
            remote: HashMap::new(),
        }
    }

    /// Apply a remote update. An absent record removes the participant
    /// (departed or cleared presence); otherwise the entry is replaced.
    /// Returns the full map snapshot to deliver to the consumer.
    pub fn apply(&mut self, participant: &str, record: Option<P>) -> HashMap<String, P> {
        match record {
            Some(record) => {
                self.remote.insert(participant.to_string(), record);
            }
            None => {
                self.remote.remove(participant);
            }
        }
        self.remote.clone()
    }

    /// Decode a raw presence payload, logging (not surfacing) failures -
    /// presence is best-effort end to end.
    pub fn decode(participant: &str, raw: Option<serde_json::Value>) -> Option<Option<P>> {
        match raw {
            None => Some(None),
            Some(value) => match serde_json::from_value(value) {
                Ok(record) => Some(Some(record)),
                Err(e) => {
                    warn!(participant = %participant, error = %e, "Ignoring undecodable presence record");
                    None
                }
            },
        }
    }

    pub fn remote(&self) -> &HashMap<String, P> {
        &self.remote
    }
}

impl<P: PresenceData> Default for PresenceTracker<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use ssc_core::{AccessLevel, PresenceRecord};

    fn record(name: &str) -> PresenceRecord {
        PresenceRecord {
            user_id: name.to_lowercase(),
            name: name.into(),
            level: AccessLevel::User,
        }
    }

    #[test]
    fn test_insert_and_replace() {
        let mut tracker: PresenceTracker<PresenceRecord> = PresenceTracker::new();

        let map = tracker.apply("p1", Some(record("Ada")));
        assert_eq!(map.len(), 1);

        let map = tracker.apply("p1", Some(record("Grace")));
        assert_eq!(map.len(), 1);
        assert_eq!(map["p1"].name, "Grace");
    }

    #[test]
    fn test_null_update_removes_only_that_participant() {
        let mut tracker: PresenceTracker<PresenceRecord> = PresenceTracker::new();
        tracker.apply("p1", Some(record("Ada")));
        tracker.apply("p2", Some(record("Grace")));

        let map = tracker.apply("p2", None);
        assert!(!map.contains_key("p2"));
        assert_eq!(map["p1"].name, "Ada");
    }

    #[test]
    fn test_removal_of_unknown_participant_is_harmless() {
        let mut tracker: PresenceTracker<PresenceRecord> = PresenceTracker::new();
        let map = tracker.apply("ghost", None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_snapshot_is_a_full_copy() {
        let mut tracker: PresenceTracker<PresenceRecord> = PresenceTracker::new();
        let snapshot = tracker.apply("p1", Some(record("Ada")));
        tracker.apply("p1", None);
        // Earlier snapshots are unaffected by later mutations
        assert_eq!(snapshot["p1"].name, "Ada");
    }

    #[test]
    fn test_decode_paths() {
        let decoded: Option<Option<PresenceRecord>> = PresenceTracker::decode(
            "p1",
            Some(json!({"userId": "u1", "name": "Ada", "level": "user"})),
        );
        assert_eq!(decoded.unwrap().unwrap().name, "Ada");

        let departed: Option<Option<PresenceRecord>> = PresenceTracker::decode("p1", None);
        assert_eq!(departed, Some(None));

        let bad: Option<Option<PresenceRecord>> =
            PresenceTracker::decode("p1", Some(json!({"nope": true})));
        assert!(bad.is_none());
    }
}
