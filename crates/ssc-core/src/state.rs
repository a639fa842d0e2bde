//! Seedable shared-state capability and presence records

use crate::credential::AccessLevel;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Capability implemented by every concrete document schema.
///
/// `seed()` produces the default content committed by the first participant
/// who finds the document absent server-side. Every client seeds
/// speculatively; the server accepts only the first create per content id,
/// so `seed()` must be deterministic enough that losing the race is
/// harmless.
pub trait SharedState:
    Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
    /// Produce valid default content for a freshly created document
    fn seed() -> Self;
}

/// Bound for presence payload types: anything serde-able and shareable.
/// Presence carries no seed capability - there is no "default presence",
/// absence of a record simply means the participant is gone.
pub trait PresenceData:
    Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
}

impl<T> PresenceData for T where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static
{
}

/// Standard presence payload: who is currently viewing/editing
///
/// The presence tracker is generic over any serde-able payload; this is the
/// record most consumers want. Ephemeral by design: never persisted, never
/// rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecord {
    pub user_id: String,
    pub name: String,
    pub level: AccessLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        count: i64,
    }

    impl SharedState for Counter {
        fn seed() -> Self {
            Counter { count: 0 }
        }
    }

    #[test]
    fn test_seed_produces_default_content() {
        assert_eq!(Counter::seed(), Counter { count: 0 });
    }

    #[test]
    fn test_presence_record_json_shape() {
        let record = PresenceRecord {
            user_id: "u2".into(),
            name: "Ada".into(),
            level: AccessLevel::User,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"userId":"u2","name":"Ada","level":"user"}"#);
    }
}
