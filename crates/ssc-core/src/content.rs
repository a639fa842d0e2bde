//! Content identifiers

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Ids travel as URL segments, query parameters, and presence channel
/// names, so only characters that survive all three unescaped are allowed.
const MAX_ID_BYTES: usize = 512;

fn id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '_' | '-')
}

/// Content identifier.
///
/// All participants collaborating on the same document share one content id;
/// it doubles as the document key within the server collection and as the
/// scope of the presence channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidContentId("content id is empty".into()));
        }
        if id.len() > MAX_ID_BYTES {
            return Err(Error::InvalidContentId(format!(
                "content id is {} bytes, limit is {}",
                id.len(),
                MAX_ID_BYTES
            )));
        }
        match id.chars().find(|&c| !id_char(c)) {
            None => Ok(Self(id)),
            Some(c) => Err(Error::InvalidContentId(format!(
                "content id contains {:?}; allowed are ASCII alphanumerics, ':', '_' and '-'",
                c
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_id_accepts_channel_safe_ids() {
        for id in ["doc-1", "course:42_draft", "A9"] {
            assert_eq!(ContentId::new(id).unwrap().as_str(), id);
        }
    }

    #[test]
    fn test_content_id_rejects_empty() {
        assert!(ContentId::new("").is_err());
    }

    #[test]
    fn test_content_id_names_the_offending_character() {
        let err = ContentId::new("doc/1").unwrap_err();
        assert!(err.to_string().contains("'/'"));
    }

    #[test]
    fn test_content_id_byte_limit_is_inclusive() {
        assert!(ContentId::new("a".repeat(512)).is_ok());
        assert!(ContentId::new("a".repeat(513)).is_err());
    }
}
