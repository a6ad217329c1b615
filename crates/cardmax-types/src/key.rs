//! Card identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Card identifier (e.g., "chase", "sapphirereserve")
///
/// Stable across the system and used as a map key everywhere; never
/// renamed once published.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardKey(pub String);

impl CardKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CardKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for CardKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_key_display() {
        let key = CardKey::new("venturex");
        assert_eq!(key.to_string(), "venturex");
        assert_eq!(key.as_str(), "venturex");
    }

    #[test]
    fn test_card_key_from_str() {
        let key: CardKey = "amex".into();
        assert_eq!(key, CardKey::new("amex"));
    }
}
