//! Pooling families
//!
//! Cards in one family earn points into what is effectively a shared
//! balance: transferring between member accounts upgrades every point to
//! the best redemption rate available inside the family. The engine models
//! that by valuing a member's points at the highest base value among family
//! members present in the evaluated card set.

use serde::{Deserialize, Serialize};

use cardmax_types::CardKey;

/// Named set of cards whose points pool into one balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolingFamily {
    /// Family name (e.g., "Ultimate Rewards")
    pub name: String,
    /// Member card keys
    pub members: Vec<CardKey>,
}

impl PoolingFamily {
    pub fn new(name: impl Into<String>, members: Vec<CardKey>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    /// Build a family from anything convertible to card keys
    pub fn from_keys<I, K>(name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<CardKey>,
    {
        Self::new(name, keys.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, card: &CardKey) -> bool {
        self.members.contains(card)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_membership() {
        let family =
            PoolingFamily::from_keys("Ultimate Rewards", ["chase", "sapphire", "sapphirereserve"]);
        assert_eq!(family.len(), 3);
        assert!(family.contains(&CardKey::new("sapphire")));
        assert!(!family.contains(&CardKey::new("amex")));
    }
}
