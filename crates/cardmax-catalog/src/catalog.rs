//! The card catalog
//!
//! An immutable, validated table of cards plus the pooling families and
//! hidden-card designations that go with them. Construction is the one
//! place configuration defects can surface; everything downstream reads a
//! catalog that is already known to be consistent.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cardmax_types::{CardKey, CardMaxError, Result};

use crate::card::Card;
use crate::family::PoolingFamily;

// ============================================================================
// Card Catalog
// ============================================================================

/// The validated card table
///
/// Card order is preserved as supplied; listings and candidate rankings
/// report cards in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardCatalog {
    cards: Vec<Card>,
    families: Vec<PoolingFamily>,
    hidden: Vec<CardKey>,
}

impl CardCatalog {
    /// Build a catalog, validating every card, family, and hidden key
    pub fn new(
        cards: Vec<Card>,
        families: Vec<PoolingFamily>,
        hidden: Vec<CardKey>,
    ) -> Result<Self> {
        if cards.is_empty() {
            return Err(CardMaxError::EmptyCatalog);
        }

        for (i, card) in cards.iter().enumerate() {
            card.validate()?;
            if cards[..i].iter().any(|earlier| earlier.key == card.key) {
                return Err(CardMaxError::DuplicateCatalogCard {
                    card: card.key.to_string(),
                });
            }
        }

        for (i, family) in families.iter().enumerate() {
            if family.len() < 2 {
                return Err(CardMaxError::FamilyTooSmall {
                    family: family.name.clone(),
                    members: family.len(),
                });
            }
            for member in &family.members {
                if !cards.iter().any(|card| &card.key == member) {
                    return Err(CardMaxError::UnknownFamilyMember {
                        family: family.name.clone(),
                        card: member.to_string(),
                    });
                }
                if let Some(earlier) = families[..i].iter().find(|f| f.contains(member)) {
                    return Err(CardMaxError::OverlappingFamilies {
                        card: member.to_string(),
                        first: earlier.name.clone(),
                        second: family.name.clone(),
                    });
                }
            }
        }

        for key in &hidden {
            if !cards.iter().any(|card| &card.key == key) {
                return Err(CardMaxError::unknown_card(key.as_str()));
            }
        }

        Ok(Self {
            cards,
            families,
            hidden,
        })
    }

    /// Catalog with no families and no hidden cards
    pub fn from_cards(cards: Vec<Card>) -> Result<Self> {
        Self::new(cards, Vec::new(), Vec::new())
    }

    /// Look up a card, failing on unknown keys
    pub fn card(&self, key: &CardKey) -> Result<&Card> {
        self.get(key)
            .ok_or_else(|| CardMaxError::unknown_card(key.as_str()))
    }

    /// Look up a card
    pub fn get(&self, key: &CardKey) -> Option<&Card> {
        self.cards.iter().find(|card| &card.key == key)
    }

    pub fn contains(&self, key: &CardKey) -> bool {
        self.get(key).is_some()
    }

    /// All cards, in catalog order
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Declared pooling families
    pub fn families(&self) -> &[PoolingFamily] {
        &self.families
    }

    /// The family a card pools with, if any
    pub fn family_of(&self, key: &CardKey) -> Option<&PoolingFamily> {
        self.families.iter().find(|family| family.contains(key))
    }

    /// Check if a card is excluded from user-facing selection
    pub fn is_hidden(&self, key: &CardKey) -> bool {
        self.hidden.contains(key)
    }

    /// Cards offered for user-facing selection, in catalog order
    pub fn visible_cards(&self) -> Vec<&Card> {
        self.cards
            .iter()
            .filter(|card| !self.is_hidden(&card.key))
            .collect()
    }

    /// Point values as the catalog ships them, before any user override
    pub fn default_point_values(&self) -> PointValues {
        PointValues {
            values: self
                .cards
                .iter()
                .map(|card| (card.key.clone(), card.base_point_value))
                .collect(),
        }
    }
}

// ============================================================================
// Point Values
// ============================================================================

/// Effective cents-per-point for every catalog card
///
/// Catalog defaults merged with user overrides, assembled once per
/// evaluation and passed explicitly through every engine call. There is no
/// fallback chain at call sites: if a card has no entry here, that is a
/// caller bug and lookups fail loudly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointValues {
    values: BTreeMap<CardKey, Decimal>,
}

impl PointValues {
    /// Defaults for a catalog; equivalent to `catalog.default_point_values()`
    pub fn from_catalog(catalog: &CardCatalog) -> Self {
        catalog.default_point_values()
    }

    /// Override one card's cents-per-point
    ///
    /// The card must already have an entry (i.e. exist in the catalog the
    /// values were built from), and the override must be non-negative.
    pub fn set(&mut self, card: &CardKey, cents: Decimal) -> Result<()> {
        if !self.values.contains_key(card) {
            return Err(CardMaxError::unknown_card(card.as_str()));
        }
        if cents < Decimal::ZERO {
            return Err(CardMaxError::NegativePointValue {
                card: card.to_string(),
                value: cents.to_string(),
            });
        }
        self.values.insert(card.clone(), cents);
        Ok(())
    }

    /// Builder-style override
    pub fn with_value(mut self, card: &CardKey, cents: Decimal) -> Result<Self> {
        self.set(card, cents)?;
        Ok(self)
    }

    /// Cents-per-point for a card, if configured
    pub fn get(&self, card: &CardKey) -> Option<Decimal> {
        self.values.get(card).copied()
    }

    /// Cents-per-point for a card, failing loudly when unconfigured
    pub fn require(&self, card: &CardKey) -> Result<Decimal> {
        self.get(card).ok_or_else(|| CardMaxError::MissingPointValue {
            card: card.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardmax_types::SpendCategory;
    use rust_decimal_macros::dec;

    fn two_cards() -> Vec<Card> {
        vec![
            Card::builder("alpha", "Alpha Card")
                .flat_rate(dec!(1))
                .rate(SpendCategory::Dining, dec!(4))
                .annual_fee(dec!(95))
                .base_point_value(dec!(1.5))
                .build()
                .unwrap(),
            Card::builder("beta", "Beta Card")
                .flat_rate(dec!(2))
                .build()
                .unwrap(),
        ]
    }

    #[test]
    fn test_catalog_rejects_duplicate_keys() {
        let mut cards = two_cards();
        cards.push(cards[0].clone());
        let err = CardCatalog::from_cards(cards).unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_CATALOG_CARD");
    }

    #[test]
    fn test_catalog_rejects_empty() {
        let err = CardCatalog::from_cards(Vec::new()).unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_CATALOG");
    }

    #[test]
    fn test_catalog_rejects_unknown_family_member() {
        let families = vec![PoolingFamily::from_keys("Ghost", ["alpha", "ghost"])];
        let err = CardCatalog::new(two_cards(), families, Vec::new()).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_FAMILY_MEMBER");
    }

    #[test]
    fn test_catalog_rejects_overlapping_families() {
        let families = vec![
            PoolingFamily::from_keys("First", ["alpha", "beta"]),
            PoolingFamily::from_keys("Second", ["beta", "alpha"]),
        ];
        let err = CardCatalog::new(two_cards(), families, Vec::new()).unwrap_err();
        assert_eq!(err.error_code(), "OVERLAPPING_FAMILIES");
    }

    #[test]
    fn test_catalog_rejects_single_member_family() {
        let families = vec![PoolingFamily::from_keys("Lonely", ["alpha"])];
        let err = CardCatalog::new(two_cards(), families, Vec::new()).unwrap_err();
        assert_eq!(err.error_code(), "FAMILY_TOO_SMALL");
    }

    #[test]
    fn test_catalog_rejects_unknown_hidden_key() {
        let err = CardCatalog::new(two_cards(), Vec::new(), vec![CardKey::new("ghost")])
            .unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_CARD");
    }

    #[test]
    fn test_family_lookup() {
        let families = vec![PoolingFamily::from_keys("Pair", ["alpha", "beta"])];
        let catalog = CardCatalog::new(two_cards(), families, Vec::new()).unwrap();
        assert_eq!(
            catalog.family_of(&CardKey::new("alpha")).map(|f| f.name.as_str()),
            Some("Pair")
        );
        assert!(catalog.card(&CardKey::new("missing")).is_err());
    }

    #[test]
    fn test_hidden_cards_filtered_from_visible() {
        let catalog =
            CardCatalog::new(two_cards(), Vec::new(), vec![CardKey::new("beta")]).unwrap();
        let visible: Vec<&str> = catalog
            .visible_cards()
            .iter()
            .map(|card| card.key.as_str())
            .collect();
        assert_eq!(visible, ["alpha"]);
        assert!(catalog.is_hidden(&CardKey::new("beta")));
        // Hidden cards stay fully resolvable
        assert!(catalog.card(&CardKey::new("beta")).is_ok());
    }

    #[test]
    fn test_point_values_default_and_override() {
        let catalog = CardCatalog::from_cards(two_cards()).unwrap();
        let values = catalog.default_point_values();
        assert_eq!(values.require(&CardKey::new("alpha")).unwrap(), dec!(1.5));
        assert_eq!(values.require(&CardKey::new("beta")).unwrap(), dec!(1));

        let values = values.with_value(&CardKey::new("beta"), dec!(1.8)).unwrap();
        assert_eq!(values.require(&CardKey::new("beta")).unwrap(), dec!(1.8));
    }

    #[test]
    fn test_point_values_reject_bad_overrides() {
        let catalog = CardCatalog::from_cards(two_cards()).unwrap();
        let mut values = catalog.default_point_values();
        let err = values.set(&CardKey::new("ghost"), dec!(1)).unwrap_err();
        assert_eq!(err.error_code(), "UNKNOWN_CARD");
        let err = values.set(&CardKey::new("alpha"), dec!(-0.5)).unwrap_err();
        assert_eq!(err.error_code(), "NEGATIVE_POINT_VALUE");
    }

    #[test]
    fn test_point_values_require_unconfigured_card() {
        let catalog = CardCatalog::from_cards(two_cards()).unwrap();
        let values = catalog.default_point_values();
        let err = values.require(&CardKey::new("ghost")).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_POINT_VALUE");
    }
}
