//! Spending profiles and held-card sets
//!
//! A `SpendProfile` is the user's monthly spending by category; a `CardSet`
//! is the ordered list of cards they hold. Both are immutable inputs to a
//! valuation: the engine never mutates them, it only reads.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::category::SpendCategory;
use crate::error::{CardMaxError, Result};
use crate::key::CardKey;

// ============================================================================
// Spend Profile
// ============================================================================

/// Monthly dollars spent per category
///
/// Covers every `SpendCategory` with a non-negative amount. Annual figures
/// are always monthly × 12.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendProfile {
    /// Monthly dollar amount by category
    pub monthly: BTreeMap<SpendCategory, Decimal>,
}

impl SpendProfile {
    /// Build a profile from a full per-category map
    pub fn new(monthly: BTreeMap<SpendCategory, Decimal>) -> Result<Self> {
        let profile = Self { monthly };
        profile.validate()?;
        Ok(profile)
    }

    /// Build a profile from (category, monthly amount) pairs
    pub fn from_monthly<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (SpendCategory, Decimal)>,
    {
        Self::new(pairs.into_iter().collect())
    }

    /// Profile with the same monthly amount in every category
    pub fn uniform(amount: Decimal) -> Result<Self> {
        Self::from_monthly(SpendCategory::ALL.map(|category| (category, amount)))
    }

    /// All-zero profile
    pub fn zero() -> Self {
        Self {
            monthly: SpendCategory::ALL
                .map(|category| (category, Decimal::ZERO))
                .into_iter()
                .collect(),
        }
    }

    /// Check total category coverage and non-negative amounts
    pub fn validate(&self) -> Result<()> {
        for category in SpendCategory::ALL {
            match self.monthly.get(&category) {
                None => {
                    return Err(CardMaxError::MissingCategory {
                        category: category.to_string(),
                    })
                }
                Some(amount) if *amount < Decimal::ZERO => {
                    return Err(CardMaxError::NegativeSpend {
                        category: category.to_string(),
                        amount: amount.to_string(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Monthly spend for one category
    pub fn monthly_spend(&self, category: SpendCategory) -> Decimal {
        self.monthly.get(&category).copied().unwrap_or(Decimal::ZERO)
    }

    /// Annual spend for one category (monthly × 12)
    pub fn annual_spend(&self, category: SpendCategory) -> Decimal {
        self.monthly_spend(category) * dec!(12)
    }

    /// Total monthly spend across all categories
    pub fn total_monthly(&self) -> Decimal {
        SpendCategory::ALL
            .iter()
            .map(|category| self.monthly_spend(*category))
            .sum()
    }

    /// Total annual spend across all categories
    pub fn total_annual(&self) -> Decimal {
        self.total_monthly() * dec!(12)
    }
}

// ============================================================================
// Card Set
// ============================================================================

/// Ordered set of held cards
///
/// Insertion order is preserved and matters exactly once: when two cards
/// produce equal value in a category, the earlier card wins the tie.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardSet {
    cards: Vec<CardKey>,
}

impl CardSet {
    /// Empty set — the defined "no card chosen yet" state
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from keys, rejecting duplicates
    pub fn new(cards: Vec<CardKey>) -> Result<Self> {
        let set = Self { cards };
        set.validate()?;
        Ok(set)
    }

    /// Build a set from anything convertible to card keys
    pub fn from_keys<I, K>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
        K: Into<CardKey>,
    {
        Self::new(keys.into_iter().map(Into::into).collect())
    }

    /// Check that no card appears twice
    pub fn validate(&self) -> Result<()> {
        for (i, card) in self.cards.iter().enumerate() {
            if self.cards[..i].contains(card) {
                return Err(CardMaxError::DuplicateCard {
                    card: card.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn contains(&self, card: &CardKey) -> bool {
        self.cards.contains(card)
    }

    /// Held cards in insertion order
    pub fn cards(&self) -> &[CardKey] {
        &self.cards
    }

    /// Append a card in place
    pub fn add(&mut self, card: CardKey) -> Result<()> {
        if self.contains(&card) {
            return Err(CardMaxError::DuplicateCard {
                card: card.to_string(),
            });
        }
        self.cards.push(card);
        Ok(())
    }

    /// Drop a card; returns whether it was held
    pub fn remove(&mut self, card: &CardKey) -> bool {
        match self.cards.iter().position(|held| held == card) {
            Some(index) => {
                self.cards.remove(index);
                true
            }
            None => false,
        }
    }

    /// Copy of this set with one more card appended
    ///
    /// Returns an identical set when the card is already held.
    pub fn with_card(&self, card: &CardKey) -> Self {
        let mut cards = self.cards.clone();
        if !cards.contains(card) {
            cards.push(card.clone());
        }
        Self { cards }
    }
}

// ============================================================================
// Spend Estimation
// ============================================================================

/// Coarse questionnaire totals used to seed a starting profile
///
/// Travel dollars split 50% hotels / 30% flights / 20% other travel. The
/// non-travel remainder splits 20% dining / 30% groceries / 15% gas /
/// 35% other; each emphasized non-travel category is boosted 1.33×, and
/// the `other` bucket absorbs whatever adjustment restores the exact
/// annual total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendEstimate {
    /// Total annual card spend, dollars
    pub annual_total: Decimal,
    /// Annual travel spend contained in the total, dollars
    pub annual_travel: Decimal,
    /// Categories the user flagged as outsized; travel flags are ignored
    pub emphasized: Vec<SpendCategory>,
}

impl SpendEstimate {
    pub fn new(annual_total: Decimal, annual_travel: Decimal) -> Self {
        Self {
            annual_total,
            annual_travel,
            emphasized: Vec::new(),
        }
    }

    /// Flag a category as outsized
    pub fn with_emphasis(mut self, category: SpendCategory) -> Self {
        self.emphasized.push(category);
        self
    }

    /// Expand the totals into a monthly profile
    ///
    /// Split amounts round to whole annual dollars (half away from zero)
    /// before the final adjustment; monthly amounts round to cents.
    pub fn to_profile(&self) -> Result<SpendProfile> {
        if self.annual_total < Decimal::ZERO || self.annual_travel < Decimal::ZERO {
            return Err(CardMaxError::invalid_estimate("totals must be non-negative"));
        }
        if self.annual_travel > self.annual_total {
            return Err(CardMaxError::invalid_estimate(
                "travel spend exceeds total spend",
            ));
        }

        let hotels = round_dollars(self.annual_travel * dec!(0.5));
        let flights = round_dollars(self.annual_travel * dec!(0.3));
        let other_travel = round_dollars(self.annual_travel * dec!(0.2));

        let remaining = self.annual_total - self.annual_travel;
        let mut dining = round_dollars(remaining * dec!(0.2));
        let mut groceries = round_dollars(remaining * dec!(0.3));
        let mut gas = round_dollars(remaining * dec!(0.15));
        let mut other = round_dollars(remaining * dec!(0.35));

        if self.emphasized.contains(&SpendCategory::Dining) {
            dining = round_dollars(dining * dec!(1.33));
        }
        if self.emphasized.contains(&SpendCategory::Groceries) {
            groceries = round_dollars(groceries * dec!(1.33));
        }
        if self.emphasized.contains(&SpendCategory::Gas) {
            gas = round_dollars(gas * dec!(1.33));
        }
        if self.emphasized.contains(&SpendCategory::Other) {
            other = round_dollars(other * dec!(1.33));
        }

        // Fold the rounding/boost drift back into `other` so the annual
        // total is preserved; clamp guards tiny totals where dollar
        // rounding alone would push it below zero.
        let subtotal = dining + groceries + gas + other + hotels + flights + other_travel;
        other = (other + self.annual_total - subtotal).max(Decimal::ZERO);

        SpendProfile::from_monthly([
            (SpendCategory::Dining, to_monthly(dining)),
            (SpendCategory::Flights, to_monthly(flights)),
            (SpendCategory::Hotels, to_monthly(hotels)),
            (SpendCategory::OtherTravel, to_monthly(other_travel)),
            (SpendCategory::Groceries, to_monthly(groceries)),
            (SpendCategory::Gas, to_monthly(gas)),
            (SpendCategory::Other, to_monthly(other)),
        ])
    }
}

/// Round to whole dollars, half away from zero
fn round_dollars(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Annual dollars to monthly, rounded to cents
fn to_monthly(annual: Decimal) -> Decimal {
    (annual / dec!(12)).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_500_dining() -> SpendProfile {
        SpendProfile::from_monthly([
            (SpendCategory::Dining, dec!(500)),
            (SpendCategory::Flights, dec!(100)),
            (SpendCategory::Hotels, dec!(150)),
            (SpendCategory::OtherTravel, dec!(50)),
            (SpendCategory::Groceries, dec!(500)),
            (SpendCategory::Gas, dec!(100)),
            (SpendCategory::Other, dec!(1000)),
        ])
        .unwrap()
    }

    #[test]
    fn test_profile_requires_total_coverage() {
        let mut monthly = BTreeMap::new();
        monthly.insert(SpendCategory::Dining, dec!(500));
        let err = SpendProfile::new(monthly).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_CATEGORY");
    }

    #[test]
    fn test_profile_rejects_negative_spend() {
        let err = SpendProfile::uniform(dec!(-1)).unwrap_err();
        assert_eq!(err.error_code(), "NEGATIVE_SPEND");
    }

    #[test]
    fn test_profile_totals() {
        let profile = profile_500_dining();
        assert_eq!(profile.total_monthly(), dec!(2400));
        assert_eq!(profile.total_annual(), dec!(28800));
        assert_eq!(profile.annual_spend(SpendCategory::Dining), dec!(6000));
    }

    #[test]
    fn test_zero_profile_is_valid() {
        let profile = SpendProfile::zero();
        assert!(profile.validate().is_ok());
        assert_eq!(profile.total_monthly(), Decimal::ZERO);
    }

    #[test]
    fn test_card_set_rejects_duplicates() {
        let err = CardSet::from_keys(["amex", "chase", "amex"]).unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_CARD");
    }

    #[test]
    fn test_card_set_preserves_order() {
        let set = CardSet::from_keys(["sapphire", "amex", "chase"]).unwrap();
        let keys: Vec<&str> = set.cards().iter().map(CardKey::as_str).collect();
        assert_eq!(keys, ["sapphire", "amex", "chase"]);
    }

    #[test]
    fn test_with_card_is_idempotent_for_held_cards() {
        let set = CardSet::from_keys(["amex", "chase"]).unwrap();
        let same = set.with_card(&CardKey::new("amex"));
        assert_eq!(same, set);

        let grown = set.with_card(&CardKey::new("sapphire"));
        assert_eq!(grown.len(), 3);
        assert_eq!(grown.cards()[2], CardKey::new("sapphire"));
        // The original set is untouched
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_card_set_add_remove() {
        let mut set = CardSet::empty();
        set.add(CardKey::new("savor")).unwrap();
        assert!(set.add(CardKey::new("savor")).is_err());
        assert!(set.remove(&CardKey::new("savor")));
        assert!(!set.remove(&CardKey::new("savor")));
        assert!(set.is_empty());
    }

    #[test]
    fn test_estimate_splits_exactly() {
        // 48,000/yr with 12,000 of travel: every split lands on whole dollars
        let profile = SpendEstimate::new(dec!(48000), dec!(12000))
            .to_profile()
            .unwrap();
        assert_eq!(profile.monthly_spend(SpendCategory::Hotels), dec!(500));
        assert_eq!(profile.monthly_spend(SpendCategory::Flights), dec!(300));
        assert_eq!(profile.monthly_spend(SpendCategory::OtherTravel), dec!(200));
        assert_eq!(profile.monthly_spend(SpendCategory::Dining), dec!(600));
        assert_eq!(profile.monthly_spend(SpendCategory::Groceries), dec!(900));
        assert_eq!(profile.monthly_spend(SpendCategory::Gas), dec!(450));
        assert_eq!(profile.monthly_spend(SpendCategory::Other), dec!(1050));
        assert_eq!(profile.total_annual(), dec!(48000));
    }

    #[test]
    fn test_estimate_emphasis_boosts_category_and_preserves_total() {
        let profile = SpendEstimate::new(dec!(48000), dec!(12000))
            .with_emphasis(SpendCategory::Dining)
            .to_profile()
            .unwrap();
        // 7200 * 1.33 = 9576 annually, 798 monthly
        assert_eq!(profile.monthly_spend(SpendCategory::Dining), dec!(798));
        // `other` gives back the boost: 12600 - 2376 = 10224 annually
        assert_eq!(profile.monthly_spend(SpendCategory::Other), dec!(852));
        assert_eq!(profile.total_annual(), dec!(48000));
    }

    #[test]
    fn test_estimate_rejects_travel_above_total() {
        let err = SpendEstimate::new(dec!(1000), dec!(2000))
            .to_profile()
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ESTIMATE");
    }

    #[test]
    fn test_estimate_zero_totals() {
        let profile = SpendEstimate::new(Decimal::ZERO, Decimal::ZERO)
            .to_profile()
            .unwrap();
        assert_eq!(profile.total_monthly(), Decimal::ZERO);
    }

    #[test]
    fn test_profile_serde_round_trip() {
        let profile = profile_500_dining();
        let json = serde_json::to_string(&profile).unwrap();
        assert!(json.contains("\"otherTravel\""));
        let back: SpendProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }
}
