//! Card records
//!
//! A `Card` is pure configuration: what it earns, what it costs, and what a
//! point is worth when the card stands alone. Cards are built through
//! `CardBuilder`, which refuses gaps in the rate table and negative amounts.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cardmax_types::{CardKey, CardMaxError, Result, SpendCategory};

/// One credit card: identity, rate table, cost, and point economics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Stable identifier
    pub key: CardKey,
    /// Display name
    pub label: String,
    /// Points earned per dollar, by category
    pub reward_rates: BTreeMap<SpendCategory, Decimal>,
    /// Dollars charged once per year, regardless of spend
    pub annual_fee: Decimal,
    /// Assessed annual cash value of non-reward perks
    pub other_benefits_value: Decimal,
    /// Human-readable description of those perks
    pub other_benefits_summary: String,
    /// Cents one point is worth when the card is evaluated alone
    pub base_point_value: Decimal,
}

impl Card {
    /// Start building a card
    pub fn builder(key: impl Into<CardKey>, label: impl Into<String>) -> CardBuilder {
        CardBuilder::new(key, label)
    }

    /// Reward rate for one category
    pub fn reward_rate(&self, category: SpendCategory) -> Decimal {
        self.reward_rates
            .get(&category)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Check rate coverage and non-negative amounts
    pub fn validate(&self) -> Result<()> {
        for category in SpendCategory::ALL {
            match self.reward_rates.get(&category) {
                None => {
                    return Err(CardMaxError::MissingRate {
                        card: self.key.to_string(),
                        category: category.to_string(),
                    })
                }
                Some(rate) if *rate < Decimal::ZERO => {
                    return Err(self.negative("reward rate", *rate))
                }
                Some(_) => {}
            }
        }
        if self.annual_fee < Decimal::ZERO {
            return Err(self.negative("annual fee", self.annual_fee));
        }
        if self.other_benefits_value < Decimal::ZERO {
            return Err(self.negative("other benefits value", self.other_benefits_value));
        }
        if self.base_point_value < Decimal::ZERO {
            return Err(self.negative("base point value", self.base_point_value));
        }
        Ok(())
    }

    fn negative(&self, field: &str, value: Decimal) -> CardMaxError {
        CardMaxError::NegativeCardValue {
            card: self.key.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Builder for `Card`
///
/// `build` validates, so a card that leaves the builder is usable as-is.
#[derive(Debug, Clone)]
pub struct CardBuilder {
    key: CardKey,
    label: String,
    reward_rates: BTreeMap<SpendCategory, Decimal>,
    annual_fee: Decimal,
    other_benefits_value: Decimal,
    other_benefits_summary: String,
    base_point_value: Decimal,
}

impl CardBuilder {
    /// Create a new builder
    pub fn new(key: impl Into<CardKey>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            reward_rates: BTreeMap::new(),
            annual_fee: Decimal::ZERO,
            other_benefits_value: Decimal::ZERO,
            other_benefits_summary: String::new(),
            base_point_value: Decimal::ONE,
        }
    }

    /// Set the reward rate for one category
    pub fn rate(mut self, category: SpendCategory, rate: Decimal) -> Self {
        self.reward_rates.insert(category, rate);
        self
    }

    /// Set the same reward rate for every category
    pub fn flat_rate(mut self, rate: Decimal) -> Self {
        for category in SpendCategory::ALL {
            self.reward_rates.insert(category, rate);
        }
        self
    }

    /// Set the annual fee
    pub fn annual_fee(mut self, fee: Decimal) -> Self {
        self.annual_fee = fee;
        self
    }

    /// Set the assessed benefits value and its description
    pub fn benefits(mut self, value: Decimal, summary: impl Into<String>) -> Self {
        self.other_benefits_value = value;
        self.other_benefits_summary = summary.into();
        self
    }

    /// Set the standalone cents-per-point value
    pub fn base_point_value(mut self, cents: Decimal) -> Self {
        self.base_point_value = cents;
        self
    }

    /// Finish and validate the card
    pub fn build(self) -> Result<Card> {
        let card = Card {
            key: self.key,
            label: self.label,
            reward_rates: self.reward_rates,
            annual_fee: self.annual_fee,
            other_benefits_value: self.other_benefits_value,
            other_benefits_summary: self.other_benefits_summary,
            base_point_value: self.base_point_value,
        };
        card.validate()?;
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builder_requires_full_rate_coverage() {
        let err = Card::builder("partial", "Partial Card")
            .rate(SpendCategory::Dining, dec!(3))
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "MISSING_RATE");
    }

    #[test]
    fn test_builder_flat_rate_covers_everything() {
        let card = Card::builder("citi", "Citibank Double Cash")
            .flat_rate(dec!(2))
            .build()
            .unwrap();
        for category in SpendCategory::ALL {
            assert_eq!(card.reward_rate(category), dec!(2));
        }
        assert_eq!(card.annual_fee, Decimal::ZERO);
        assert_eq!(card.base_point_value, Decimal::ONE);
    }

    #[test]
    fn test_builder_rejects_negative_fee() {
        let err = Card::builder("bad", "Bad Card")
            .flat_rate(dec!(1))
            .annual_fee(dec!(-95))
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "NEGATIVE_CARD_VALUE");
    }

    #[test]
    fn test_builder_rejects_negative_rate() {
        let err = Card::builder("bad", "Bad Card")
            .flat_rate(dec!(1))
            .rate(SpendCategory::Gas, dec!(-1))
            .build()
            .unwrap_err();
        assert_eq!(err.error_code(), "NEGATIVE_CARD_VALUE");
    }

    #[test]
    fn test_specific_rate_overrides_flat_rate() {
        let card = Card::builder("savor", "Capital One Savor")
            .flat_rate(dec!(1))
            .rate(SpendCategory::Dining, dec!(3))
            .rate(SpendCategory::Groceries, dec!(3))
            .build()
            .unwrap();
        assert_eq!(card.reward_rate(SpendCategory::Dining), dec!(3));
        assert_eq!(card.reward_rate(SpendCategory::Flights), dec!(1));
    }
}
