//! Spending categories
//!
//! The closed set of purchase categories a reward program prices. Every
//! card's rate table covers all of them; a profile assigns a monthly
//! amount to each.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CardMaxError;

/// Purchase categories recognized by every reward-rate table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpendCategory {
    /// Restaurants and takeout
    Dining,
    /// Airfare
    Flights,
    /// Hotel stays
    Hotels,
    /// Travel that is neither air nor lodging (transit, rideshare, rentals)
    OtherTravel,
    /// Supermarkets
    Groceries,
    /// Fuel stations
    Gas,
    /// Everything else
    Other,
}

impl SpendCategory {
    /// All categories, in canonical display order
    pub const ALL: [SpendCategory; 7] = [
        Self::Dining,
        Self::Flights,
        Self::Hotels,
        Self::OtherTravel,
        Self::Groceries,
        Self::Gas,
        Self::Other,
    ];

    /// Get the stable wire key for this category
    pub fn key(&self) -> &'static str {
        match self {
            Self::Dining => "dining",
            Self::Flights => "flights",
            Self::Hotels => "hotels",
            Self::OtherTravel => "otherTravel",
            Self::Groceries => "groceries",
            Self::Gas => "gas",
            Self::Other => "other",
        }
    }

    /// Get the display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Dining => "Dining",
            Self::Flights => "Flights",
            Self::Hotels => "Hotels",
            Self::OtherTravel => "Other Travel",
            Self::Groceries => "Groceries",
            Self::Gas => "Gas",
            Self::Other => "Other",
        }
    }

    /// Check if this category belongs to the travel block
    pub fn is_travel(&self) -> bool {
        matches!(self, Self::Flights | Self::Hotels | Self::OtherTravel)
    }
}

impl fmt::Display for SpendCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for SpendCategory {
    type Err = CardMaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dining" => Ok(Self::Dining),
            "flights" => Ok(Self::Flights),
            "hotels" => Ok(Self::Hotels),
            "otherTravel" => Ok(Self::OtherTravel),
            "groceries" => Ok(Self::Groceries),
            "gas" => Ok(Self::Gas),
            "other" => Ok(Self::Other),
            unknown => Err(CardMaxError::UnknownCategory {
                category: unknown.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_covers_every_category() {
        assert_eq!(SpendCategory::ALL.len(), 7);
        for pair in SpendCategory::ALL.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn test_key_round_trip() {
        for category in SpendCategory::ALL {
            assert_eq!(category.key().parse::<SpendCategory>().ok(), Some(category));
        }
        assert!("groceries ".parse::<SpendCategory>().is_err());
    }

    #[test]
    fn test_travel_block() {
        assert!(SpendCategory::Flights.is_travel());
        assert!(SpendCategory::Hotels.is_travel());
        assert!(SpendCategory::OtherTravel.is_travel());
        assert!(!SpendCategory::Dining.is_travel());
        assert!(!SpendCategory::Other.is_travel());
    }

    #[test]
    fn test_serde_uses_wire_keys() {
        let json = serde_json::to_string(&SpendCategory::OtherTravel).unwrap();
        assert_eq!(json, "\"otherTravel\"");
        let back: SpendCategory = serde_json::from_str("\"gas\"").unwrap();
        assert_eq!(back, SpendCategory::Gas);
    }
}
