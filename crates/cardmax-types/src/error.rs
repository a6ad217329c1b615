//! Error types for CardMax
//!
//! All failures are explicit. Constructors and engine entry points return
//! `Result`; a bad card key or a gap in a profile is reported at the
//! boundary, never silently defaulted.

use thiserror::Error;

/// Result type for CardMax operations
pub type Result<T> = std::result::Result<T, CardMaxError>;

/// CardMax error types
#[derive(Debug, Clone, Error)]
pub enum CardMaxError {
    // ========================================================================
    // Category & Profile Errors
    // ========================================================================

    /// Unrecognized category key
    #[error("Unknown spend category: {category}")]
    UnknownCategory { category: String },

    /// Profile has a gap
    #[error("Spend profile is missing category {category}")]
    MissingCategory { category: String },

    /// Negative monthly amount
    #[error("Negative spend for category {category}: {amount}")]
    NegativeSpend { category: String, amount: String },

    /// Estimate totals out of range
    #[error("Invalid spend estimate: {reason}")]
    InvalidEstimate { reason: String },

    // ========================================================================
    // Card Set Errors
    // ========================================================================

    /// Same card held twice
    #[error("Card {card} appears more than once in the card set")]
    DuplicateCard { card: String },

    // ========================================================================
    // Catalog Errors
    // ========================================================================

    /// Card key not present in the catalog
    #[error("Unknown card: {card}")]
    UnknownCard { card: String },

    /// Catalog defines the same key twice
    #[error("Card {card} is defined more than once in the catalog")]
    DuplicateCatalogCard { card: String },

    /// Rate table gap discovered while building a card
    #[error("Card {card} has no reward rate for category {category}")]
    MissingRate { card: String, category: String },

    /// Negative fee, rate, benefit, or point value in catalog data
    #[error("Negative {field} for card {card}: {value}")]
    NegativeCardValue {
        card: String,
        field: String,
        value: String,
    },

    /// Pooling family references a card the catalog does not define
    #[error("Pooling family {family} references unknown card {card}")]
    UnknownFamilyMember { family: String, card: String },

    /// A card may pool with at most one family
    #[error("Card {card} belongs to both the {first} and {second} pooling families")]
    OverlappingFamilies {
        card: String,
        first: String,
        second: String,
    },

    /// A family of one cannot pool anything
    #[error("Pooling family {family} has {members} member(s); at least 2 required")]
    FamilyTooSmall { family: String, members: usize },

    /// Catalog with no cards
    #[error("Catalog contains no cards")]
    EmptyCatalog,

    // ========================================================================
    // Point Value Errors
    // ========================================================================

    /// No cents-per-point configured for a card
    #[error("No point value configured for card {card}")]
    MissingPointValue { card: String },

    /// Negative cents-per-point override
    #[error("Negative point value for card {card}: {value}")]
    NegativePointValue { card: String, value: String },
}

impl CardMaxError {
    /// Create an unknown-card error
    pub fn unknown_card(card: impl Into<String>) -> Self {
        Self::UnknownCard { card: card.into() }
    }

    /// Create an invalid-estimate error
    pub fn invalid_estimate(reason: impl Into<String>) -> Self {
        Self::InvalidEstimate {
            reason: reason.into(),
        }
    }

    /// Get an error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownCategory { .. } => "UNKNOWN_CATEGORY",
            Self::MissingCategory { .. } => "MISSING_CATEGORY",
            Self::NegativeSpend { .. } => "NEGATIVE_SPEND",
            Self::InvalidEstimate { .. } => "INVALID_ESTIMATE",
            Self::DuplicateCard { .. } => "DUPLICATE_CARD",
            Self::UnknownCard { .. } => "UNKNOWN_CARD",
            Self::DuplicateCatalogCard { .. } => "DUPLICATE_CATALOG_CARD",
            Self::MissingRate { .. } => "MISSING_RATE",
            Self::NegativeCardValue { .. } => "NEGATIVE_CARD_VALUE",
            Self::UnknownFamilyMember { .. } => "UNKNOWN_FAMILY_MEMBER",
            Self::OverlappingFamilies { .. } => "OVERLAPPING_FAMILIES",
            Self::FamilyTooSmall { .. } => "FAMILY_TOO_SMALL",
            Self::EmptyCatalog => "EMPTY_CATALOG",
            Self::MissingPointValue { .. } => "MISSING_POINT_VALUE",
            Self::NegativePointValue { .. } => "NEGATIVE_POINT_VALUE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = CardMaxError::unknown_card("mystery");
        assert_eq!(err.error_code(), "UNKNOWN_CARD");
        assert_eq!(err.to_string(), "Unknown card: mystery");
    }

    #[test]
    fn test_negative_value_message() {
        let err = CardMaxError::NegativeCardValue {
            card: "amex".to_string(),
            field: "annual fee".to_string(),
            value: "-5".to_string(),
        };
        assert_eq!(err.error_code(), "NEGATIVE_CARD_VALUE");
        assert_eq!(err.to_string(), "Negative annual fee for card amex: -5");
    }
}
