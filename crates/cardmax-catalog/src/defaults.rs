//! Built-in production catalog
//!
//! The cards CardMax ships with, as currently assessed.
//!
//! | Card                     | Fee  | Benefits | Base ¢/pt |
//! |--------------------------|------|----------|-----------|
//! | Chase Freedom Unlimited  | $0   | $0       | 1.0       |
//! | Amex Gold                | $320 | $220     | 1.5       |
//! | Chase Sapphire Preferred | $99  | $0       | 1.5       |
//! | Chase Sapphire Reserve   | $795 | $300     | 1.5       |
//! | Citibank Double Cash     | $0   | $0       | 1.0       |
//! | Citi Premier             | $95  | $100     | 1.85      |
//! | Capital One Savor        | $0   | $0       | 1.0       |
//! | Capital One Venture X    | $395 | $400     | 1.25      |
//! | Amex Blue Cash Preferred | $95  | $0       | 1.0       |
//!
//! Two pooling families: Ultimate Rewards (chase, sapphire,
//! sapphirereserve) and ThankYou (citi, citipremier). Citi Premier is
//! hidden from user-facing selection but fully priced when held.

use rust_decimal_macros::dec;

use cardmax_types::{CardKey, Result, SpendCategory, SpendProfile};

use crate::card::Card;
use crate::catalog::CardCatalog;
use crate::family::PoolingFamily;

/// Name of the Chase transferable-points family
pub const ULTIMATE_REWARDS: &str = "Ultimate Rewards";

/// Name of the Citi transferable-points family
pub const THANK_YOU: &str = "ThankYou";

/// The built-in catalog
pub fn default_catalog() -> CardCatalog {
    build_default_catalog().expect("built-in catalog data is valid")
}

/// The default monthly spending profile used to seed a fresh session
pub fn default_spend_profile() -> SpendProfile {
    SpendProfile::from_monthly([
        (SpendCategory::Dining, dec!(500)),
        (SpendCategory::Flights, dec!(100)),
        (SpendCategory::Hotels, dec!(150)),
        (SpendCategory::OtherTravel, dec!(50)),
        (SpendCategory::Groceries, dec!(500)),
        (SpendCategory::Gas, dec!(100)),
        (SpendCategory::Other, dec!(1000)),
    ])
    .expect("built-in spend profile is valid")
}

fn build_default_catalog() -> Result<CardCatalog> {
    let cards = vec![
        Card::builder("chase", "Chase Freedom Unlimited")
            .flat_rate(dec!(1.5))
            .rate(SpendCategory::Dining, dec!(3))
            .base_point_value(dec!(1.0))
            .build()?,
        Card::builder("amex", "Amex Gold")
            .flat_rate(dec!(1))
            .rate(SpendCategory::Dining, dec!(4))
            .rate(SpendCategory::Flights, dec!(3))
            .rate(SpendCategory::Groceries, dec!(4))
            .annual_fee(dec!(320))
            .benefits(
                dec!(220),
                "$10 Uber credit/mo, $10 dining credit/mo, $50 Resy credit/6mo",
            )
            .base_point_value(dec!(1.5))
            .build()?,
        Card::builder("sapphire", "Chase Sapphire Preferred")
            .flat_rate(dec!(1))
            .rate(SpendCategory::Dining, dec!(3))
            .rate(SpendCategory::Flights, dec!(2))
            .rate(SpendCategory::Hotels, dec!(2))
            .rate(SpendCategory::OtherTravel, dec!(2))
            .annual_fee(dec!(99))
            .base_point_value(dec!(1.5))
            .build()?,
        Card::builder("sapphirereserve", "Chase Sapphire Reserve")
            .flat_rate(dec!(1))
            .rate(SpendCategory::Dining, dec!(3))
            .rate(SpendCategory::Flights, dec!(4))
            .rate(SpendCategory::Hotels, dec!(4))
            .annual_fee(dec!(795))
            .benefits(
                dec!(300),
                "$500 hotel, $300 dining, $300 entertainment, free Apple+, $120 Peloton, \
                 $120 Lyft, $300 DoorDash, IHG Platinum, lounge access",
            )
            .base_point_value(dec!(1.5))
            .build()?,
        Card::builder("citi", "Citibank Double Cash")
            .flat_rate(dec!(2))
            .base_point_value(dec!(1.0))
            .build()?,
        Card::builder("citipremier", "Citi Premier")
            .flat_rate(dec!(3))
            .rate(SpendCategory::Other, dec!(1))
            .annual_fee(dec!(95))
            .benefits(dec!(100), "$100 hotel credit/yr")
            .base_point_value(dec!(1.85))
            .build()?,
        Card::builder("savor", "Capital One Savor")
            .flat_rate(dec!(1))
            .rate(SpendCategory::Dining, dec!(3))
            .rate(SpendCategory::Groceries, dec!(3))
            .base_point_value(dec!(1.0))
            .build()?,
        Card::builder("venturex", "Capital One Venture X")
            .flat_rate(dec!(2))
            .annual_fee(dec!(395))
            .benefits(dec!(400), "$300 travel credit/yr, 10,000 anniversary miles")
            .base_point_value(dec!(1.25))
            .build()?,
        Card::builder("amexbluecash", "Amex Blue Cash Preferred")
            .flat_rate(dec!(1))
            .rate(SpendCategory::OtherTravel, dec!(3))
            .rate(SpendCategory::Groceries, dec!(6))
            .rate(SpendCategory::Gas, dec!(3))
            .annual_fee(dec!(95))
            .base_point_value(dec!(1.0))
            .build()?,
    ];

    let families = vec![
        PoolingFamily::from_keys(ULTIMATE_REWARDS, ["chase", "sapphire", "sapphirereserve"]),
        PoolingFamily::from_keys(THANK_YOU, ["citi", "citipremier"]),
    ];

    let hidden = vec![CardKey::new("citipremier")];

    CardCatalog::new(cards, families, hidden)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_default_catalog_shape() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 9);
        assert_eq!(catalog.families().len(), 2);
        // Citi Premier is the only hidden card
        assert_eq!(catalog.visible_cards().len(), 8);
        assert!(catalog.is_hidden(&CardKey::new("citipremier")));
    }

    #[test]
    fn test_default_catalog_spot_rates() {
        let catalog = default_catalog();
        let amex = catalog.card(&CardKey::new("amex")).unwrap();
        assert_eq!(amex.reward_rate(SpendCategory::Dining), dec!(4));
        assert_eq!(amex.reward_rate(SpendCategory::Hotels), dec!(1));

        let bluecash = catalog.card(&CardKey::new("amexbluecash")).unwrap();
        assert_eq!(bluecash.reward_rate(SpendCategory::Groceries), dec!(6));
        assert_eq!(bluecash.reward_rate(SpendCategory::Dining), dec!(1));

        let chase = catalog.card(&CardKey::new("chase")).unwrap();
        assert_eq!(chase.reward_rate(SpendCategory::Dining), dec!(3));
        assert_eq!(chase.reward_rate(SpendCategory::Gas), dec!(1.5));
    }

    #[test]
    fn test_default_catalog_fees_and_benefits() {
        let catalog = default_catalog();
        let reserve = catalog.card(&CardKey::new("sapphirereserve")).unwrap();
        assert_eq!(reserve.annual_fee, dec!(795));
        assert_eq!(reserve.other_benefits_value, dec!(300));

        let savor = catalog.card(&CardKey::new("savor")).unwrap();
        assert_eq!(savor.annual_fee, Decimal::ZERO);
        assert_eq!(savor.other_benefits_value, Decimal::ZERO);
        assert!(savor.other_benefits_summary.is_empty());
    }

    #[test]
    fn test_default_families() {
        let catalog = default_catalog();
        let chase_family = catalog.family_of(&CardKey::new("sapphire")).unwrap();
        assert_eq!(chase_family.name, ULTIMATE_REWARDS);
        assert_eq!(chase_family.len(), 3);

        let citi_family = catalog.family_of(&CardKey::new("citipremier")).unwrap();
        assert_eq!(citi_family.name, THANK_YOU);
        assert!(citi_family.contains(&CardKey::new("citi")));

        assert!(catalog.family_of(&CardKey::new("amex")).is_none());
        assert!(catalog.family_of(&CardKey::new("venturex")).is_none());
    }

    #[test]
    fn test_default_point_values() {
        let catalog = default_catalog();
        let values = catalog.default_point_values();
        assert_eq!(values.require(&CardKey::new("chase")).unwrap(), dec!(1.0));
        assert_eq!(
            values.require(&CardKey::new("citipremier")).unwrap(),
            dec!(1.85)
        );
        assert_eq!(values.require(&CardKey::new("venturex")).unwrap(), dec!(1.25));
        assert_eq!(values.len(), 9);
    }

    #[test]
    fn test_default_spend_profile_totals() {
        let profile = default_spend_profile();
        assert_eq!(profile.total_monthly(), dec!(2400));
        assert_eq!(profile.monthly_spend(SpendCategory::Other), dec!(1000));
    }
}
