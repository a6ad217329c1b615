//! CardMax Catalog - The card configuration layer
//!
//! Everything the valuation engine needs to know about cards lives here, as
//! immutable configuration injected at call time:
//!
//! - `Card`: identity, reward-rate table, annual fee, benefits, point value
//! - `PoolingFamily`: cards whose points share one transferable balance
//! - `CardCatalog`: the validated table of cards plus families and
//!   hidden-card designations
//! - `PointValues`: catalog defaults merged with user overrides, assembled
//!   once per evaluation
//! - The built-in production catalog and redemption reference tables
//!
//! Validation happens once, at construction. A catalog that survives
//! `CardCatalog::new` has total rate coverage, no negative amounts, no
//! duplicate keys, and internally consistent families; evaluation code
//! relies on that.

pub mod card;
pub mod catalog;
pub mod defaults;
pub mod family;

pub use card::*;
pub use catalog::*;
pub use defaults::*;
pub use family::*;
