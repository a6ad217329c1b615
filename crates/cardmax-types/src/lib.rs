//! CardMax Types - Canonical domain types for card reward valuation
//!
//! This crate contains all foundational types for CardMax with zero
//! dependencies on other cardmax crates. It defines:
//!
//! - Spending categories (the closed set every reward table covers)
//! - Card identifiers (stable keys used throughout the system)
//! - Spending profiles (validated monthly dollars per category)
//! - Card sets (ordered, duplicate-free sets of held cards)
//! - Spend estimation (seeding a profile from questionnaire totals)
//! - Error types shared across the workspace
//!
//! # Architectural Invariants
//!
//! 1. A profile covers every category; no amount is ever negative
//! 2. A card set preserves insertion order and never holds duplicates
//! 3. Every failure is an explicit `Result`; nothing defaults silently
//! 4. Valuation math is `Decimal` end to end — no floating point

pub mod category;
pub mod error;
pub mod key;
pub mod profile;

pub use category::*;
pub use error::*;
pub use key::*;
pub use profile::*;

/// Version of the CardMax types schema
pub const TYPES_VERSION: &str = "0.1.0";
