//! Data Transfer Objects
//!
//! Request and response structures for the API.
//! All DTOs are Binance-compatible where applicable.

pub mod auth;
pub mod account;
pub mod wallet;
pub mod order;
pub mod market;
pub mod common;

pub use auth::*;
pub use account::*;
pub use wallet::*;
pub use order::*;
pub use market::*;
pub use common::*;
