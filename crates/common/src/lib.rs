//! Shared types for the marketplace order core.
//!
//! Identifier newtypes keep merchant, client, line-item, product, and
//! group ids from being mixed up at compile time. [`Money`] carries
//! amounts as integer cents to avoid floating point issues.

pub mod types;

pub use types::{ClientId, GroupId, LineItemId, MerchantId, Money, ProductId};
