//! Domain layer for the marketplace order core.
//!
//! This crate provides the building blocks of the order lifecycle:
//! - Persisted record types ([`LineItem`], [`Product`], [`ClientSnapshot`],
//!   [`Notification`])
//! - The [`OrderStatus`] state machine
//! - Group-key derivation for folding line items into logical orders
//! - The [`aggregate`] function producing [`OrderGroup`] views

pub mod aggregator;
pub mod group_key;
pub mod records;
pub mod status;

pub use aggregator::{OrderGroup, aggregate, derive_status};
pub use group_key::group_key;
pub use records::{ClientSnapshot, LineItem, Notification, Product};
pub use status::{OrderStatus, ParseStatusError};
