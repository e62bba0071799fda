//! Order status coordination for the marketplace order core.
//!
//! [`StatusCoordinator`] validates and applies status transitions to an
//! order group: an all-or-nothing batch write over the group's line
//! items, an optimistic local update, and a best-effort client
//! notification. [`OrderDesk`] is the merchant-facing entry point that
//! wires fetch → aggregate → observe over the backend boundary.

pub mod config;
pub mod desk;
pub mod error;
pub mod transition;

pub use config::Config;
pub use desk::{GroupWatch, OrderDesk};
pub use error::CoordinatorError;
pub use transition::StatusCoordinator;
