//! Persistence and notification boundary for the order core.
//!
//! The hosted backend (rows, notifications, realtime change feed) is
//! reached exclusively through the [`Backend`] trait. [`InMemoryBackend`]
//! provides the reference semantics and the test double, including
//! failure injection and a per-merchant broadcast change feed.

pub mod error;
pub mod memory;
pub mod store;

pub use error::{BackendError, Result};
pub use memory::InMemoryBackend;
pub use store::{Backend, ChangeEvent};
