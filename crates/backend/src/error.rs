use common::LineItemId;
use thiserror::Error;

/// Errors surfaced by the persistence boundary.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The store could not be reached or the call timed out.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A batch update referenced a line item that does not exist.
    /// The batch is rejected as a whole, nothing is written.
    #[error("unknown line item in batch update: {0}")]
    UnknownLineItem(LineItemId),

    /// The notification row could not be created.
    #[error("notification delivery failed: {0}")]
    Notification(String),
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
