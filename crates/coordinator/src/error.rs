use backend::BackendError;
use common::GroupId;
use domain::OrderStatus;
use thiserror::Error;

/// Errors surfaced by the coordinator and the order desk.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The requested status is not a legal successor of the group's
    /// current status. Nothing was written.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The group has no line items to transition.
    #[error("order group {0} has no line items")]
    EmptyGroup(GroupId),

    /// The persistence call failed; the caller may retry.
    #[error("persistence failure: {0}")]
    Persistence(#[from] BackendError),

    /// The backend reported success but the post-write recheck found
    /// rows that did not carry the target status.
    #[error("batch status update only partially applied for group {group_id}")]
    PartialApply { group_id: GroupId },
}
