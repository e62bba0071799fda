//! Order status state machine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The status of a line item, and by derivation of an order group.
///
/// Transitions:
/// ```text
/// Pending ──► Processing ──► Delivered
///    │            │
///    └────────────┴──► Cancelled
/// ```
///
/// `Delivered` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed at checkout, not yet picked up by the merchant.
    #[default]
    Pending,

    /// The merchant is preparing the order.
    Processing,

    /// The order has been delivered (terminal state).
    Delivered,

    /// The order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns true if `target` is a legal successor of this status.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        matches!(
            (self, target),
            (OrderStatus::Pending, OrderStatus::Processing)
                | (OrderStatus::Processing, OrderStatus::Delivered)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Processing, OrderStatus::Cancelled)
        )
    }

    /// Returns the status name as stored on backend rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Returns the client-facing French label used in notifications and UI.
    pub fn label_fr(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "en attente",
            OrderStatus::Processing => "en cours de préparation",
            OrderStatus::Delivered => "livrée",
            OrderStatus::Cancelled => "annulée",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order status: {0:?}")]
pub struct ParseStatusError(pub String);

impl std::str::FromStr for OrderStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}
