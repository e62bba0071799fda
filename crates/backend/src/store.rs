//! The backend trait: every operation the order core needs from the
//! hosted persistence service.

use async_trait::async_trait;
use common::{LineItemId, MerchantId};
use domain::{ClientSnapshot, LineItem, Notification, OrderStatus, Product};
use tokio::sync::broadcast;

use crate::error::Result;

/// A row change announced on a merchant's realtime feed.
///
/// Consumers must treat any received event purely as a trigger to
/// re-fetch and re-aggregate, never as a source of incremental deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A line item row was inserted for this merchant.
    Inserted(LineItemId),
    /// A line item row was updated for this merchant.
    Updated(LineItemId),
}

/// The persistence/notification collaborator.
///
/// All reads return fresh snapshots; the line-item collection is only
/// ever mutated through [`batch_update_status`](Backend::batch_update_status).
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetches every line item belonging to a merchant.
    async fn fetch_line_items(&self, merchant_id: MerchantId) -> Result<Vec<LineItem>>;

    /// Fetches the client snapshots known to a merchant.
    async fn fetch_clients(&self, merchant_id: MerchantId) -> Result<Vec<ClientSnapshot>>;

    /// Fetches a merchant's product catalog.
    async fn fetch_products(&self, merchant_id: MerchantId) -> Result<Vec<Product>>;

    /// Sets the status of every listed line item and refreshes its
    /// `updated_at`, as one batch. Either all rows update or the call
    /// reports failure without writing.
    async fn batch_update_status(&self, ids: &[LineItemId], status: OrderStatus) -> Result<()>;

    /// Creates a client-facing notification row. Fire-and-forget
    /// semantics are tolerated by callers.
    async fn create_notification(&self, notification: Notification) -> Result<()>;

    /// Subscribes to the merchant's row change feed.
    async fn subscribe(&self, merchant_id: MerchantId) -> broadcast::Receiver<ChangeEvent>;

    /// True if [`batch_update_status`](Backend::batch_update_status) is
    /// genuinely atomic. Callers must re-fetch and verify after writes
    /// to a backend that cannot promise this.
    async fn atomic_batches(&self) -> bool {
        true
    }
}
