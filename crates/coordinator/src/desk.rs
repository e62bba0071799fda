//! Merchant-facing order desk: fetch fresh, aggregate, observe.

use backend::{Backend, ChangeEvent};
use common::MerchantId;
use domain::{OrderGroup, OrderStatus, aggregate};
use tokio::sync::broadcast;

use crate::error::CoordinatorError;
use crate::transition::StatusCoordinator;

/// High-level entry point for a merchant session.
///
/// The desk holds no group state between calls: every load reads a
/// fresh snapshot of the three backing collections and recomputes the
/// aggregation from scratch. Session state (filters, selection, cart)
/// belongs to the caller.
pub struct OrderDesk<B: Backend> {
    backend: B,
    coordinator: StatusCoordinator<B>,
}

impl<B: Backend + Clone> OrderDesk<B> {
    /// Creates an order desk over the given backend.
    pub fn new(backend: B) -> Self {
        Self {
            coordinator: StatusCoordinator::new(backend.clone()),
            backend,
        }
    }

    /// Fetches the merchant's rows and folds them into order groups,
    /// newest first.
    #[tracing::instrument(skip(self))]
    pub async fn load_groups(
        &self,
        merchant_id: MerchantId,
    ) -> Result<Vec<OrderGroup>, CoordinatorError> {
        fetch_and_aggregate(&self.backend, merchant_id).await
    }

    /// Advances a group to `target`. See [`StatusCoordinator::transition`].
    pub async fn transition(
        &self,
        group: &OrderGroup,
        target: OrderStatus,
    ) -> Result<OrderGroup, CoordinatorError> {
        self.coordinator.transition(group, target).await
    }

    /// Subscribes to the merchant's change feed. Each announced insert
    /// or update triggers a full re-fetch and re-aggregation.
    pub async fn watch(&self, merchant_id: MerchantId) -> GroupWatch<B> {
        GroupWatch {
            backend: self.backend.clone(),
            merchant_id,
            rx: self.backend.subscribe(merchant_id).await,
        }
    }
}

/// A live view over a merchant's order groups, driven by the backend's
/// change feed.
pub struct GroupWatch<B: Backend> {
    backend: B,
    merchant_id: MerchantId,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl<B: Backend> GroupWatch<B> {
    /// Waits for the next row change, then returns a freshly
    /// aggregated group list. Returns `None` when the feed closes.
    ///
    /// A lagged receiver is treated like any other change signal: the
    /// events themselves carry no data the re-fetch would miss.
    pub async fn next_groups(&mut self) -> Result<Option<Vec<OrderGroup>>, CoordinatorError> {
        match self.rx.recv().await {
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "change feed lagged, refreshing anyway");
            }
            Err(broadcast::error::RecvError::Closed) => return Ok(None),
        }
        fetch_and_aggregate(&self.backend, self.merchant_id)
            .await
            .map(Some)
    }
}

async fn fetch_and_aggregate<B: Backend>(
    backend: &B,
    merchant_id: MerchantId,
) -> Result<Vec<OrderGroup>, CoordinatorError> {
    let line_items = backend.fetch_line_items(merchant_id).await?;
    let clients = backend.fetch_clients(merchant_id).await?;
    let products = backend.fetch_products(merchant_id).await?;
    Ok(aggregate(&line_items, &clients, &products))
}
