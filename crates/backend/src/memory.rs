//! In-memory backend implementation.
//!
//! Provides the same interface as the hosted service, backed by plain
//! vectors. Used by tests as the reference semantics for the trait,
//! with failure-injection toggles for exercising degraded paths.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{ClientId, GroupId, LineItemId, MerchantId, ProductId};
use domain::{ClientSnapshot, LineItem, Notification, OrderStatus, Product};
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use crate::error::{BackendError, Result};
use crate::store::{Backend, ChangeEvent};

const FEED_CAPACITY: usize = 64;

#[derive(Default)]
struct Tables {
    line_items: Vec<LineItem>,
    clients: Vec<ClientSnapshot>,
    products: Vec<Product>,
    notifications: Vec<Notification>,
    feeds: HashMap<MerchantId, broadcast::Sender<ChangeEvent>>,
    fail_on_batch_update: bool,
    fail_on_notification: bool,
    /// When set, batch updates silently stop writing after this many
    /// rows while still reporting success, simulating a store without
    /// batch atomicity. Implies `atomic_batches() == false`.
    lose_writes_after: Option<usize>,
}

impl Tables {
    fn feed(&mut self, merchant_id: MerchantId) -> &broadcast::Sender<ChangeEvent> {
        self.feeds
            .entry(merchant_id)
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
    }

    fn announce(&mut self, merchant_id: MerchantId, event: ChangeEvent) {
        // A send error only means nobody is subscribed.
        let _ = self.feed(merchant_id).send(event);
    }
}

/// In-memory backend for tests and local runs.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<RwLock<Tables>>,
}

impl InMemoryBackend {
    /// Creates a new empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client row.
    pub async fn insert_client(&self, client: ClientSnapshot) {
        self.state.write().await.clients.push(client);
    }

    /// Registers a product row.
    pub async fn insert_product(&self, product: Product) {
        self.state.write().await.products.push(product);
    }

    /// Records a checkout: one pending line item per cart entry, all
    /// tagged with a fresh group id, announced on the merchant's feed.
    pub async fn checkout(
        &self,
        merchant_id: MerchantId,
        client_id: ClientId,
        cart: &[(ProductId, u32)],
    ) -> GroupId {
        let group_id = GroupId::new(format!("CMD-{}", Uuid::new_v4().simple()));
        let now = Utc::now();
        let mut state = self.state.write().await;
        for (product_id, quantity) in cart {
            let item = LineItem::new(
                merchant_id,
                client_id,
                product_id.clone(),
                *quantity,
                now,
                Some(group_id.clone()),
            );
            let id = item.id;
            state.line_items.push(item);
            state.announce(merchant_id, ChangeEvent::Inserted(id));
        }
        tracing::debug!(%group_id, rows = cart.len(), "checkout recorded");
        group_id
    }

    /// Inserts a raw line item, for seeding legacy rows without a group id.
    pub async fn insert_line_item(&self, item: LineItem) {
        let mut state = self.state.write().await;
        let merchant_id = item.merchant_id;
        let id = item.id;
        state.line_items.push(item);
        state.announce(merchant_id, ChangeEvent::Inserted(id));
    }

    /// Returns a line item row by id.
    pub async fn line_item(&self, id: LineItemId) -> Option<LineItem> {
        self.state
            .read()
            .await
            .line_items
            .iter()
            .find(|item| item.id == id)
            .cloned()
    }

    /// Returns the notifications addressed to a client.
    pub async fn notifications_for(&self, client_id: ClientId) -> Vec<Notification> {
        self.state
            .read()
            .await
            .notifications
            .iter()
            .filter(|n| n.client_id == client_id)
            .cloned()
            .collect()
    }

    /// Makes the next batch updates fail with an unavailability error.
    pub async fn set_fail_on_batch_update(&self, fail: bool) {
        self.state.write().await.fail_on_batch_update = fail;
    }

    /// Makes notification creation fail.
    pub async fn set_fail_on_notification(&self, fail: bool) {
        self.state.write().await.fail_on_notification = fail;
    }

    /// Simulates a store without batch atomicity: writes past `n` rows
    /// are silently lost while the call still reports success.
    pub async fn set_lose_writes_after(&self, n: Option<usize>) {
        self.state.write().await.lose_writes_after = n;
    }

    /// Clears all rows and toggles.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.line_items.clear();
        state.clients.clear();
        state.products.clear();
        state.notifications.clear();
        state.fail_on_batch_update = false;
        state.fail_on_notification = false;
        state.lose_writes_after = None;
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn fetch_line_items(&self, merchant_id: MerchantId) -> Result<Vec<LineItem>> {
        Ok(self
            .state
            .read()
            .await
            .line_items
            .iter()
            .filter(|item| item.merchant_id == merchant_id)
            .cloned()
            .collect())
    }

    async fn fetch_clients(&self, merchant_id: MerchantId) -> Result<Vec<ClientSnapshot>> {
        Ok(self
            .state
            .read()
            .await
            .clients
            .iter()
            .filter(|client| client.merchant_id == merchant_id)
            .cloned()
            .collect())
    }

    async fn fetch_products(&self, merchant_id: MerchantId) -> Result<Vec<Product>> {
        Ok(self
            .state
            .read()
            .await
            .products
            .iter()
            .filter(|product| product.merchant_id == merchant_id)
            .cloned()
            .collect())
    }

    async fn batch_update_status(&self, ids: &[LineItemId], status: OrderStatus) -> Result<()> {
        let mut state = self.state.write().await;

        if state.fail_on_batch_update {
            return Err(BackendError::Unavailable(
                "injected batch update failure".to_string(),
            ));
        }

        // Reject the whole batch before touching any row.
        for id in ids {
            if !state.line_items.iter().any(|item| item.id == *id) {
                return Err(BackendError::UnknownLineItem(*id));
            }
        }

        let now = Utc::now();
        let limit = state.lose_writes_after.unwrap_or(ids.len());
        let mut touched = Vec::new();
        for id in ids.iter().take(limit) {
            if let Some(item) = state.line_items.iter_mut().find(|item| item.id == *id) {
                item.status = status;
                item.updated_at = now;
                touched.push((item.merchant_id, item.id));
            }
        }
        for (merchant_id, id) in touched {
            state.announce(merchant_id, ChangeEvent::Updated(id));
        }
        Ok(())
    }

    async fn create_notification(&self, notification: Notification) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_on_notification {
            return Err(BackendError::Notification(
                "injected notification failure".to_string(),
            ));
        }
        state.notifications.push(notification);
        Ok(())
    }

    async fn subscribe(&self, merchant_id: MerchantId) -> broadcast::Receiver<ChangeEvent> {
        self.state.write().await.feed(merchant_id).subscribe()
    }

    async fn atomic_batches(&self) -> bool {
        self.state.read().await.lose_writes_after.is_none()
    }
}
