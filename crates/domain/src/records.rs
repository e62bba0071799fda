//! Persisted record types, mirroring the rows exchanged with the hosted backend.

use chrono::{DateTime, Utc};
use common::{ClientId, GroupId, LineItemId, MerchantId, Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::status::OrderStatus;

/// One product-and-quantity row created at checkout.
///
/// Line items are created once (one per distinct product in the cart),
/// mutated only by status transitions, and never deleted in normal
/// operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub merchant_id: MerchantId,
    pub client_id: ClientId,
    pub product_id: ProductId,
    /// Quantity ordered, always positive.
    pub quantity: u32,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Checkout group this row belongs to. Absent on legacy rows, which
    /// fall back to minute-bucket grouping during aggregation.
    pub group_id: Option<GroupId>,
}

impl LineItem {
    /// Creates a new pending line item, timestamped at `created_at`.
    pub fn new(
        merchant_id: MerchantId,
        client_id: ClientId,
        product_id: ProductId,
        quantity: u32,
        created_at: DateTime<Utc>,
        group_id: Option<GroupId>,
    ) -> Self {
        Self {
            id: LineItemId::new(),
            merchant_id,
            client_id,
            product_id,
            quantity,
            status: OrderStatus::Pending,
            created_at,
            updated_at: created_at,
            group_id,
        }
    }
}

/// A merchant's product, used as a read-only price/name lookup table
/// during aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub merchant_id: MerchantId,
    pub name: String,
    /// Unit price, never negative.
    pub price: Money,
    #[serde(default)]
    pub description: String,
    /// Opaque image payload managed by the backend's file storage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

impl Product {
    /// Creates a merchant's product with the given id, name, and price.
    pub fn new(
        merchant_id: MerchantId,
        id: impl Into<ProductId>,
        name: impl Into<String>,
        price: Money,
    ) -> Self {
        Self {
            id: id.into(),
            merchant_id,
            name: name.into(),
            price,
            description: String::new(),
            image_data: None,
        }
    }
}

/// Denormalized client identity carried on an order group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSnapshot {
    pub id: ClientId,
    pub merchant_id: MerchantId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// A client-facing notification row, created when a merchant advances
/// an order group's status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub client_id: ClientId,
    pub merchant_id: MerchantId,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}
