//! Order group aggregation.
//!
//! Folds a merchant's flat line-item rows into [`OrderGroup`] views:
//! per-group totals, a denormalized client snapshot, and a status
//! derived from the constituent items. Aggregation is a pure function
//! of its inputs and is recomputed from scratch on every pass; groups
//! are ephemeral view objects, never persisted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{ClientId, GroupId, LineItemId, MerchantId, Money, ProductId};
use serde::{Deserialize, Serialize};

use crate::group_key::group_key;
use crate::records::{ClientSnapshot, LineItem, Product};
use crate::status::OrderStatus;

/// The logical order a client perceives: one or more line items from a
/// single checkout, with derived totals and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderGroup {
    pub group_id: GroupId,
    pub merchant_id: MerchantId,
    pub client_id: ClientId,
    /// Denormalized client identity, if the client row was found.
    pub client: Option<ClientSnapshot>,
    /// Constituent line items in arrival order, never empty.
    pub line_items: Vec<LineItem>,
    /// Earliest constituent `created_at`.
    pub created_at: DateTime<Utc>,
    /// Latest constituent `created_at`/`updated_at`.
    pub updated_at: DateTime<Utc>,
    pub total_items: u64,
    pub total_quantity: u64,
    pub total_amount: Money,
    pub status: OrderStatus,
}

impl OrderGroup {
    /// Returns the ids of every constituent line item.
    pub fn line_item_ids(&self) -> Vec<LineItemId> {
        self.line_items.iter().map(|item| item.id).collect()
    }

    /// Returns a copy of the group with every line item and the group
    /// itself carrying `status`, timestamps refreshed to `now`.
    ///
    /// Used for the optimistic local update after a persisted batch
    /// status write succeeds.
    pub fn with_status(&self, status: OrderStatus, now: DateTime<Utc>) -> OrderGroup {
        let mut updated = self.clone();
        for item in &mut updated.line_items {
            item.status = status;
            item.updated_at = now;
        }
        updated.status = status;
        updated.updated_at = now;
        updated
    }
}

/// Derives a group's status from its line items' statuses.
///
/// Precedence, highest first:
/// 1. any `cancelled` → `cancelled`
/// 2. all `delivered` → `delivered`
/// 3. any `processing` → `processing`
/// 4. otherwise `pending`
///
/// A mix of delivered and undelivered items is not fully delivered and
/// falls through to `processing` or `pending`.
pub fn derive_status(items: &[LineItem]) -> OrderStatus {
    if items
        .iter()
        .any(|i| i.status == OrderStatus::Cancelled)
    {
        OrderStatus::Cancelled
    } else if !items.is_empty()
        && items.iter().all(|i| i.status == OrderStatus::Delivered)
    {
        OrderStatus::Delivered
    } else if items
        .iter()
        .any(|i| i.status == OrderStatus::Processing)
    {
        OrderStatus::Processing
    } else {
        OrderStatus::Pending
    }
}

/// Folds line items into order groups, sorted by `created_at` descending.
///
/// Every input line item lands in exactly one group, keyed by
/// [`group_key`]. Totals are accumulated fresh on every call; a line
/// item referencing a product missing from `products` contributes zero
/// to the group total and is logged as a data-integrity concern, never
/// an error. An empty input yields an empty output.
pub fn aggregate(
    line_items: &[LineItem],
    clients: &[ClientSnapshot],
    products: &[Product],
) -> Vec<OrderGroup> {
    metrics::counter!("orders_aggregation_runs_total").increment(1);

    let product_index: HashMap<&ProductId, &Product> =
        products.iter().map(|p| (&p.id, p)).collect();
    let client_index: HashMap<ClientId, &ClientSnapshot> =
        clients.iter().map(|c| (c.id, c)).collect();

    let mut groups: HashMap<GroupId, OrderGroup> = HashMap::new();

    for item in line_items {
        let key = group_key(item);
        let group = groups.entry(key.clone()).or_insert_with(|| OrderGroup {
            group_id: key,
            merchant_id: item.merchant_id,
            client_id: item.client_id,
            client: client_index.get(&item.client_id).map(|c| (*c).clone()),
            line_items: Vec::new(),
            created_at: item.created_at,
            updated_at: item.updated_at,
            total_items: 0,
            total_quantity: 0,
            total_amount: Money::zero(),
            status: OrderStatus::Pending,
        });

        group.total_items += 1;
        group.total_quantity += u64::from(item.quantity);
        match product_index.get(&item.product_id) {
            Some(product) => group.total_amount += product.price.multiply(item.quantity),
            None => {
                tracing::warn!(
                    line_item_id = %item.id,
                    product_id = %item.product_id,
                    "line item references a missing product, counting zero"
                );
            }
        }
        group.created_at = group.created_at.min(item.created_at);
        group.updated_at = group.updated_at.max(item.created_at).max(item.updated_at);
        group.line_items.push(item.clone());
    }

    let mut out: Vec<OrderGroup> = groups
        .into_values()
        .map(|mut group| {
            group.status = derive_status(&group.line_items);
            group
        })
        .collect();

    // Newest first; group id breaks created_at ties so output order is stable.
    out.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.group_id.cmp(&b.group_id))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use common::ProductId;

    fn at(ts: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S")
            .unwrap()
            .and_utc()
    }

    fn item(
        merchant_id: MerchantId,
        client_id: ClientId,
        sku: &str,
        quantity: u32,
        status: OrderStatus,
        ts: &str,
    ) -> LineItem {
        let mut item = LineItem::new(
            merchant_id,
            client_id,
            ProductId::new(sku),
            quantity,
            at(ts),
            None,
        );
        item.status = status;
        item
    }

    fn statuses_to_group(statuses: &[OrderStatus]) -> OrderStatus {
        let merchant = MerchantId::new();
        let client = ClientId::new();
        let items: Vec<LineItem> = statuses
            .iter()
            .map(|s| {
                item(merchant, client, "SKU-001", 1, *s, "2024-01-01T10:00:00")
            })
            .collect();
        derive_status(&items)
    }

    #[test]
    fn cancelled_takes_precedence() {
        use OrderStatus::*;
        assert_eq!(statuses_to_group(&[Delivered, Cancelled]), Cancelled);
        assert_eq!(statuses_to_group(&[Pending, Processing, Cancelled]), Cancelled);
    }

    #[test]
    fn delivered_requires_all_items_delivered() {
        use OrderStatus::*;
        assert_eq!(statuses_to_group(&[Delivered, Delivered]), Delivered);
        assert_eq!(statuses_to_group(&[Delivered, Processing]), Processing);
        // Partial delivery with no processing item reads as pending.
        assert_eq!(statuses_to_group(&[Delivered, Pending]), Pending);
    }

    #[test]
    fn processing_beats_pending() {
        use OrderStatus::*;
        assert_eq!(statuses_to_group(&[Pending, Processing]), Processing);
        assert_eq!(statuses_to_group(&[Pending, Pending]), Pending);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(aggregate(&[], &[], &[]).is_empty());
    }

    #[test]
    fn same_minute_checkout_folds_into_one_group() {
        // Two same-client rows within one clock-minute, no group id,
        // products priced 100 and 50 cents.
        let merchant = MerchantId::new();
        let client = ClientId::new();
        let items = vec![
            item(merchant, client, "P1", 2, OrderStatus::Pending, "2024-01-01T10:00:00"),
            item(merchant, client, "P2", 1, OrderStatus::Pending, "2024-01-01T10:00:30"),
        ];
        let products = vec![
            Product::new(merchant, "P1", "Premier", Money::from_cents(100)),
            Product::new(merchant, "P2", "Second", Money::from_cents(50)),
        ];

        let groups = aggregate(&items, &[], &products);
        assert_eq!(groups.len(), 1);

        let group = &groups[0];
        assert_eq!(group.total_items, 2);
        assert_eq!(group.total_quantity, 3);
        assert_eq!(group.total_amount, Money::from_cents(250));
        assert_eq!(group.status, OrderStatus::Pending);
        assert_eq!(group.created_at, at("2024-01-01T10:00:00"));
        assert_eq!(group.updated_at, at("2024-01-01T10:00:30"));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let merchant = MerchantId::new();
        let client_a = ClientId::new();
        let client_b = ClientId::new();
        let items = vec![
            item(merchant, client_a, "P1", 2, OrderStatus::Pending, "2024-01-01T10:00:00"),
            item(merchant, client_b, "P1", 1, OrderStatus::Delivered, "2024-01-01T11:02:00"),
            item(merchant, client_a, "P2", 4, OrderStatus::Processing, "2024-01-01T10:05:00"),
        ];
        let products = vec![Product::new(merchant, "P1", "Premier", Money::from_cents(100))];

        let first = aggregate(&items, &[], &products);
        let second = aggregate(&items, &[], &products);
        assert_eq!(first, second);
    }

    #[test]
    fn every_line_item_lands_in_exactly_one_group() {
        let merchant = MerchantId::new();
        let client_a = ClientId::new();
        let client_b = ClientId::new();
        let items = vec![
            item(merchant, client_a, "P1", 1, OrderStatus::Pending, "2024-01-01T10:00:00"),
            item(merchant, client_a, "P2", 1, OrderStatus::Pending, "2024-01-01T10:00:45"),
            item(merchant, client_a, "P3", 1, OrderStatus::Pending, "2024-01-01T10:01:10"),
            item(merchant, client_b, "P1", 1, OrderStatus::Pending, "2024-01-01T10:00:20"),
        ];

        let groups = aggregate(&items, &[], &[]);
        let mut seen: Vec<LineItemId> = groups
            .iter()
            .flat_map(|g| g.line_item_ids())
            .collect();
        seen.sort_by_key(|id| id.as_uuid());
        seen.dedup();
        assert_eq!(seen.len(), items.len());
    }

    #[test]
    fn missing_product_contributes_zero() {
        let merchant = MerchantId::new();
        let client = ClientId::new();
        let items = vec![
            item(merchant, client, "P1", 2, OrderStatus::Pending, "2024-01-01T10:00:00"),
            item(merchant, client, "GHOST", 5, OrderStatus::Pending, "2024-01-01T10:00:10"),
        ];
        let products = vec![Product::new(merchant, "P1", "Premier", Money::from_cents(100))];

        let groups = aggregate(&items, &[], &products);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].total_amount, Money::from_cents(200));
        assert_eq!(groups[0].total_quantity, 7);
    }

    #[test]
    fn groups_are_sorted_newest_first() {
        let merchant = MerchantId::new();
        let client = ClientId::new();
        let items = vec![
            item(merchant, client, "P1", 1, OrderStatus::Pending, "2024-01-01T09:00:00"),
            item(merchant, client, "P1", 1, OrderStatus::Pending, "2024-01-01T11:00:00"),
            item(merchant, client, "P1", 1, OrderStatus::Pending, "2024-01-01T10:00:00"),
        ];

        let groups = aggregate(&items, &[], &[]);
        assert_eq!(groups.len(), 3);
        assert!(groups[0].created_at > groups[1].created_at);
        assert!(groups[1].created_at > groups[2].created_at);
    }

    #[test]
    fn client_snapshot_is_attached_when_present() {
        let merchant = MerchantId::new();
        let client = ClientId::new();
        let items = vec![item(merchant, client, "P1", 1, OrderStatus::Pending, "2024-01-01T10:00:00")];
        let clients = vec![ClientSnapshot {
            id: client,
            merchant_id: merchant,
            name: "Amina".to_string(),
            phone: Some("0560000000".to_string()),
            city: Some("Alger".to_string()),
        }];

        let groups = aggregate(&items, &clients, &[]);
        assert_eq!(groups[0].client.as_ref().unwrap().name, "Amina");

        let without = aggregate(&items, &[], &[]);
        assert!(without[0].client.is_none());
    }

    #[test]
    fn explicit_group_id_keeps_rows_together_across_minutes() {
        let merchant = MerchantId::new();
        let client = ClientId::new();
        let mut a = item(merchant, client, "P1", 1, OrderStatus::Pending, "2024-01-01T10:00:59");
        let mut b = item(merchant, client, "P2", 1, OrderStatus::Pending, "2024-01-01T10:01:01");
        a.group_id = Some(GroupId::new("CMD-checkout-9"));
        b.group_id = Some(GroupId::new("CMD-checkout-9"));

        let groups = aggregate(&[a, b], &[], &[]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group_id, GroupId::new("CMD-checkout-9"));
    }

    #[test]
    fn with_status_refreshes_every_item() {
        let merchant = MerchantId::new();
        let client = ClientId::new();
        let items = vec![
            item(merchant, client, "P1", 1, OrderStatus::Pending, "2024-01-01T10:00:00"),
            item(merchant, client, "P2", 1, OrderStatus::Pending, "2024-01-01T10:00:30"),
        ];
        let group = aggregate(&items, &[], &[]).remove(0);

        let now = at("2024-01-02T08:00:00");
        let updated = group.with_status(OrderStatus::Processing, now);
        assert_eq!(updated.status, OrderStatus::Processing);
        assert_eq!(updated.updated_at, now);
        assert!(updated
            .line_items
            .iter()
            .all(|i| i.status == OrderStatus::Processing && i.updated_at == now));
        // The original is untouched.
        assert_eq!(group.status, OrderStatus::Pending);
    }
}
