use chrono::{Duration, Utc};
use common::{ClientId, MerchantId, Money, ProductId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{ClientSnapshot, LineItem, Product, aggregate};

fn fixture(
    clients: usize,
    items_per_client: usize,
) -> (Vec<LineItem>, Vec<ClientSnapshot>, Vec<Product>) {
    let merchant = MerchantId::new();
    let base = Utc::now();

    let products: Vec<Product> = (0..50)
        .map(|i| {
            Product::new(
                merchant,
                format!("SKU-{i:03}"),
                format!("Produit {i}"),
                Money::from_cents(100 + i as i64 * 25),
            )
        })
        .collect();

    let snapshots: Vec<ClientSnapshot> = (0..clients)
        .map(|i| ClientSnapshot {
            id: ClientId::new(),
            merchant_id: merchant,
            name: format!("Client {i}"),
            phone: None,
            city: None,
        })
        .collect();

    let items: Vec<LineItem> = snapshots
        .iter()
        .flat_map(|client| {
            (0..items_per_client).map(move |i| {
                LineItem::new(
                    merchant,
                    client.id,
                    ProductId::new(format!("SKU-{:03}", i % 50)),
                    (i % 5 + 1) as u32,
                    base + Duration::seconds(i as i64 * 20),
                    None,
                )
            })
        })
        .collect();

    (items, snapshots, products)
}

fn bench_aggregate_small(c: &mut Criterion) {
    let (items, clients, products) = fixture(10, 5);

    c.bench_function("aggregator/50_items", |b| {
        b.iter(|| aggregate(&items, &clients, &products));
    });
}

fn bench_aggregate_large(c: &mut Criterion) {
    let (items, clients, products) = fixture(100, 40);

    c.bench_function("aggregator/4000_items", |b| {
        b.iter(|| aggregate(&items, &clients, &products));
    });
}

criterion_group!(benches, bench_aggregate_small, bench_aggregate_large);
criterion_main!(benches);
