//! Behaviour every store backend must share.
//!
//! Each check runs against [`InMemoryStore`]. The same checks run against
//! Postgres when `TEST_DATABASE_URL` points at a scratch database; the tables
//! are truncated before every check.

use core::str::FromStr;

use rust_decimal::Decimal;

use orderdesk_core::{DomainError, ListQuery, OrderId, ProductId};
use orderdesk_products::{CreateProduct, Product, ProductSortField, UpdateProduct};
use orderdesk_sales::{
    CreateOrder, Order, OrderFilter, OrderLineRequest, OrderSortField, OrderStatus, UpdateOrder,
};

use super::{InMemoryStore, PostgresStore, Store, StoreError, StoreStats};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn product<S: Store>(store: &S, name: &str, price: &str) -> Product {
    let cmd = CreateProduct::new(name, "general", dec(price), 10).unwrap();
    store.insert_product(cmd).await.unwrap()
}

fn order_cmd(customer: &str, lines: &[(ProductId, i64)]) -> CreateOrder {
    let items = lines
        .iter()
        .map(|(id, qty)| OrderLineRequest::new(*id, *qty).unwrap())
        .collect();
    CreateOrder::new(customer, None, items).unwrap()
}

async fn order<S: Store>(store: &S, customer: &str, lines: &[(ProductId, i64)]) -> Order {
    store.create_order(&order_cmd(customer, lines)).await.unwrap()
}

async fn stats<S: Store>(store: &S) -> StoreStats {
    store.stats().await.unwrap()
}

async fn order_total_is_sum_of_lines<S: Store>(store: &S) {
    let a = product(store, "A", "10.00").await;
    let b = product(store, "B", "5.00").await;

    let created = order(store, "Taylor Green", &[(a.id, 1), (b.id, 2)]).await;

    assert_eq!(created.total_amount, dec("20.00"));
    assert_eq!(created.status, OrderStatus::Pending);
    assert_eq!(created.items.len(), 2);
    assert_eq!(created.items[0].unit_price, dec("10.00"));
    assert_eq!(created.items[1].unit_price, dec("5.00"));
    assert_eq!(created.items[1].quantity, 2);
    assert!(created.is_consistent());

    let loaded = store.get_order(created.id).await.unwrap().unwrap();
    assert_eq!(loaded.total_amount, created.total_amount);
    assert_eq!(loaded.items, created.items);
    assert_eq!(stats(store).await.line_items, 2);
}

async fn missing_product_persists_nothing<S: Store>(store: &S) {
    let a = product(store, "A", "10.00").await;
    let before = stats(store).await;

    let err = store
        .create_order(&order_cmd("Sam", &[(a.id, 1), (ProductId::new(9_999), 1)]))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        StoreError::Domain(DomainError::NotFound("product 9999".to_string()))
    );
    assert_eq!(stats(store).await, before);
}

async fn unit_prices_are_snapshots<S: Store>(store: &S) {
    let a = product(store, "A", "10.00").await;
    let created = order(store, "Sam", &[(a.id, 3)]).await;

    let patch = UpdateProduct::new(None, None, Some(dec("99.00")), None).unwrap();
    let updated = store.update_product(a.id, &patch).await.unwrap().unwrap();
    assert_eq!(updated.price, dec("99.00"));

    let loaded = store.get_order(created.id).await.unwrap().unwrap();
    assert_eq!(loaded.items[0].unit_price, dec("10.00"));
    assert_eq!(loaded.total_amount, dec("30.00"));
}

async fn deleting_an_order_removes_only_its_lines<S: Store>(store: &S) {
    let a = product(store, "A", "1.50").await;
    let first = order(store, "First", &[(a.id, 1), (a.id, 2)]).await;
    let second = order(store, "Second", &[(a.id, 4)]).await;
    assert_eq!(stats(store).await.line_items, 3);

    assert!(store.delete_order(first.id).await.unwrap());
    assert!(!store.delete_order(first.id).await.unwrap());

    assert_eq!(store.get_order(first.id).await.unwrap(), None);
    let kept = store.get_order(second.id).await.unwrap().unwrap();
    assert_eq!(kept.items, second.items);
    assert_eq!(
        stats(store).await,
        StoreStats {
            products: 1,
            orders: 1,
            line_items: 1
        }
    );
}

async fn pages_cover_every_order_once<S: Store>(store: &S) {
    let a = product(store, "A", "1.00").await;
    for name in ["one", "two", "three"] {
        order(store, name, &[(a.id, 1)]).await;
    }
    let filter = OrderFilter::default();

    let mut seen: Vec<OrderId> = Vec::new();
    for (page, expected) in [(1, 2), (2, 1), (3, 0)] {
        let query = ListQuery::<OrderSortField>::parse(Some(page), Some(2), None, None).unwrap();
        let listed = store.list_orders(query, &filter).await.unwrap();
        assert_eq!(listed.items.len(), expected, "page {page}");
        assert_eq!(listed.total, 3);
        assert_eq!(listed.total_pages, 2);
        assert!(listed.items.iter().all(|o| o.items.len() == 1));
        seen.extend(listed.items.iter().map(|o| o.id));
    }

    let mut sorted = seen.clone();
    sorted.sort();
    assert_eq!(seen, sorted);
    sorted.dedup();
    assert_eq!(sorted.len(), 3);
}

async fn referenced_products_cannot_be_deleted<S: Store>(store: &S) {
    let used = product(store, "Used", "2.00").await;
    let unused = product(store, "Unused", "3.00").await;
    let placed = order(store, "Sam", &[(used.id, 1)]).await;

    let err = store.delete_product(used.id).await.unwrap_err();
    assert!(matches!(err, StoreError::Domain(DomainError::Conflict(_))));
    assert!(store.get_product(used.id).await.unwrap().is_some());

    assert!(store.delete_product(unused.id).await.unwrap());
    assert!(!store.delete_product(unused.id).await.unwrap());

    // Once the order is gone the product is free again.
    assert!(store.delete_order(placed.id).await.unwrap());
    assert!(store.delete_product(used.id).await.unwrap());
}

async fn order_listing_filters_and_sorts<S: Store>(store: &S) {
    let a = product(store, "A", "10.00").await;
    let small = order(store, "Taylor Green", &[(a.id, 1)]).await;
    let large = order(store, "Robin Greenfield", &[(a.id, 5)]).await;
    let other = order(store, "Sam Blue", &[(a.id, 2)]).await;

    let shipped = UpdateOrder::new(None, Some(OrderStatus::Shipped)).unwrap();
    store.update_order(other.id, &shipped).await.unwrap().unwrap();

    let query = ListQuery::<OrderSortField>::parse(None, None, Some("total_amount"), Some("desc"))
        .unwrap();

    let by_name = OrderFilter::new(Some("green".into()), None);
    let listed = store.list_orders(query, &by_name).await.unwrap();
    let ids: Vec<OrderId> = listed.items.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![large.id, small.id]);
    assert_eq!(listed.total, 2);

    let by_status = OrderFilter::new(None, Some(OrderStatus::Shipped));
    let listed = store.list_orders(query, &by_status).await.unwrap();
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].id, other.id);

    let wildcard = OrderFilter::new(Some("%".into()), None);
    let listed = store.list_orders(query, &wildcard).await.unwrap();
    assert_eq!(listed.total, 0);
}

async fn product_listing_sorts_with_id_tiebreak<S: Store>(store: &S) {
    let cheap = product(store, "Cheap", "1.00").await;
    let first = product(store, "Pricey", "9.00").await;
    let second = product(store, "Pricey too", "9.00").await;

    let query =
        ListQuery::<ProductSortField>::parse(None, None, Some("price"), Some("desc")).unwrap();
    let listed = store.list_products(query).await.unwrap();

    let ids: Vec<ProductId> = listed.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![first.id, second.id, cheap.id]);
    assert_eq!(listed.total, 3);
    assert_eq!(listed.total_pages, 1);
}

async fn oversized_total_persists_nothing<S: Store>(store: &S) {
    let pricey = product(store, "Pricey", "99999999.99").await;

    let err = store
        .create_order(&order_cmd("Big Spender", &[(pricey.id, 1000)]))
        .await
        .unwrap_err();
    assert!(
        matches!(err, StoreError::Domain(DomainError::Validation(_))),
        "{err:?}"
    );
    assert_eq!(stats(store).await.orders, 0);
    assert_eq!(stats(store).await.line_items, 0);
}

async fn text_sorting_is_byte_wise<S: Store>(store: &S) {
    let a = product(store, "A", "1.00").await;
    let lower = order(store, "alice", &[(a.id, 1)]).await;
    let upper = order(store, "Bob", &[(a.id, 1)]).await;

    let query =
        ListQuery::<OrderSortField>::parse(None, None, Some("customer_name"), None).unwrap();
    let listed = store.list_orders(query, &OrderFilter::default()).await.unwrap();
    let ids: Vec<OrderId> = listed.items.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![upper.id, lower.id]);

    let b = product(store, "b", "1.00").await;
    let query = ListQuery::<ProductSortField>::parse(None, None, Some("name"), Some("desc")).unwrap();
    let listed = store.list_products(query).await.unwrap();
    let ids: Vec<ProductId> = listed.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![b.id, a.id]);
}

async fn order_update_keeps_lines_and_total<S: Store>(store: &S) {
    let a = product(store, "A", "4.25").await;
    let created = order(store, "Sam", &[(a.id, 2)]).await;

    let patch = UpdateOrder::new(Some("Sam Smith".into()), Some(OrderStatus::Completed)).unwrap();
    let updated = store.update_order(created.id, &patch).await.unwrap().unwrap();

    assert_eq!(updated.customer_name, "Sam Smith");
    assert_eq!(updated.status, OrderStatus::Completed);
    assert_eq!(updated.total_amount, dec("8.50"));
    assert_eq!(updated.items, created.items);
    assert!(updated.updated_at >= created.created_at);

    let missing = store.update_order(OrderId::new(9_999), &patch).await.unwrap();
    assert_eq!(missing, None);
}

async fn product_update_is_partial<S: Store>(store: &S) {
    let a = product(store, "A", "4.00").await;

    let patch = UpdateProduct::new(None, None, None, Some(0)).unwrap();
    let updated = store.update_product(a.id, &patch).await.unwrap().unwrap();
    assert_eq!(updated.stock, 0);
    assert_eq!(updated.name, "A");
    assert_eq!(updated.price, dec("4.00"));

    let missing = store.update_product(ProductId::new(9_999), &patch).await.unwrap();
    assert_eq!(missing, None);
}

#[tokio::test]
async fn memory_order_total_is_sum_of_lines() {
    order_total_is_sum_of_lines(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn memory_missing_product_persists_nothing() {
    missing_product_persists_nothing(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn memory_unit_prices_are_snapshots() {
    unit_prices_are_snapshots(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn memory_deleting_an_order_removes_only_its_lines() {
    deleting_an_order_removes_only_its_lines(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn memory_pages_cover_every_order_once() {
    pages_cover_every_order_once(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn memory_referenced_products_cannot_be_deleted() {
    referenced_products_cannot_be_deleted(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn memory_order_listing_filters_and_sorts() {
    order_listing_filters_and_sorts(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn memory_product_listing_sorts_with_id_tiebreak() {
    product_listing_sorts_with_id_tiebreak(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn memory_oversized_total_persists_nothing() {
    oversized_total_persists_nothing(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn memory_text_sorting_is_byte_wise() {
    text_sorting_is_byte_wise(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn memory_order_update_keeps_lines_and_total() {
    order_update_keeps_lines_and_total(&InMemoryStore::new()).await;
}

#[tokio::test]
async fn memory_product_update_is_partial() {
    product_update_is_partial(&InMemoryStore::new()).await;
}

async fn reset(store: &PostgresStore) {
    sqlx::query("TRUNCATE order_items, orders, products RESTART IDENTITY CASCADE")
        .execute(store.pool())
        .await
        .unwrap();
}

/// All Postgres checks share one database, so they run sequentially in a
/// single test.
#[tokio::test]
async fn postgres_store_matches_memory_store() {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping postgres store checks");
        return;
    };
    let store = PostgresStore::connect(&url, 2).await.unwrap();
    store.ensure_schema().await.unwrap();
    // Applying the schema twice is harmless.
    store.ensure_schema().await.unwrap();

    reset(&store).await;
    order_total_is_sum_of_lines(&store).await;
    reset(&store).await;
    missing_product_persists_nothing(&store).await;
    reset(&store).await;
    unit_prices_are_snapshots(&store).await;
    reset(&store).await;
    deleting_an_order_removes_only_its_lines(&store).await;
    reset(&store).await;
    pages_cover_every_order_once(&store).await;
    reset(&store).await;
    referenced_products_cannot_be_deleted(&store).await;
    reset(&store).await;
    order_listing_filters_and_sorts(&store).await;
    reset(&store).await;
    product_listing_sorts_with_id_tiebreak(&store).await;
    reset(&store).await;
    text_sorting_is_byte_wise(&store).await;
    reset(&store).await;
    oversized_total_persists_nothing(&store).await;
    reset(&store).await;
    order_update_keeps_lines_and_total(&store).await;
    reset(&store).await;
    product_update_is_partial(&store).await;
}
