use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use orderdesk_core::{
    DomainError, Entity, LineItemId, ListQuery, OrderId, Page, ProductId, SortField, SortOrder,
};
use orderdesk_products::{CreateProduct, Product, ProductSortField, UpdateProduct};
use orderdesk_sales::{price_order, CreateOrder, Order, OrderFilter, OrderSortField, UpdateOrder};

use super::{CatalogStore, OrderStore, Store, StoreError, StoreStats};

#[derive(Debug, Default)]
struct State {
    last_product_id: i64,
    last_order_id: i64,
    last_line_id: i64,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
}

impl State {
    fn product_is_referenced(&self, id: ProductId) -> bool {
        self.orders
            .values()
            .any(|o| o.items.iter().any(|line| line.product_id == id))
    }
}

/// In-memory store.
///
/// Intended for tests/dev. Each operation holds the state lock for its whole
/// duration, which gives every multi-row write the same all-or-nothing
/// behaviour as a database transaction.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, operation: &'static str) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::database(operation, "state lock poisoned"))
    }

    fn write(&self, operation: &'static str) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::database(operation, "state lock poisoned"))
    }
}

/// Sort `rows` by `query` (ties broken by id, ascending) and cut one page.
fn paginate<'a, T, S>(
    rows: impl Iterator<Item = &'a T>,
    query: ListQuery<S>,
    compare: impl Fn(S, &T, &T) -> Ordering,
) -> Page<T>
where
    T: Entity + Clone + 'a,
    S: SortField,
{
    let mut rows: Vec<&T> = rows.collect();
    rows.sort_by(|a, b| {
        let by_column = compare(query.sort_by, a, b);
        let by_column = match query.sort_order {
            SortOrder::Asc => by_column,
            SortOrder::Desc => by_column.reverse(),
        };
        by_column.then_with(|| a.id().cmp(&b.id()))
    });

    let total = rows.len() as u64;
    let window = query.page.window(rows.len());
    let items = rows[window].iter().map(|row| (*row).clone()).collect();
    Page::new(items, query.page, total)
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_product(&self, cmd: CreateProduct) -> Result<Product, StoreError> {
        let mut state = self.write("insert_product")?;
        state.last_product_id += 1;
        let product = cmd.into_product(ProductId::new(state.last_product_id), Utc::now());
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read("get_product")?.products.get(&id).cloned())
    }

    async fn list_products(
        &self,
        query: ListQuery<ProductSortField>,
    ) -> Result<Page<Product>, StoreError> {
        let state = self.read("list_products")?;
        Ok(paginate(state.products.values(), query, ProductSortField::compare))
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: &UpdateProduct,
    ) -> Result<Option<Product>, StoreError> {
        let mut state = self.write("update_product")?;
        Ok(state.products.get_mut(&id).map(|product| {
            patch.apply_to(product);
            product.clone()
        }))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut state = self.write("delete_product")?;
        if !state.products.contains_key(&id) {
            return Ok(false);
        }
        if state.product_is_referenced(id) {
            return Err(DomainError::conflict(format!(
                "product {id} is referenced by existing orders"
            ))
            .into());
        }
        state.products.remove(&id);
        Ok(true)
    }
}

#[async_trait::async_trait]
impl OrderStore for InMemoryStore {
    async fn create_order(&self, cmd: &CreateOrder) -> Result<Order, StoreError> {
        let mut state = self.write("create_order")?;

        // Pricing fails before any id is allocated, so a rejected order
        // leaves no trace.
        let priced = price_order(cmd, |id| state.products.get(&id).map(|p| p.price))?;

        let order_id = OrderId::new(state.last_order_id + 1);
        let first_line = state.last_line_id + 1;
        let line_ids: Vec<LineItemId> = (0..priced.lines.len() as i64)
            .map(|offset| LineItemId::new(first_line + offset))
            .collect();

        let order = priced.into_order(order_id, &line_ids, Utc::now())?;

        state.last_order_id = order_id.get();
        state.last_line_id += line_ids.len() as i64;
        state.orders.insert(order_id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.read("get_order")?.orders.get(&id).cloned())
    }

    async fn list_orders(
        &self,
        query: ListQuery<OrderSortField>,
        filter: &OrderFilter,
    ) -> Result<Page<Order>, StoreError> {
        let state = self.read("list_orders")?;
        let matching = state.orders.values().filter(|o| filter.matches(o));
        Ok(paginate(matching, query, OrderSortField::compare))
    }

    async fn update_order(
        &self,
        id: OrderId,
        patch: &UpdateOrder,
    ) -> Result<Option<Order>, StoreError> {
        let mut state = self.write("update_order")?;
        Ok(state.orders.get_mut(&id).map(|order| {
            patch.apply_to(order, Utc::now());
            order.clone()
        }))
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, StoreError> {
        // Lines live inside the order, so removing it removes them too.
        Ok(self.write("delete_order")?.orders.remove(&id).is_some())
    }
}

#[async_trait::async_trait]
impl Store for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let state = self.read("stats")?;
        Ok(StoreStats {
            products: state.products.len() as u64,
            orders: state.orders.len() as u64,
            line_items: state.orders.values().map(|o| o.items.len() as u64).sum(),
        })
    }
}
