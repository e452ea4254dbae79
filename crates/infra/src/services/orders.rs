use orderdesk_core::{ListQuery, OrderId, Page};
use orderdesk_sales::{CreateOrder, Order, OrderFilter, OrderSortField, UpdateOrder};

use super::{ServiceError, ServiceResult};
use crate::store::OrderStore;

/// Order Manager: order creation with price snapshots, reads, header updates
/// and cascading deletes on top of an [`OrderStore`].
#[derive(Debug, Clone)]
pub struct OrderService<S> {
    store: S,
}

impl<S> OrderService<S>
where
    S: OrderStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Price every line at the current catalog price and persist the order
    /// with its lines as one unit.
    pub async fn create(&self, cmd: CreateOrder) -> ServiceResult<Order> {
        match self.store.create_order(&cmd).await {
            Ok(order) => {
                tracing::info!(
                    order_id = %order.id,
                    line_count = order.items.len(),
                    total_amount = %order.total_amount,
                    "order created"
                );
                Ok(order)
            }
            Err(e) => {
                let err = ServiceError::from(e);
                if !matches!(err, ServiceError::Storage(_)) {
                    tracing::debug!(error = %err, "order rejected");
                }
                Err(err)
            }
        }
    }

    pub async fn get(&self, id: OrderId) -> ServiceResult<Order> {
        self.store.get_order(id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn list(
        &self,
        query: ListQuery<OrderSortField>,
        filter: OrderFilter,
    ) -> ServiceResult<Page<Order>> {
        Ok(self.store.list_orders(query, &filter).await?)
    }

    /// Change customer name and/or status. An empty patch returns the order
    /// as is.
    pub async fn update(&self, id: OrderId, patch: UpdateOrder) -> ServiceResult<Order> {
        if patch.is_empty() {
            return self.get(id).await;
        }
        let order = self
            .store
            .update_order(id, &patch)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(order_id = %id, status = %order.status, "order updated");
        Ok(order)
    }

    /// Delete the order and all of its lines.
    pub async fn delete(&self, id: OrderId) -> ServiceResult<()> {
        if !self.store.delete_order(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }
}

fn not_found(id: OrderId) -> ServiceError {
    ServiceError::NotFound(format!("order {id}"))
}
