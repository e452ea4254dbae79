//! Persistence for products, orders and order line items.
//!
//! Two backends implement the same contracts:
//! - [`PostgresStore`]: the relational store (sqlx, one transaction per
//!   multi-row write)
//! - [`InMemoryStore`]: a lock-guarded copy of the same model for dev/tests
//!
//! Every multi-row write is all-or-nothing in both backends: an order header
//! is never visible without all of its lines, and deleting an order removes
//! its lines in the same unit of work.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use orderdesk_core::{DomainError, ListQuery, OrderId, Page, ProductId};
use orderdesk_products::{CreateProduct, Product, ProductSortField, UpdateProduct};
use orderdesk_sales::{CreateOrder, Order, OrderFilter, OrderSortField, UpdateOrder};

pub mod memory;
pub mod postgres;

#[cfg(test)]
mod conformance;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Store error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store rejected the operation for a domain reason (missing product,
    /// referenced product, constraint violation).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The backend failed (unreachable, transaction aborted, ...).
    #[error("database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn database(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Database {
            operation,
            message: message.into(),
        }
    }
}

/// Row counts, reported by health checks and used by seeding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub products: u64,
    pub orders: u64,
    pub line_items: u64,
}

/// Product persistence.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_product(&self, cmd: CreateProduct) -> Result<Product, StoreError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    async fn list_products(
        &self,
        query: ListQuery<ProductSortField>,
    ) -> Result<Page<Product>, StoreError>;

    /// Apply a partial update. Returns `None` if the product does not exist.
    async fn update_product(
        &self,
        id: ProductId,
        patch: &UpdateProduct,
    ) -> Result<Option<Product>, StoreError>;

    /// Delete a product that no order line references.
    ///
    /// Returns `false` if the product does not exist and a
    /// `DomainError::Conflict` if any line item still references it.
    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError>;
}

/// Order persistence.
#[async_trait::async_trait]
pub trait OrderStore: Send + Sync {
    /// Price and persist a new order in one unit of work.
    ///
    /// Product prices are read and the header plus every line are written
    /// atomically; a missing product fails with `DomainError::NotFound` and
    /// leaves the store untouched.
    async fn create_order(&self, cmd: &CreateOrder) -> Result<Order, StoreError>;

    /// Load an order together with its lines.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    async fn list_orders(
        &self,
        query: ListQuery<OrderSortField>,
        filter: &OrderFilter,
    ) -> Result<Page<Order>, StoreError>;

    /// Update customer name and/or status. Returns `None` if the order does
    /// not exist. Totals and lines are never written here.
    async fn update_order(
        &self,
        id: OrderId,
        patch: &UpdateOrder,
    ) -> Result<Option<Order>, StoreError>;

    /// Delete an order and all of its lines. Returns `false` if the order
    /// does not exist.
    async fn delete_order(&self, id: OrderId) -> Result<bool, StoreError>;
}

/// A complete backend: catalog + orders + health.
#[async_trait::async_trait]
pub trait Store: CatalogStore + OrderStore {
    /// Short backend name (`postgres`, `memory`).
    fn backend(&self) -> &'static str;

    /// Round-trip to the backend and report row counts.
    async fn stats(&self) -> Result<StoreStats, StoreError>;
}

#[async_trait::async_trait]
impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    async fn insert_product(&self, cmd: CreateProduct) -> Result<Product, StoreError> {
        (**self).insert_product(cmd).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).get_product(id).await
    }

    async fn list_products(
        &self,
        query: ListQuery<ProductSortField>,
    ) -> Result<Page<Product>, StoreError> {
        (**self).list_products(query).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        patch: &UpdateProduct,
    ) -> Result<Option<Product>, StoreError> {
        (**self).update_product(id, patch).await
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        (**self).delete_product(id).await
    }
}

#[async_trait::async_trait]
impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    async fn create_order(&self, cmd: &CreateOrder) -> Result<Order, StoreError> {
        (**self).create_order(cmd).await
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        (**self).get_order(id).await
    }

    async fn list_orders(
        &self,
        query: ListQuery<OrderSortField>,
        filter: &OrderFilter,
    ) -> Result<Page<Order>, StoreError> {
        (**self).list_orders(query, filter).await
    }

    async fn update_order(
        &self,
        id: OrderId,
        patch: &UpdateOrder,
    ) -> Result<Option<Order>, StoreError> {
        (**self).update_order(id, patch).await
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool, StoreError> {
        (**self).delete_order(id).await
    }
}
