//! Initial data for an empty catalog.
//!
//! A seed document looks like:
//!
//! ```json
//! {
//!   "products": [{ "name": "Desk", "category": "furniture", "price": 120.0, "stock": 3 }],
//!   "orders": [{ "customer_name": "Ada", "items": [{ "product_id": 1, "quantity": 2 }] }]
//! }
//! ```
//!
//! `product_id` in a seed order is the 1-based position of the product in
//! `products`, since real ids are only known once the products are stored.
//! Seed orders go through normal order creation, so their totals are priced
//! from the catalog like any other order.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use orderdesk_core::{DomainError, ProductId};
use orderdesk_products::CreateProduct;
use orderdesk_sales::{price_order, CreateOrder, OrderLineRequest, OrderStatus};

use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed seed document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid seed entry: {0}")]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedData {
    #[serde(default)]
    pub products: Vec<SeedProduct>,
    #[serde(default)]
    pub orders: Vec<SeedOrder>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedProduct {
    pub name: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedOrder {
    pub customer_name: String,
    #[serde(default)]
    pub status: Option<OrderStatus>,
    pub items: Vec<SeedLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedLine {
    /// 1-based position in [`SeedData::products`].
    pub product_id: usize,
    pub quantity: i64,
}

/// What [`apply`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The catalog already had products; nothing was written.
    Skipped { existing_products: u64 },
    Applied { products: usize, orders: usize },
}

impl SeedData {
    pub fn from_json(raw: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read and parse a seed document.
    pub async fn load(path: &Path) -> Result<Self, SeedError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SeedError::Read {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_json(&raw)
    }

    fn product_commands(&self) -> Result<Vec<CreateProduct>, SeedError> {
        self.products
            .iter()
            .map(|p| CreateProduct::new(p.name.clone(), p.category.clone(), p.price, p.stock))
            .collect::<Result<Vec<_>, _>>()
            .map_err(SeedError::from)
    }

    fn order_commands(&self, product_ids: &[ProductId]) -> Result<Vec<CreateOrder>, SeedError> {
        self.orders
            .iter()
            .map(|order| -> Result<CreateOrder, SeedError> {
                let lines = order
                    .items
                    .iter()
                    .map(|line| -> Result<OrderLineRequest, DomainError> {
                        let id = line
                            .product_id
                            .checked_sub(1)
                            .and_then(|index| product_ids.get(index))
                            .ok_or_else(|| {
                                DomainError::validation(format!(
                                    "seed order for '{}' refers to product #{} but the seed has {} products",
                                    order.customer_name,
                                    line.product_id,
                                    product_ids.len()
                                ))
                            })?;
                        OrderLineRequest::new(*id, line.quantity)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CreateOrder::new(order.customer_name.clone(), order.status, lines)?)
            })
            .collect()
    }

    /// Check every entry without touching a store.
    ///
    /// Orders are priced against the seed's own products, keyed by position,
    /// so any order that would fail in the store fails here first.
    fn validate(&self) -> Result<Vec<CreateProduct>, SeedError> {
        let products = self.product_commands()?;
        let positions: Vec<ProductId> = (1..=products.len())
            .map(|position| ProductId::new(position as i64))
            .collect();
        for cmd in self.order_commands(&positions)? {
            price_order(&cmd, |id| {
                usize::try_from(id.get())
                    .ok()
                    .and_then(|position| position.checked_sub(1))
                    .and_then(|index| products.get(index))
                    .map(CreateProduct::price)
            })?;
        }
        Ok(products)
    }
}

/// Apply `seed` if the catalog is empty.
///
/// The whole document is validated before anything is written, so a bad
/// entry leaves the catalog empty and a corrected seed applies on the next
/// start.
pub async fn apply<S>(store: &S, seed: &SeedData) -> Result<SeedOutcome, SeedError>
where
    S: Store + ?Sized,
{
    let stats = store.stats().await?;
    if stats.products > 0 {
        tracing::info!(existing_products = stats.products, "catalog not empty; skipping seed");
        return Ok(SeedOutcome::Skipped {
            existing_products: stats.products,
        });
    }

    let products = seed.validate()?;
    let mut product_ids = Vec::with_capacity(products.len());
    for cmd in products {
        product_ids.push(store.insert_product(cmd).await?.id);
    }

    let orders = seed.order_commands(&product_ids)?;
    for cmd in &orders {
        store.create_order(cmd).await?;
    }

    tracing::info!(
        products = product_ids.len(),
        orders = orders.len(),
        "seed data applied"
    );
    Ok(SeedOutcome::Applied {
        products: product_ids.len(),
        orders: orders.len(),
    })
}
