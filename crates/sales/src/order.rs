//! Orders and their line items, plus the commands that create and update
//! them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderdesk_core::{money, DomainError, DomainResult, Entity, LineItemId, OrderId, ProductId};

const CUSTOMER_NAME_MAX_LEN: usize = 120;

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "status must be one of: pending, processing, shipped, completed, cancelled (got '{s}')"
                ))
            })
    }
}

/// Order line: product, quantity, and the unit price captured when the order
/// was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn line_total(&self) -> Decimal {
        money::line_total(self.unit_price, self.quantity)
    }
}

/// An order header with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub status: OrderStatus,
    /// Sum of the line totals; see [`Order::recomputed_total`].
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<LineItem>,
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> OrderId {
        self.id
    }
}

impl Order {
    /// Total derived from the stored lines.
    pub fn recomputed_total(&self) -> Decimal {
        money::sum(self.items.iter().map(LineItem::line_total))
    }

    /// Whether the stored total agrees with the stored lines.
    pub fn is_consistent(&self) -> bool {
        self.total_amount == self.recomputed_total()
    }
}

/// One requested line of a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLineRequest {
    product_id: ProductId,
    quantity: u32,
}

impl OrderLineRequest {
    pub fn new(product_id: ProductId, quantity: i64) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::validation(format!(
                "quantity for product {product_id} must be positive"
            )));
        }
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| i32::try_from(*q).is_ok())
            .ok_or_else(|| {
                DomainError::validation(format!("quantity for product {product_id} is too large"))
            })?;
        Ok(Self { product_id, quantity })
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Command: CreateOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrder {
    customer_name: String,
    status: OrderStatus,
    items: Vec<OrderLineRequest>,
}

impl CreateOrder {
    pub fn new(
        customer_name: impl Into<String>,
        status: Option<OrderStatus>,
        items: Vec<OrderLineRequest>,
    ) -> DomainResult<Self> {
        let customer_name = validate_customer_name(customer_name.into())?;
        if items.is_empty() {
            return Err(DomainError::validation("order must contain at least one item"));
        }
        Ok(Self {
            customer_name,
            status: status.unwrap_or_default(),
            items,
        })
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderLineRequest] {
        &self.items
    }

    /// Distinct product ids referenced by the request, sorted.
    pub fn product_ids(&self) -> Vec<ProductId> {
        let mut ids: Vec<ProductId> = self.items.iter().map(|l| l.product_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Command: UpdateOrder.
///
/// Only the customer name and status are mutable after creation; the total
/// and the lines are not reachable through this command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOrder {
    customer_name: Option<String>,
    status: Option<OrderStatus>,
}

impl UpdateOrder {
    pub fn new(customer_name: Option<String>, status: Option<OrderStatus>) -> DomainResult<Self> {
        Ok(Self {
            customer_name: customer_name.map(validate_customer_name).transpose()?,
            status,
        })
    }

    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn status(&self) -> Option<OrderStatus> {
        self.status
    }

    pub fn is_empty(&self) -> bool {
        self.customer_name.is_none() && self.status.is_none()
    }

    pub fn apply_to(&self, order: &mut Order, now: DateTime<Utc>) {
        if self.is_empty() {
            return;
        }
        if let Some(name) = &self.customer_name {
            order.customer_name = name.clone();
        }
        if let Some(status) = self.status {
            order.status = status;
        }
        order.updated_at = now;
    }
}

fn validate_customer_name(name: String) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("customer_name cannot be empty"));
    }
    if trimmed.chars().count() > CUSTOMER_NAME_MAX_LEN {
        return Err(DomainError::validation(format!(
            "customer_name must be at most {CUSTOMER_NAME_MAX_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}
