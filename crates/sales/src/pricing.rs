//! Order pricing: snapshot unit prices and derive the order total.
//!
//! `price_order` is the only place an order total is computed. Stores call it
//! inside the same transaction that reads the product rows and writes the
//! order, so the prices used are the ones the catalog held at that moment.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use orderdesk_core::{money, DomainError, DomainResult, LineItemId, OrderId, ProductId};

use crate::order::{CreateOrder, LineItem, Order, OrderStatus};

/// A line with its captured unit price, ready to be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl PricedLine {
    pub fn line_total(&self) -> Decimal {
        money::line_total(self.unit_price, self.quantity)
    }
}

/// An order whose lines have been priced but which has no id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub customer_name: String,
    pub status: OrderStatus,
    pub lines: Vec<PricedLine>,
    pub total_amount: Decimal,
}

impl PricedOrder {
    /// Materialise the order once the store has assigned ids.
    ///
    /// `line_ids` must be in the same order as `lines`.
    pub fn into_order(
        self,
        id: OrderId,
        line_ids: &[LineItemId],
        created_at: DateTime<Utc>,
    ) -> DomainResult<Order> {
        if line_ids.len() != self.lines.len() {
            return Err(DomainError::validation(format!(
                "expected {} line ids, got {}",
                self.lines.len(),
                line_ids.len()
            )));
        }

        let items = self
            .lines
            .into_iter()
            .zip(line_ids)
            .map(|(line, id)| LineItem {
                id: *id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();

        Ok(Order {
            id,
            customer_name: self.customer_name,
            status: self.status,
            total_amount: self.total_amount,
            created_at,
            updated_at: created_at,
            items,
        })
    }
}

/// Price every requested line with the current catalog price.
///
/// `current_price` resolves a product id to its price, or `None` if the
/// product does not exist. The first unknown product (in request order) fails
/// the whole order with `NotFound`; nothing is partially priced.
pub fn price_order<F>(cmd: &CreateOrder, mut current_price: F) -> DomainResult<PricedOrder>
where
    F: FnMut(ProductId) -> Option<Decimal>,
{
    let mut lines = Vec::with_capacity(cmd.items().len());
    for item in cmd.items() {
        let unit_price = current_price(item.product_id())
            .ok_or_else(|| DomainError::not_found(format!("product {}", item.product_id())))?;
        lines.push(PricedLine {
            product_id: item.product_id(),
            quantity: item.quantity(),
            unit_price,
        });
    }

    let total_amount = money::sum(lines.iter().map(PricedLine::line_total));
    if total_amount >= money::MAX_TOTAL {
        return Err(DomainError::validation(format!(
            "order total must be below {}",
            money::MAX_TOTAL
        )));
    }

    Ok(PricedOrder {
        customer_name: cmd.customer_name().to_string(),
        status: cmd.status(),
        lines,
        total_amount,
    })
}
