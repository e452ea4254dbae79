//! Order listing: sort columns and filters.

use core::cmp::Ordering;

use orderdesk_core::SortField;

use crate::order::{Order, OrderStatus};

/// Columns an order listing may be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderSortField {
    #[default]
    Id,
    CustomerName,
    Status,
    TotalAmount,
    CreatedAt,
}

impl SortField for OrderSortField {
    const ALL: &'static [Self] = &[
        OrderSortField::Id,
        OrderSortField::CustomerName,
        OrderSortField::Status,
        OrderSortField::TotalAmount,
        OrderSortField::CreatedAt,
    ];

    fn as_str(self) -> &'static str {
        match self {
            OrderSortField::Id => "id",
            OrderSortField::CustomerName => "customer_name",
            OrderSortField::Status => "status",
            OrderSortField::TotalAmount => "total_amount",
            OrderSortField::CreatedAt => "created_at",
        }
    }

    fn is_text(self) -> bool {
        matches!(self, OrderSortField::CustomerName | OrderSortField::Status)
    }
}

impl OrderSortField {
    /// Ascending comparison on this column (no id tie-break).
    ///
    /// Status compares by its stored text so in-memory ordering matches the
    /// relational store.
    pub fn compare(self, a: &Order, b: &Order) -> Ordering {
        match self {
            OrderSortField::Id => a.id.cmp(&b.id),
            OrderSortField::CustomerName => a.customer_name.cmp(&b.customer_name),
            OrderSortField::Status => a.status.as_str().cmp(b.status.as_str()),
            OrderSortField::TotalAmount => a.total_amount.cmp(&b.total_amount),
            OrderSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

/// Optional filters for an order listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    customer_name: Option<String>,
    status: Option<OrderStatus>,
}

impl OrderFilter {
    /// Blank customer-name filters are ignored.
    pub fn new(customer_name: Option<String>, status: Option<OrderStatus>) -> Self {
        let customer_name = customer_name
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self { customer_name, status }
    }

    /// Case-insensitive substring to look for in the customer name.
    pub fn customer_name(&self) -> Option<&str> {
        self.customer_name.as_deref()
    }

    pub fn status(&self) -> Option<OrderStatus> {
        self.status
    }

    pub fn matches(&self, order: &Order) -> bool {
        let name_ok = self.customer_name.as_ref().is_none_or(|needle| {
            order
                .customer_name
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });
        let status_ok = self.status.is_none_or(|s| order.status == s);
        name_ok && status_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orderdesk_core::{OrderId, SortField};
    use rust_decimal::Decimal;

    fn order(id: i64, name: &str, status: OrderStatus, total: i64) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(id),
            customer_name: name.to_string(),
            status,
            total_amount: Decimal::new(total, 2),
            created_at: now,
            updated_at: now,
            items: vec![],
        }
    }

    #[test]
    fn customer_filter_is_case_insensitive_substring() {
        let filter = OrderFilter::new(Some("GREEN".into()), None);
        assert!(filter.matches(&order(1, "Taylor Green", OrderStatus::Pending, 100)));
        assert!(!filter.matches(&order(2, "Sam Blue", OrderStatus::Pending, 100)));
    }

    #[test]
    fn status_filter_is_exact() {
        let filter = OrderFilter::new(None, Some(OrderStatus::Shipped));
        assert!(filter.matches(&order(1, "A", OrderStatus::Shipped, 1)));
        assert!(!filter.matches(&order(2, "A", OrderStatus::Pending, 1)));
    }

    #[test]
    fn blank_name_filter_is_ignored() {
        let filter = OrderFilter::new(Some("   ".into()), None);
        assert_eq!(filter, OrderFilter::default());
    }

    #[test]
    fn sort_by_total_compares_amounts() {
        let a = order(1, "A", OrderStatus::Pending, 500);
        let b = order(2, "B", OrderStatus::Pending, 2000);
        assert_eq!(OrderSortField::TotalAmount.compare(&a, &b), Ordering::Less);
        assert_eq!(OrderSortField::parse("total_amount").unwrap(), OrderSortField::TotalAmount);
        assert!(OrderSortField::parse("items").is_err());
    }
}
