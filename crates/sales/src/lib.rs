//! Sales orders domain module.
//!
//! Business rules for orders and their line items, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). The central rule
//! lives in [`pricing`]: an order's total is derived from the unit prices
//! captured when the order is created, never supplied by a client.

pub mod listing;
pub mod order;
pub mod pricing;

pub use listing::{OrderFilter, OrderSortField};
pub use order::{CreateOrder, LineItem, Order, OrderLineRequest, OrderStatus, UpdateOrder};
pub use pricing::{price_order, PricedLine, PricedOrder};
