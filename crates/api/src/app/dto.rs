use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use orderdesk_core::{DomainResult, ListQuery, Page, ProductId};
use orderdesk_products::{CreateProduct, Product, ProductSortField, UpdateProduct};
use orderdesk_sales::{
    CreateOrder, LineItem, Order, OrderFilter, OrderLineRequest, OrderSortField, OrderStatus,
    UpdateOrder,
};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProductRequest {
    pub name: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i32,
}

impl CreateProductRequest {
    pub fn into_command(self) -> DomainResult<CreateProduct> {
        CreateProduct::new(self.name, self.category, self.price, self.stock)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock: Option<i32>,
}

impl UpdateProductRequest {
    pub fn into_command(self) -> DomainResult<UpdateProduct> {
        UpdateProduct::new(self.name, self.category, self.price, self.stock)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderRequest {
    pub customer_name: String,
    #[serde(default)]
    pub status: Option<String>,
    pub items: Vec<OrderItemRequest>,
}

impl CreateOrderRequest {
    pub fn into_command(self) -> DomainResult<CreateOrder> {
        let status = self.status.as_deref().map(str::parse::<OrderStatus>).transpose()?;
        let items = self
            .items
            .into_iter()
            .map(|item| OrderLineRequest::new(ProductId::new(item.product_id), item.quantity))
            .collect::<DomainResult<Vec<_>>>()?;
        CreateOrder::new(self.customer_name, status, items)
    }
}

/// Only the customer name and status can change; `items` or `total_amount`
/// in the body are rejected as unknown fields.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl UpdateOrderRequest {
    pub fn into_command(self) -> DomainResult<UpdateOrder> {
        let status = self.status.as_deref().map(str::parse::<OrderStatus>).transpose()?;
        UpdateOrder::new(self.customer_name, status)
    }
}

// -------------------------
// Query parameters
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ProductListParams {
    pub fn into_query(self) -> DomainResult<ListQuery<ProductSortField>> {
        ListQuery::parse(
            self.page,
            self.page_size,
            self.sort_by.as_deref(),
            self.sort_order.as_deref(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub customer_name: Option<String>,
    pub status: Option<String>,
}

impl OrderListParams {
    pub fn into_query(self) -> DomainResult<(ListQuery<OrderSortField>, OrderFilter)> {
        let query = ListQuery::parse(
            self.page,
            self.page_size,
            self.sort_by.as_deref(),
            self.sort_order.as_deref(),
        )?;
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<OrderStatus>)
            .transpose()?;
        Ok((query, OrderFilter::new(self.customer_name, status)))
    }
}

// -------------------------
// Response mapping
// -------------------------

/// Monetary amounts go out as JSON numbers.
fn money(amount: Decimal) -> Value {
    amount.to_f64().map(Value::from).unwrap_or(Value::Null)
}

pub fn product_to_json(p: Product) -> Value {
    json!({
        "id": p.id,
        "name": p.name,
        "category": p.category,
        "price": money(p.price),
        "stock": p.stock,
        "created_at": p.created_at,
    })
}

pub fn line_item_to_json(line: &LineItem) -> Value {
    json!({
        "id": line.id,
        "product_id": line.product_id,
        "quantity": line.quantity,
        "unit_price": money(line.unit_price),
        "line_total": money(line.line_total()),
    })
}

pub fn order_to_json(o: Order) -> Value {
    json!({
        "id": o.id,
        "customer_name": o.customer_name,
        "status": o.status.as_str(),
        "total_amount": money(o.total_amount),
        "created_at": o.created_at,
        "updated_at": o.updated_at,
        "items": o.items.iter().map(line_item_to_json).collect::<Vec<_>>(),
    })
}

pub fn page_to_json<T>(page: Page<T>, item_to_json: impl FnMut(T) -> Value) -> Value {
    let page = page.map(item_to_json);
    json!({
        "items": page.items,
        "page": page.page,
        "page_size": page.page_size,
        "total": page.total,
        "total_pages": page.total_pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core::str::FromStr;

    use orderdesk_core::{DomainError, LineItemId, OrderId};

    #[test]
    fn order_json_carries_line_totals() {
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(3),
            customer_name: "Taylor Green".into(),
            status: OrderStatus::Processing,
            total_amount: Decimal::from_str("20.00").unwrap(),
            created_at: now,
            updated_at: now,
            items: vec![LineItem {
                id: LineItemId::new(9),
                product_id: ProductId::new(2),
                quantity: 4,
                unit_price: Decimal::from_str("5.00").unwrap(),
            }],
        };

        let body = order_to_json(order);
        assert_eq!(body["id"], 3);
        assert_eq!(body["status"], "processing");
        assert_eq!(body["total_amount"], 20.0);
        assert_eq!(body["items"][0]["unit_price"], 5.0);
        assert_eq!(body["items"][0]["line_total"], 20.0);
    }

    #[test]
    fn update_order_rejects_items() {
        let err = serde_json::from_str::<UpdateOrderRequest>(
            r#"{"status":"shipped","items":[{"product_id":1,"quantity":1}]}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown field `items`"));
    }

    #[test]
    fn invalid_status_is_a_validation_error() {
        let req = UpdateOrderRequest {
            customer_name: None,
            status: Some("lost".into()),
        };
        assert!(matches!(req.into_command(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn price_accepts_json_numbers() {
        let req: CreateProductRequest = serde_json::from_str(
            r#"{"name":"Pen","category":"stationery","price":1.25,"stock":3}"#,
        )
        .unwrap();
        let cmd = req.into_command().unwrap();
        assert_eq!(cmd.price(), Decimal::from_str("1.25").unwrap());
    }

    #[test]
    fn blank_status_filter_is_ignored() {
        let params = OrderListParams {
            status: Some(String::new()),
            ..Default::default()
        };
        let (_, filter) = params.into_query().unwrap();
        assert_eq!(filter, OrderFilter::default());
    }
}
