//! Postgres-backed store implementation.
//!
//! Tables: `products`, `orders`, `order_items`; `order_items` references both
//! `orders` (cascade on delete) and `products` (restrict).
//!
//! ## Transactions
//!
//! - Creating an order reads the referenced product rows `FOR SHARE`, prices
//!   the lines and inserts header + lines in one transaction.
//! - Deleting a product locks the row `FOR UPDATE`, checks for referencing
//!   lines and deletes in one transaction, so it serialises with concurrent
//!   order creation.
//! - Deleting an order removes its lines and header in one transaction.
//! - Reads of orders with lines run in a `REPEATABLE READ` snapshot.
//!
//! Any error before `commit` rolls the whole transaction back.
//!
//! ## Error Mapping
//!
//! | PostgreSQL Error Code | StoreError | Scenario |
//! |----------------------|------------|----------|
//! | `23503` | `Domain(Conflict)` | Foreign key violation (product deleted/referenced concurrently) |
//! | `23505` | `Domain(Conflict)` | Unique violation |
//! | `23514` | `Domain(Validation)` | Check constraint violation |
//! | `22003` | `Domain(Validation)` | Numeric value out of range |
//! | other / pool errors | `Database` | Connectivity, aborted transactions, ... |

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use orderdesk_core::{
    DomainError, LineItemId, ListQuery, OrderId, Page, ProductId, SortField,
};
use orderdesk_products::{CreateProduct, Product, ProductSortField, UpdateProduct};
use orderdesk_sales::{
    price_order, CreateOrder, LineItem, Order, OrderFilter, OrderSortField, OrderStatus,
    UpdateOrder,
};

use super::{CatalogStore, OrderStore, Store, StoreError, StoreStats};

/// DDL applied by [`PostgresStore::ensure_schema`]. Every statement is
/// idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          BIGSERIAL PRIMARY KEY,
        name        VARCHAR(120) NOT NULL,
        category    VARCHAR(80) NOT NULL,
        price       NUMERIC(10, 2) NOT NULL CHECK (price >= 0),
        stock       INTEGER NOT NULL CHECK (stock >= 0),
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id             BIGSERIAL PRIMARY KEY,
        customer_name  VARCHAR(120) NOT NULL,
        status         VARCHAR(20) NOT NULL DEFAULT 'pending'
                       CHECK (status IN ('pending', 'processing', 'shipped', 'completed', 'cancelled')),
        total_amount   NUMERIC(12, 2) NOT NULL CHECK (total_amount >= 0),
        created_at     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at     TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        id          BIGSERIAL PRIMARY KEY,
        order_id    BIGINT NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
        product_id  BIGINT NOT NULL REFERENCES products (id) ON DELETE RESTRICT,
        quantity    INTEGER NOT NULL CHECK (quantity > 0),
        unit_price  NUMERIC(10, 2) NOT NULL CHECK (unit_price >= 0)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS order_items_order_id_idx ON order_items (order_id)",
    "CREATE INDEX IF NOT EXISTS order_items_product_id_idx ON order_items (product_id)",
    "CREATE INDEX IF NOT EXISTS orders_status_idx ON orders (status)",
];

const PRODUCT_COLUMNS: &str = "id, name, category, price, stock, created_at";
const ORDER_COLUMNS: &str = "id, customer_name, status, total_amount, created_at, updated_at";

/// Postgres-backed store for the catalog and orders.
///
/// Uses the SQLx connection pool, which is thread-safe, so a single instance
/// can be shared across request handlers.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    /// Create a new PostgresStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a connection pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let mut tx = self.begin("ensure_schema").await?;
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        commit(tx, "ensure_schema").await
    }

    async fn begin(&self, operation: &'static str) -> Result<Transaction<'static, Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }

    /// Read-only transaction over a single snapshot, so a header and its
    /// lines are always observed together.
    async fn begin_snapshot(
        &self,
        operation: &'static str,
    ) -> Result<Transaction<'static, Postgres>, StoreError> {
        let mut tx = self.begin(operation).await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        Ok(tx)
    }
}

async fn commit(tx: Transaction<'_, Postgres>, operation: &'static str) -> Result<(), StoreError> {
    tx.commit().await.map_err(|e| map_sqlx_error(operation, e))
}

/// Roll back after the outcome is already decided.
///
/// A failed rollback is logged rather than returned so it never masks that
/// outcome; the connection discards the transaction either way.
async fn rollback(tx: Transaction<'_, Postgres>, operation: &'static str) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(operation, error = %e, "transaction rollback failed");
    }
}

/// Load the lines of `order_ids`, grouped by order and ordered by line id.
async fn load_lines(
    tx: &mut Transaction<'_, Postgres>,
    order_ids: &[i64],
    operation: &'static str,
) -> Result<HashMap<i64, Vec<LineItem>>, StoreError> {
    let mut grouped: HashMap<i64, Vec<LineItem>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(grouped);
    }

    let rows = sqlx::query(
        r#"
        SELECT id, order_id, product_id, quantity, unit_price
        FROM order_items
        WHERE order_id = ANY($1)
        ORDER BY order_id ASC, id ASC
        "#,
    )
    .bind(order_ids)
    .fetch_all(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error(operation, e))?;

    for row in rows {
        let line = LineRow::from_row(&row).map_err(|e| map_sqlx_error(operation, e))?;
        let order_id = line.order_id;
        grouped.entry(order_id).or_default().push(line.try_into()?);
    }
    Ok(grouped)
}

fn order_by_clause<S: SortField>(query: &ListQuery<S>) -> String {
    // Column names come from the allow-list, never from raw input. Text
    // columns use the "C" collation so ordering is byte-wise, as in memory.
    let collate = if query.sort_by.is_text() { " COLLATE \"C\"" } else { "" };
    format!(
        "ORDER BY {}{} {}, id ASC",
        query.sort_by.as_str(),
        collate,
        query.sort_order.as_sql()
    )
}

fn page_bounds<S: SortField>(query: &ListQuery<S>) -> (i64, i64) {
    let limit = i64::try_from(query.page.limit()).unwrap_or(i64::MAX);
    let offset = i64::try_from(query.page.offset()).unwrap_or(i64::MAX);
    (limit, offset)
}

/// `ILIKE` pattern matching `needle` anywhere, with wildcards in the needle
/// taken literally.
fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait::async_trait]
impl CatalogStore for PostgresStore {
    #[instrument(skip(self, cmd), fields(name = cmd.name()), err)]
    async fn insert_product(&self, cmd: CreateProduct) -> Result<Product, StoreError> {
        let sql = format!(
            "INSERT INTO products (name, category, price, stock) VALUES ($1, $2, $3, $4) RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(cmd.name())
            .bind(cmd.category())
            .bind(cmd.price())
            .bind(cmd.stock())
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_product", e))?;

        let row = ProductRow::from_row(&row).map_err(|e| map_sqlx_error("insert_product", e))?;
        Ok(row.into())
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;

        row.map(|r| ProductRow::from_row(&r).map(Product::from))
            .transpose()
            .map_err(|e| map_sqlx_error("get_product", e))
    }

    #[instrument(skip(self), fields(sort_by = query.sort_by.as_str(), page = query.page.page()), err)]
    async fn list_products(
        &self,
        query: ListQuery<ProductSortField>,
    ) -> Result<Page<Product>, StoreError> {
        let mut tx = self.begin_snapshot("list_products").await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;

        let (limit, offset) = page_bounds(&query);
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products {} LIMIT $1 OFFSET $2",
            order_by_clause(&query)
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("list_products", e))?;
        commit(tx, "list_products").await?;

        let items = rows
            .iter()
            .map(|r| ProductRow::from_row(r).map(Product::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("list_products", e))?;

        Ok(Page::new(items, query.page, total.max(0) as u64))
    }

    #[instrument(skip(self, patch), fields(product_id = %id), err)]
    async fn update_product(
        &self,
        id: ProductId,
        patch: &UpdateProduct,
    ) -> Result<Option<Product>, StoreError> {
        let sql = format!(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                category = COALESCE($3, category),
                price = COALESCE($4, price),
                stock = COALESCE($5, stock)
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(id.get())
            .bind(patch.name())
            .bind(patch.category())
            .bind(patch.price())
            .bind(patch.stock())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_product", e))?;

        row.map(|r| ProductRow::from_row(&r).map(Product::from))
            .transpose()
            .map_err(|e| map_sqlx_error("update_product", e))
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_product(&self, id: ProductId) -> Result<bool, StoreError> {
        let mut tx = self.begin("delete_product").await?;

        let exists = sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?
            .is_some();
        if !exists {
            rollback(tx, "delete_product").await;
            return Ok(false);
        }

        let referenced: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM order_items WHERE product_id = $1)")
                .bind(id.get())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("delete_product", e))?;
        if referenced {
            rollback(tx, "delete_product").await;
            return Err(DomainError::conflict(format!(
                "product {id} is referenced by existing orders"
            ))
            .into());
        }

        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        commit(tx, "delete_product").await?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl OrderStore for PostgresStore {
    #[instrument(skip(self, cmd), fields(line_count = cmd.items().len()), err)]
    async fn create_order(&self, cmd: &CreateOrder) -> Result<Order, StoreError> {
        let mut tx = self.begin("create_order").await?;

        let product_ids: Vec<i64> = cmd.product_ids().into_iter().map(i64::from).collect();
        let rows = sqlx::query("SELECT id, price FROM products WHERE id = ANY($1) FOR SHARE")
            .bind(&product_ids)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_order", e))?;

        let mut prices: HashMap<ProductId, Decimal> = HashMap::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id").map_err(|e| map_sqlx_error("create_order", e))?;
            let price: Decimal = row
                .try_get("price")
                .map_err(|e| map_sqlx_error("create_order", e))?;
            prices.insert(ProductId::new(id), price);
        }

        let priced = match price_order(cmd, |id| prices.get(&id).copied()) {
            Ok(priced) => priced,
            Err(e) => {
                rollback(tx, "create_order").await;
                return Err(e.into());
            }
        };

        let header = sqlx::query(
            r#"
            INSERT INTO orders (customer_name, status, total_amount)
            VALUES ($1, $2, $3)
            RETURNING id, created_at
            "#,
        )
        .bind(&priced.customer_name)
        .bind(priced.status.as_str())
        .bind(priced.total_amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        let order_id: i64 = header
            .try_get("id")
            .map_err(|e| map_sqlx_error("insert_order", e))?;
        let created_at: DateTime<Utc> = header
            .try_get("created_at")
            .map_err(|e| map_sqlx_error("insert_order", e))?;

        let mut line_ids = Vec::with_capacity(priced.lines.len());
        for line in &priced.lines {
            let quantity = i32::try_from(line.quantity)
                .map_err(|_| DomainError::validation("quantity is too large"))?;
            let line_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(order_id)
            .bind(line.product_id.get())
            .bind(quantity)
            .bind(line.unit_price)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_item", e))?;
            line_ids.push(LineItemId::new(line_id));
        }

        let order = priced.into_order(OrderId::new(order_id), &line_ids, created_at)?;

        commit(tx, "create_order").await?;
        Ok(order)
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let mut tx = self.begin_snapshot("get_order").await?;

        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("get_order", e))?;

        let Some(row) = row else {
            commit(tx, "get_order").await?;
            return Ok(None);
        };
        let header = OrderRow::from_row(&row).map_err(|e| map_sqlx_error("get_order", e))?;

        let mut lines = load_lines(&mut tx, &[header.id], "get_order").await?;
        commit(tx, "get_order").await?;

        let items = lines.remove(&header.id).unwrap_or_default();
        Ok(Some(header.into_order(items)?))
    }

    #[instrument(
        skip(self, filter),
        fields(sort_by = query.sort_by.as_str(), page = query.page.page(), status = ?filter.status()),
        err
    )]
    async fn list_orders(
        &self,
        query: ListQuery<OrderSortField>,
        filter: &OrderFilter,
    ) -> Result<Page<Order>, StoreError> {
        let name_pattern = filter.customer_name().map(contains_pattern);
        let status = filter.status().map(OrderStatus::as_str);
        let where_clause = "WHERE ($1::text IS NULL OR customer_name ILIKE $1) \
                            AND ($2::text IS NULL OR status = $2)";

        let mut tx = self.begin_snapshot("list_orders").await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders {where_clause}"))
            .bind(name_pattern.as_deref())
            .bind(status)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("list_orders", e))?;

        let (limit, offset) = page_bounds(&query);
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders {where_clause} {} LIMIT $3 OFFSET $4",
            order_by_clause(&query)
        );
        let rows = sqlx::query(&sql)
            .bind(name_pattern.as_deref())
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("list_orders", e))?;

        let headers = rows
            .iter()
            .map(OrderRow::from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| map_sqlx_error("list_orders", e))?;

        // One batched query for every line on the page.
        let ids: Vec<i64> = headers.iter().map(|h| h.id).collect();
        let mut lines = load_lines(&mut tx, &ids, "list_orders").await?;
        commit(tx, "list_orders").await?;

        let items = headers
            .into_iter()
            .map(|h| {
                let order_lines = lines.remove(&h.id).unwrap_or_default();
                h.into_order(order_lines)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, query.page, total.max(0) as u64))
    }

    #[instrument(skip(self, patch), fields(order_id = %id, status = ?patch.status()), err)]
    async fn update_order(
        &self,
        id: OrderId,
        patch: &UpdateOrder,
    ) -> Result<Option<Order>, StoreError> {
        let mut tx = self.begin("update_order").await?;

        let sql = format!(
            r#"
            UPDATE orders SET
                customer_name = COALESCE($2::text, customer_name),
                status = COALESCE($3::text, status),
                updated_at = CASE
                    WHEN $2::text IS NULL AND $3::text IS NULL THEN updated_at
                    ELSE NOW()
                END
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(id.get())
            .bind(patch.customer_name())
            .bind(patch.status().map(OrderStatus::as_str))
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_order", e))?;

        let Some(row) = row else {
            rollback(tx, "update_order").await;
            return Ok(None);
        };
        let header = OrderRow::from_row(&row).map_err(|e| map_sqlx_error("update_order", e))?;

        let mut lines = load_lines(&mut tx, &[header.id], "update_order").await?;
        commit(tx, "update_order").await?;

        let items = lines.remove(&header.id).unwrap_or_default();
        Ok(Some(header.into_order(items)?))
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn delete_order(&self, id: OrderId) -> Result<bool, StoreError> {
        let mut tx = self.begin("delete_order").await?;

        // Lines first; the FK cascade would do the same, this keeps the
        // behaviour independent of how the schema was created.
        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_order_items", e))?;

        let deleted = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.get())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?
            .rows_affected();

        if deleted == 0 {
            rollback(tx, "delete_order").await;
            return Ok(false);
        }

        commit(tx, "delete_order").await?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl Store for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    #[instrument(skip(self), err)]
    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products)    AS products,
                (SELECT COUNT(*) FROM orders)      AS orders,
                (SELECT COUNT(*) FROM order_items) AS line_items
            "#,
        )
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("stats", e))?;

        let count = |column: &str| -> Result<u64, StoreError> {
            let n: i64 = row.try_get(column).map_err(|e| map_sqlx_error("stats", e))?;
            Ok(n.max(0) as u64)
        };

        Ok(StoreStats {
            products: count("products")?,
            orders: count("orders")?,
            line_items: count("line_items")?,
        })
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            match db_err.code().as_deref() {
                // Foreign key violation: a referenced row disappeared or is
                // still referenced.
                Some("23503") => DomainError::conflict(msg).into(),
                // Unique violation
                Some("23505") => DomainError::conflict(msg).into(),
                // Check constraint violation
                Some("23514") => DomainError::validation(msg).into(),
                // Numeric value out of range (e.g. price beyond NUMERIC(10, 2))
                Some("22003") => DomainError::validation(msg).into(),
                _ => StoreError::database(operation, db_err.message().to_string()),
            }
        }
        sqlx::Error::PoolClosed => StoreError::database(operation, "connection pool closed"),
        sqlx::Error::PoolTimedOut => {
            StoreError::database(operation, "timed out acquiring a connection")
        }
        other => StoreError::database(operation, other.to_string()),
    }
}

// SQLx row types

#[derive(Debug)]
struct ProductRow {
    id: i64,
    name: String,
    category: String,
    price: Decimal,
    stock: i32,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            price: row.try_get("price")?,
            stock: row.try_get("stock")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: ProductId::new(row.id),
            name: row.name,
            category: row.category,
            price: row.price,
            stock: row.stock,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug)]
struct OrderRow {
    id: i64,
    customer_name: String,
    status: String,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for OrderRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(OrderRow {
            id: row.try_get("id")?,
            customer_name: row.try_get("customer_name")?,
            status: row.try_get("status")?,
            total_amount: row.try_get("total_amount")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<LineItem>) -> Result<Order, StoreError> {
        let status: OrderStatus = self.status.parse().map_err(|_| {
            StoreError::database(
                "decode_order",
                format!("order {} has unknown status '{}'", self.id, self.status),
            )
        })?;
        Ok(Order {
            id: OrderId::new(self.id),
            customer_name: self.customer_name,
            status,
            total_amount: self.total_amount,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        })
    }
}

#[derive(Debug)]
struct LineRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    quantity: i32,
    unit_price: Decimal,
}

impl<'r> FromRow<'r, PgRow> for LineRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(LineRow {
            id: row.try_get("id")?,
            order_id: row.try_get("order_id")?,
            product_id: row.try_get("product_id")?,
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get("unit_price")?,
        })
    }
}

impl TryFrom<LineRow> for LineItem {
    type Error = StoreError;

    fn try_from(row: LineRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity).map_err(|_| {
            StoreError::database(
                "decode_order_item",
                format!("line {} has non-positive quantity {}", row.id, row.quantity),
            )
        })?;
        Ok(LineItem {
            id: LineItemId::new(row.id),
            product_id: ProductId::new(row.product_id),
            quantity,
            unit_price: row.unit_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("green"), "%green%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn order_by_uses_allow_listed_column_and_id_tiebreak() {
        let query = ListQuery::<OrderSortField>::parse(None, None, Some("total_amount"), Some("desc"))
            .unwrap();
        assert_eq!(order_by_clause(&query), "ORDER BY total_amount DESC, id ASC");
    }

    #[test]
    fn text_columns_sort_byte_wise() {
        let query =
            ListQuery::<OrderSortField>::parse(None, None, Some("customer_name"), Some("desc"))
                .unwrap();
        assert_eq!(
            order_by_clause(&query),
            "ORDER BY customer_name COLLATE \"C\" DESC, id ASC"
        );

        let query = ListQuery::<ProductSortField>::parse(None, None, Some("price"), None).unwrap();
        assert_eq!(order_by_clause(&query), "ORDER BY price ASC, id ASC");
    }

    #[test]
    fn page_bounds_follow_request() {
        let query = ListQuery::<ProductSortField>::parse(Some(3), Some(25), None, None).unwrap();
        assert_eq!(page_bounds(&query), (25, 50));
    }
}
