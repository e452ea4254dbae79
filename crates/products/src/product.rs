use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderdesk_core::{money, DomainError, DomainResult, Entity, ProductId, SortField};

const NAME_MAX_LEN: usize = 120;
const CATEGORY_MAX_LEN: usize = 80;

/// A catalog product as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    /// Current catalog price. Orders copy this value at creation time.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

/// Command: CreateProduct.
///
/// Only constructible through [`CreateProduct::new`], so every instance has
/// already passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProduct {
    name: String,
    category: String,
    price: Decimal,
    stock: i32,
}

impl CreateProduct {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        price: Decimal,
        stock: i32,
    ) -> DomainResult<Self> {
        Ok(Self {
            name: validate_name(name.into())?,
            category: validate_category(category.into())?,
            price: money::validate_price(price)?,
            stock: validate_stock(stock)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn stock(&self) -> i32 {
        self.stock
    }

    /// Materialise the product once the store has assigned an id.
    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name,
            category: self.category,
            price: self.price,
            stock: self.stock,
            created_at,
        }
    }
}

/// Command: UpdateProduct (partial; absent fields are left untouched).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateProduct {
    name: Option<String>,
    category: Option<String>,
    price: Option<Decimal>,
    stock: Option<i32>,
}

impl UpdateProduct {
    pub fn new(
        name: Option<String>,
        category: Option<String>,
        price: Option<Decimal>,
        stock: Option<i32>,
    ) -> DomainResult<Self> {
        Ok(Self {
            name: name.map(validate_name).transpose()?,
            category: category.map(validate_category).transpose()?,
            price: price.map(money::validate_price).transpose()?,
            stock: stock.map(validate_stock).transpose()?,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn price(&self) -> Option<Decimal> {
        self.price
    }

    pub fn stock(&self) -> Option<i32> {
        self.stock
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.category.is_none() && self.price.is_none() && self.stock.is_none()
    }

    /// Apply the supplied fields to `product`.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(category) = &self.category {
            product.category = category.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
    }
}

/// Columns a product listing may be sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSortField {
    #[default]
    Id,
    Name,
    Category,
    Price,
    Stock,
    CreatedAt,
}

impl SortField for ProductSortField {
    const ALL: &'static [Self] = &[
        ProductSortField::Id,
        ProductSortField::Name,
        ProductSortField::Category,
        ProductSortField::Price,
        ProductSortField::Stock,
        ProductSortField::CreatedAt,
    ];

    fn as_str(self) -> &'static str {
        match self {
            ProductSortField::Id => "id",
            ProductSortField::Name => "name",
            ProductSortField::Category => "category",
            ProductSortField::Price => "price",
            ProductSortField::Stock => "stock",
            ProductSortField::CreatedAt => "created_at",
        }
    }

    fn is_text(self) -> bool {
        matches!(self, ProductSortField::Name | ProductSortField::Category)
    }
}

impl ProductSortField {
    /// Ascending comparison on this column (no id tie-break).
    pub fn compare(self, a: &Product, b: &Product) -> Ordering {
        match self {
            ProductSortField::Id => a.id.cmp(&b.id),
            ProductSortField::Name => a.name.cmp(&b.name),
            ProductSortField::Category => a.category.cmp(&b.category),
            ProductSortField::Price => a.price.cmp(&b.price),
            ProductSortField::Stock => a.stock.cmp(&b.stock),
            ProductSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

fn validate_name(name: String) -> DomainResult<String> {
    validate_text("name", name, NAME_MAX_LEN)
}

fn validate_category(category: String) -> DomainResult<String> {
    validate_text("category", category, CATEGORY_MAX_LEN)
}

fn validate_text(field: &str, value: String, max_len: usize) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    if trimmed.chars().count() > max_len {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_stock(stock: i32) -> DomainResult<i32> {
    if stock < 0 {
        return Err(DomainError::validation("stock cannot be negative"));
    }
    Ok(stock)
}
