//! Products domain module (catalog).
//!
//! Business rules for catalog products, implemented as plain domain logic
//! (no IO, no HTTP, no storage). Stores persist what this crate validates.

pub mod product;

pub use product::{CreateProduct, Product, ProductSortField, UpdateProduct};
