//! `orderdesk-core`: shared domain building blocks.
//!
//! Pure domain primitives only (no IO, no HTTP, no storage): identifiers,
//! the domain error model, money helpers and the listing contract shared by
//! product and order listings.

pub mod entity;
pub mod error;
pub mod id;
pub mod listing;
pub mod money;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{LineItemId, OrderId, ProductId};
pub use listing::{ListQuery, Page, PageRequest, SortField, SortOrder};
