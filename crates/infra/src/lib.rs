//! Infrastructure layer: stores, services, configuration, seeding.

pub mod config;
pub mod seed;
pub mod services;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use services::{CatalogService, OrderService, ServiceError};
pub use store::{CatalogStore, InMemoryStore, OrderStore, PostgresStore, Store, StoreError, StoreStats};
