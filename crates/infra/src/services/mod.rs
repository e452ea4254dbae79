//! Application services: the Catalog Manager and the Order Manager.
//!
//! Services sit between the HTTP layer and a [`Store`](crate::store::Store).
//! They take already-validated domain commands, turn "row not there" into
//! `NotFound`, log mutations, and fold domain and store failures into one
//! [`ServiceError`] the API maps to status codes.

use thiserror::Error;

use orderdesk_core::DomainError;

use crate::store::StoreError;

pub mod catalog;
pub mod orders;

pub use catalog::CatalogService;
pub use orders::OrderService;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Input failed validation (bad field, bad id, bad listing parameter).
    #[error("{0}")]
    Validation(String),

    /// The addressed resource, or a product an order refers to, does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The operation conflicts with existing state.
    #[error("{0}")]
    Conflict(String),

    /// The backing store failed; the operation was rolled back.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                ServiceError::Validation(msg)
            }
            DomainError::NotFound(what) => ServiceError::NotFound(what),
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Domain(e) => e.into(),
            e @ StoreError::Database { .. } => ServiceError::Storage(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_service_kinds() {
        assert_eq!(
            ServiceError::from(DomainError::invalid_id("OrderId: must be positive")),
            ServiceError::Validation("OrderId: must be positive".into())
        );
        assert_eq!(
            ServiceError::from(DomainError::not_found("product 3")),
            ServiceError::NotFound("product 3".into())
        );
        assert_eq!(
            ServiceError::from(StoreError::Domain(DomainError::conflict("in use"))),
            ServiceError::Conflict("in use".into())
        );
    }

    #[test]
    fn database_errors_are_storage_failures() {
        let err = ServiceError::from(StoreError::database("create_order", "connection reset"));
        assert_eq!(
            err,
            ServiceError::Storage("database error in create_order: connection reset".into())
        );
    }

    #[test]
    fn not_found_message_names_the_resource() {
        assert_eq!(ServiceError::NotFound("order 4".into()).to_string(), "order 4 not found");
    }
}
