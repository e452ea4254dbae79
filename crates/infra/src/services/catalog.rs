use orderdesk_core::{ListQuery, Page, ProductId};
use orderdesk_products::{CreateProduct, Product, ProductSortField, UpdateProduct};

use super::{ServiceError, ServiceResult};
use crate::store::CatalogStore;

/// Catalog Manager: product CRUD on top of a [`CatalogStore`].
#[derive(Debug, Clone)]
pub struct CatalogService<S> {
    store: S,
}

impl<S> CatalogService<S>
where
    S: CatalogStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create(&self, cmd: CreateProduct) -> ServiceResult<Product> {
        let product = self.store.insert_product(cmd).await?;
        tracing::info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    pub async fn get(&self, id: ProductId) -> ServiceResult<Product> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn list(&self, query: ListQuery<ProductSortField>) -> ServiceResult<Page<Product>> {
        Ok(self.store.list_products(query).await?)
    }

    /// Apply the supplied fields. An empty patch returns the product as is.
    pub async fn update(&self, id: ProductId, patch: UpdateProduct) -> ServiceResult<Product> {
        if patch.is_empty() {
            return self.get(id).await;
        }
        let product = self
            .store
            .update_product(id, &patch)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(product_id = %id, "product updated");
        Ok(product)
    }

    pub async fn delete(&self, id: ProductId) -> ServiceResult<()> {
        match self.store.delete_product(id).await {
            Ok(true) => {
                tracing::info!(product_id = %id, "product deleted");
                Ok(())
            }
            Ok(false) => Err(not_found(id)),
            Err(e) => {
                let err = ServiceError::from(e);
                if matches!(err, ServiceError::Conflict(_)) {
                    tracing::debug!(product_id = %id, error = %err, "product delete rejected");
                }
                Err(err)
            }
        }
    }
}

fn not_found(id: ProductId) -> ServiceError {
    ServiceError::NotFound(format!("product {id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use crate::store::InMemoryStore;

    fn service() -> CatalogService<Arc<InMemoryStore>> {
        CatalogService::new(Arc::new(InMemoryStore::new()))
    }

    fn widget() -> CreateProduct {
        CreateProduct::new("Widget", "tools", Decimal::from_str("12.50").unwrap(), 4).unwrap()
    }

    #[tokio::test]
    async fn create_then_get() {
        let svc = service();
        let created = svc.create(widget()).await.unwrap();
        assert_eq!(created.id, ProductId::new(1));

        let loaded = svc.get(created.id).await.unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn missing_product_is_not_found() {
        let svc = service();
        let err = svc.get(ProductId::new(42)).await.unwrap_err();
        assert_eq!(err, ServiceError::NotFound("product 42".into()));

        let err = svc.delete(ProductId::new(42)).await.unwrap_err();
        assert_eq!(err, ServiceError::NotFound("product 42".into()));

        let patch = UpdateProduct::new(Some("New".into()), None, None, None).unwrap();
        let err = svc.update(ProductId::new(42), patch).await.unwrap_err();
        assert_eq!(err, ServiceError::NotFound("product 42".into()));
    }

    #[tokio::test]
    async fn empty_patch_returns_product_unchanged() {
        let svc = service();
        let created = svc.create(widget()).await.unwrap();

        let unchanged = svc.update(created.id, UpdateProduct::default()).await.unwrap();
        assert_eq!(unchanged, created);

        let err = svc.update(ProductId::new(9), UpdateProduct::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_product() {
        let svc = service();
        let created = svc.create(widget()).await.unwrap();

        svc.delete(created.id).await.unwrap();
        assert!(matches!(svc.get(created.id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_reports_totals() {
        let svc = service();
        for _ in 0..3 {
            svc.create(widget()).await.unwrap();
        }
        let query = ListQuery::parse(Some(2), Some(2), None, None).unwrap();
        let page = svc.list(query).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
    }
}
