use std::sync::Arc;

use anyhow::Context;

use orderdesk_infra::seed::{self, SeedData};
use orderdesk_infra::{
    AppConfig, CatalogService, InMemoryStore, OrderService, PostgresStore, Store,
};

/// Shared handles used by the route handlers.
pub struct AppServices {
    pub catalog: CatalogService<Arc<dyn Store>>,
    pub orders: OrderService<Arc<dyn Store>>,
    store: Arc<dyn Store>,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            catalog: CatalogService::new(store.clone()),
            orders: OrderService::new(store.clone()),
            store,
        }
    }

    /// In-memory backend (dev/tests).
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}

/// Open the configured store, apply the schema and seed data.
///
/// `DATABASE_URL` selects Postgres; without it everything lives in memory.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let pg = PostgresStore::connect(url, config.max_connections)
                .await
                .context("failed to connect to postgres")?;
            pg.ensure_schema()
                .await
                .context("failed to apply database schema")?;
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };

    if let Some(path) = &config.seed_file {
        let data = SeedData::load(path).await?;
        seed::apply(store.as_ref(), &data)
            .await
            .with_context(|| format!("failed to apply seed file {}", path.display()))?;
    }

    Ok(AppServices::new(store))
}
