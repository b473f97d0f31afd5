//! Application state - shared across all handlers.

use std::sync::Arc;

use adboard_core::AdvertisementService;
use adboard_core::ports::{AdvertisementRepository, UserRepository};
use adboard_infra::{InMemoryAdvertisementRepository, InMemoryStore, InMemoryUserRepository};

#[cfg(feature = "postgres")]
use adboard_infra::{PostgresAdvertisementRepository, PostgresUserRepository, database};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub advertisements: AdvertisementService,
}

impl AppState {
    /// State backed by a fresh in-memory store.
    pub fn in_memory(max_open: u64) -> Self {
        let store = InMemoryStore::new();
        Self::from_repositories(
            Arc::new(InMemoryUserRepository::new(store.clone())),
            Arc::new(InMemoryAdvertisementRepository::new(store)),
            max_open,
        )
    }

    fn from_repositories(
        users: Arc<dyn UserRepository>,
        advertisements: Arc<dyn AdvertisementRepository>,
        max_open: u64,
    ) -> Self {
        Self {
            users,
            advertisements: AdvertisementService::new(advertisements, max_open),
        }
    }

    /// Build the state for `config`.
    ///
    /// A configured database that cannot be reached is a startup error; with
    /// no database configured the server runs on the in-memory store.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let max_open = config.max_open_advertisements;

        #[cfg(feature = "postgres")]
        if let Some(db_config) = &config.database {
            let conn = Arc::new(database::connect(db_config).await?);
            tracing::info!(max_open, "Application state initialized (postgres)");
            return Ok(Self::from_repositories(
                Arc::new(PostgresUserRepository::new(conn.clone())),
                Arc::new(PostgresAdvertisementRepository::new(conn)),
                max_open,
            ));
        }

        #[cfg(not(feature = "postgres"))]
        if config.database.is_some() {
            tracing::warn!("DATABASE_URL is set but the postgres feature is disabled");
        }

        tracing::warn!("No database configured. Data will not survive a restart.");
        tracing::info!(max_open, "Application state initialized (in-memory)");
        Ok(Self::in_memory(max_open))
    }
}
