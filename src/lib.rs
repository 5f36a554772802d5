//! Local Library catalog
//!
//! Catalog management core for a small lending library: authors, genres,
//! books and their physical copies, with validated forms and delete guards
//! over a PostgreSQL or in-memory store.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod repository;
pub mod services;
pub mod validation;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{memory::MemoryStore, CatalogStore, Repository};
pub use services::Services;
pub use validation::FormPayload;

/// Shared handles for a presentation layer
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<Services>,
}

impl AppState {
    /// Connect to PostgreSQL as configured and build the services
    pub async fn connect(config: AppConfig) -> AppResult<Self> {
        let repository = Repository::connect(&config.database).await?;
        Ok(Self {
            config: Arc::new(config),
            services: Arc::new(Services::new(Arc::new(repository))),
        })
    }

    /// Services over a fresh in-memory store
    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            services: Arc::new(Services::new(Arc::new(MemoryStore::new()))),
        }
    }
}
