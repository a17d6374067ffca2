pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::{DatabaseConfig, StorageBackend};

pub use manager::{DatabaseError, DatabaseManager};
pub use repository::{CarRepository, UpdatedCar, UserRepository};

/// The storage handles a running service works against
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub cars: Arc<dyn CarRepository>,
    pool: Option<PgPool>,
}

impl Repositories {
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        match config.backend {
            StorageBackend::Postgres => {
                let pool = DatabaseManager::connect(config).await?;
                Ok(Self::postgres(pool))
            }
            StorageBackend::Memory => {
                warn!("Using in-memory storage; all data is lost on shutdown");
                Ok(Self::memory())
            }
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(postgres::PgUserRepository::new(pool.clone())),
            cars: Arc::new(postgres::PgCarRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    pub fn memory() -> Self {
        Self {
            users: Arc::new(memory::MemoryUserRepository::new()),
            cars: Arc::new(memory::MemoryCarRepository::new()),
            pool: None,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        if self.pool.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        match &self.pool {
            Some(pool) => DatabaseManager::health_check(pool).await,
            None => Ok(()),
        }
    }

    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}
