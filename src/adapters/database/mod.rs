pub mod conversation_repo;
pub mod message_repo;
pub mod records;
pub mod user_repo;

use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::services::store::{StoreHealth, Stores};
use async_trait::async_trait;
use conversation_repo::ConversationRepository;
use message_repo::MessageRepository;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::sync::Arc;
use std::time::Duration;
use user_repo::UserRepository;

pub type DbPool = Pool<Postgres>;

/// Initializes the database connection pool.
///
/// # Errors
/// Returns `sqlx::Error` if the connection fails.
pub async fn init_pool(url: &str, config: &DatabaseConfig) -> std::result::Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(url)
        .await
}

#[derive(Clone, Debug)]
pub struct PoolHealth {
    pool: DbPool,
}

#[async_trait]
impl StoreHealth for PoolHealth {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Builds the PostgreSQL-backed store handles sharing one pool.
#[must_use]
pub fn stores(pool: &DbPool) -> Stores {
    Stores {
        conversations: Arc::new(ConversationRepository::new(pool.clone())),
        messages: Arc::new(MessageRepository::new(pool.clone())),
        users: Arc::new(UserRepository::new(pool.clone())),
        health: Arc::new(PoolHealth { pool: pool.clone() }),
    }
}
