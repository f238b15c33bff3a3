use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ProfileUpdate, UserId, UserProfile};

/// Errors that can occur when reading or writing profiles
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable profile storage shared by every core component
///
/// Each operation is atomic for a single row. No cross-row transactions are
/// offered or needed.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Merge the present fields of `update` into the user's row, creating it if absent
    async fn upsert(&self, user_id: UserId, update: &ProfileUpdate) -> Result<(), StoreError>;

    /// Point lookup
    async fn get(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError>;

    /// Every profile except `user_id` that has coordinates
    async fn list_others_with_location(
        &self,
        user_id: UserId,
    ) -> Result<Vec<UserProfile>, StoreError>;

    /// Health check for the backing storage
    async fn health_check(&self) -> Result<bool, StoreError>;
}
