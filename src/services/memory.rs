use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::{ProfileUpdate, UserId, UserProfile};
use crate::services::store::{ProfileStore, StoreError};

/// Process-local profile store
///
/// Used by the test suite and when no database URL is configured. Profiles
/// are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<UserId, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows
    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn upsert(&self, user_id: UserId, update: &ProfileUpdate) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().await;
        profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::empty(user_id))
            .apply(update);

        tracing::debug!(user_id, "Upserted profile in memory");
        Ok(())
    }

    async fn get(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn list_others_with_location(
        &self,
        user_id: UserId,
    ) -> Result<Vec<UserProfile>, StoreError> {
        let profiles = self.profiles.read().await;
        Ok(profiles
            .values()
            .filter(|p| p.user_id != user_id && p.location.is_some())
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_upsert_creates_then_merges() {
        let store = InMemoryProfileStore::new();
        store
            .upsert(1, &ProfileUpdate::location(Coordinates::new(10.0, 20.0)))
            .await
            .unwrap();
        store
            .upsert(
                1,
                &ProfileUpdate::registration(
                    "Ana".to_string(),
                    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                    "female".to_string(),
                ),
            )
            .await
            .unwrap();

        let profile = store.get(1).await.unwrap().unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(profile.name.as_deref(), Some("Ana"));
        assert_eq!(profile.location, Some(Coordinates::new(10.0, 20.0)));
    }

    #[tokio::test]
    async fn test_list_excludes_requester_and_unlocated() {
        let store = InMemoryProfileStore::new();
        store
            .upsert(1, &ProfileUpdate::location(Coordinates::new(0.0, 0.0)))
            .await
            .unwrap();
        store
            .upsert(2, &ProfileUpdate::location(Coordinates::new(0.0, 0.1)))
            .await
            .unwrap();
        store
            .upsert(
                3,
                &ProfileUpdate::registration(
                    "NoLoc".to_string(),
                    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                    "male".to_string(),
                ),
            )
            .await
            .unwrap();

        let others = store.list_others_with_location(1).await.unwrap();
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].user_id, 2);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let store = InMemoryProfileStore::new();
        assert!(store.get(42).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }
}
