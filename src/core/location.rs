use std::sync::Arc;

use crate::core::error::CoreError;
use crate::models::{Coordinates, ProfileUpdate, UserId};
use crate::services::ProfileStore;

/// Writes a user's coordinates, independent of registration
///
/// Last write wins. Values are stored as given; range checks belong to the
/// transport boundary.
#[derive(Clone)]
pub struct LocationUpdater {
    store: Arc<dyn ProfileStore>,
}

impl LocationUpdater {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    pub async fn update(&self, user_id: UserId, location: Coordinates) -> Result<(), CoreError> {
        self.store
            .upsert(user_id, &ProfileUpdate::location(location))
            .await?;

        tracing::info!(user_id, "Location saved");
        Ok(())
    }
}
