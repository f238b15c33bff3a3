use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::time::Duration;

use crate::models::{Coordinates, ProfileUpdate, UserId, UserProfile};
use crate::services::store::{ProfileStore, StoreError};

/// Raw `users` row as stored in PostgreSQL
#[derive(Debug, FromRow)]
struct ProfileRow {
    user_id: i64,
    name: Option<String>,
    dob: Option<NaiveDate>,
    gender: Option<String>,
    location_lat: Option<f64>,
    location_lon: Option<f64>,
    pictures: Option<String>,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        let location = match (row.location_lat, row.location_lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        };

        UserProfile {
            user_id: row.user_id,
            name: row.name,
            dob: row.dob,
            gender: row.gender,
            location,
            pictures: row.pictures,
        }
    }
}

/// PostgreSQL-backed profile store
///
/// Every operation borrows a connection from the pool for the duration of a
/// single statement; sqlx returns it to the pool on every exit path.
pub struct PostgresProfileStore {
    pool: PgPool,
}

impl PostgresProfileStore {
    /// Create a new store from a connection string and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Idempotent: creates the users table on first start
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from optional settings, falling back to pool defaults
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

#[async_trait]
impl ProfileStore for PostgresProfileStore {
    /// Uses INSERT ... ON CONFLICT so the row is created or merged in one statement.
    /// NULL parameters keep the stored value; coordinates travel as a pair.
    async fn upsert(&self, user_id: UserId, update: &ProfileUpdate) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO users (user_id, name, dob, gender, location_lat, location_lon)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id)
            DO UPDATE SET
                name = COALESCE(EXCLUDED.name, users.name),
                dob = COALESCE(EXCLUDED.dob, users.dob),
                gender = COALESCE(EXCLUDED.gender, users.gender),
                location_lat = COALESCE(EXCLUDED.location_lat, users.location_lat),
                location_lon = COALESCE(EXCLUDED.location_lon, users.location_lon)
        "#;

        sqlx::query(query)
            .bind(user_id)
            .bind(update.name.as_deref())
            .bind(update.dob)
            .bind(update.gender.as_deref())
            .bind(update.location.map(|c| c.latitude))
            .bind(update.location.map(|c| c.longitude))
            .execute(&self.pool)
            .await?;

        tracing::debug!(user_id, "Upserted profile");

        Ok(())
    }

    async fn get(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
        let query = r#"
            SELECT user_id, name, dob, gender, location_lat, location_lon, pictures
            FROM users
            WHERE user_id = $1
        "#;

        let row = sqlx::query_as::<_, ProfileRow>(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(UserProfile::from))
    }

    async fn list_others_with_location(
        &self,
        user_id: UserId,
    ) -> Result<Vec<UserProfile>, StoreError> {
        let query = r#"
            SELECT user_id, name, dob, gender, location_lat, location_lon, pictures
            FROM users
            WHERE user_id <> $1
              AND location_lat IS NOT NULL
              AND location_lon IS NOT NULL
        "#;

        let rows = sqlx::query_as::<_, ProfileRow>(query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(user_id, located = rows.len(), "Loaded located profiles");

        Ok(rows.into_iter().map(UserProfile::from).collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(lat: Option<f64>, lon: Option<f64>) -> ProfileRow {
        ProfileRow {
            user_id: 9,
            name: Some("Ana".to_string()),
            dob: NaiveDate::from_ymd_opt(1990, 1, 1),
            gender: Some("female".to_string()),
            location_lat: lat,
            location_lon: lon,
            pictures: None,
        }
    }

    #[test]
    fn test_row_with_both_coordinates_has_location() {
        let profile = UserProfile::from(row(Some(1.5), Some(2.5)));
        assert_eq!(profile.location, Some(Coordinates::new(1.5, 2.5)));
        assert!(profile.is_registered());
    }

    #[test]
    fn test_row_with_partial_coordinates_has_no_location() {
        let profile = UserProfile::from(row(Some(1.5), None));
        assert_eq!(profile.location, None);
    }
}
