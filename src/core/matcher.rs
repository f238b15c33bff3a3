use std::sync::Arc;

use crate::core::{distance::distance_between, error::CoreError};
use crate::models::{Coordinates, MatchCandidate, UserId, UserProfile};
use crate::services::ProfileStore;

/// Default matching radius in kilometers
pub const DEFAULT_RADIUS_KM: f64 = 50.0;

/// Result of a match query for a user with a known location
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// At least one candidate within the radius, nearest first
    Found(Vec<MatchCandidate>),
    /// Nobody within the radius
    NoneWithinRadius,
}

/// Keep the candidates within `radius_km` of `origin`, nearest first
///
/// The radius is inclusive. Profiles without coordinates or without a display
/// name are skipped.
pub fn filter_within_radius(
    origin: &Coordinates,
    candidates: Vec<UserProfile>,
    radius_km: f64,
) -> Vec<MatchCandidate> {
    let mut matches: Vec<MatchCandidate> = candidates
        .into_iter()
        .filter_map(|profile| {
            let location = profile.location?;
            let Some(name) = profile.name else {
                tracing::trace!(user_id = profile.user_id, "Skipping unregistered profile");
                return None;
            };

            let distance_km = distance_between(origin, &location);
            (distance_km <= radius_km).then_some(MatchCandidate {
                user_id: profile.user_id,
                name,
                distance_km,
            })
        })
        .collect();

    // Sort by distance (ascending), ties broken by user id for stable output
    matches.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    matches
}

/// Finds registered users near the requester
#[derive(Clone)]
pub struct ProximityMatcher {
    store: Arc<dyn ProfileStore>,
    radius_km: f64,
}

impl ProximityMatcher {
    pub fn new(store: Arc<dyn ProfileStore>, radius_km: f64) -> Self {
        Self { store, radius_km }
    }

    pub fn with_default_radius(store: Arc<dyn ProfileStore>) -> Self {
        Self::new(store, DEFAULT_RADIUS_KM)
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    /// Find matches for a user based on their stored coordinates
    ///
    /// Fails with [`CoreError::MissingLocation`] when the requester has no
    /// profile or no coordinates.
    pub async fn find_matches(&self, user_id: UserId) -> Result<MatchOutcome, CoreError> {
        let origin = self
            .store
            .get(user_id)
            .await?
            .and_then(|profile| profile.location)
            .ok_or(CoreError::MissingLocation(user_id))?;

        let candidates = self.store.list_others_with_location(user_id).await?;
        let total_candidates = candidates.len();

        let matches = filter_within_radius(&origin, candidates, self.radius_km);

        tracing::info!(
            user_id,
            matches = matches.len(),
            total_candidates,
            radius_km = self.radius_km,
            "Proximity match complete"
        );

        if matches.is_empty() {
            Ok(MatchOutcome::NoneWithinRadius)
        } else {
            Ok(MatchOutcome::Found(matches))
        }
    }
}
