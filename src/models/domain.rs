use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// External user identifier provided by the chat transport
pub type UserId = i64;

/// A latitude/longitude pair in degrees
///
/// Stored profiles hold coordinates as a single optional value so that
/// latitude and longitude can never be set independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Durable profile record, one per user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub location: Option<Coordinates>,
    #[serde(default)]
    pub pictures: Option<String>,
}

impl UserProfile {
    /// An empty record, as created by the first partial update for a user
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            name: None,
            dob: None,
            gender: None,
            location: None,
            pictures: None,
        }
    }

    /// Whether the registration conversation has been completed for this user
    pub fn is_registered(&self) -> bool {
        self.name.is_some() && self.dob.is_some() && self.gender.is_some()
    }

    /// Merge a partial update into this record. Absent fields are left untouched.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.name {
            self.name = Some(name.clone());
        }
        if let Some(dob) = update.dob {
            self.dob = Some(dob);
        }
        if let Some(gender) = &update.gender {
            self.gender = Some(gender.clone());
        }
        if let Some(location) = update.location {
            self.location = Some(location);
        }
    }
}

/// Partial profile write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub gender: Option<String>,
    pub location: Option<Coordinates>,
}

impl ProfileUpdate {
    /// The write performed when a registration completes
    pub fn registration(name: String, dob: NaiveDate, gender: String) -> Self {
        Self {
            name: Some(name),
            dob: Some(dob),
            gender: Some(gender),
            location: None,
        }
    }

    /// The write performed when a user shares their location
    pub fn location(coordinates: Coordinates) -> Self {
        Self {
            location: Some(coordinates),
            ..Self::default()
        }
    }
}

/// A nearby user returned by the proximity matcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub name: String,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
}
