// Core exports
pub mod conversation;
pub mod dispatcher;
pub mod distance;
pub mod error;
pub mod location;
pub mod matcher;

pub use conversation::{age_in_years, parse_dob, ConversationStateMachine, RegistrationState};
pub use dispatcher::Dispatcher;
pub use distance::{distance_between, haversine_distance, EARTH_RADIUS_KM};
pub use error::CoreError;
pub use location::LocationUpdater;
pub use matcher::{filter_within_radius, MatchOutcome, ProximityMatcher, DEFAULT_RADIUS_KM};
