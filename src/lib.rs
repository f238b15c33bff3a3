//! Nearby Match - conversational matchmaking bot
//!
//! Users register through a short guided conversation (name, date of birth,
//! gender), share their location, and ask for other registered users within a
//! fixed radius. The core is transport-agnostic: adapters turn chat updates
//! into [`InboundEvent`]s and deliver the resulting [`OutboundMessage`]s.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{
    distance::haversine_distance, ConversationStateMachine, CoreError, Dispatcher,
    LocationUpdater, MatchOutcome, ProximityMatcher, RegistrationState,
};
pub use models::{Coordinates, InboundEvent, MatchCandidate, OutboundMessage, UserProfile};
pub use services::{InMemoryProfileStore, ProfileStore, StoreError};
