// Model exports
pub mod domain;
pub mod messages;
pub mod requests;
pub mod responses;

pub use domain::{Coordinates, MatchCandidate, ProfileUpdate, UserId, UserProfile};
pub use messages::{InboundEvent, OutboundMessage};
pub use requests::{EventRequest, EventType};
pub use responses::{ErrorResponse, EventResponse, HealthResponse, RenderedMessage};
