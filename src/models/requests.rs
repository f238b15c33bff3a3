use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{Coordinates, UserId};
use crate::models::messages::InboundEvent;

/// Kind of inbound event accepted by the HTTP event API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Start,
    Register,
    Text,
    Location,
    FindMatches,
    ShareLocation,
}

/// Request to deliver one inbound event
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EventRequest {
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub text: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    #[serde(default)]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl EventRequest {
    /// Convert into a core event, checking that the fields the event type needs are present
    pub fn into_event(self) -> Result<InboundEvent, String> {
        let user_id = self.user_id;
        let event = match self.event_type {
            EventType::Start => InboundEvent::StartRequested { user_id },
            EventType::Register => InboundEvent::RegisterRequested { user_id },
            EventType::FindMatches => InboundEvent::FindMatchesRequested { user_id },
            EventType::ShareLocation => InboundEvent::ShareLocationRequested { user_id },
            EventType::Text => {
                let text = self
                    .text
                    .ok_or_else(|| "text events require a `text` field".to_string())?;
                InboundEvent::TextReceived { user_id, text }
            }
            EventType::Location => match (self.latitude, self.longitude) {
                (Some(latitude), Some(longitude)) => InboundEvent::LocationShared {
                    user_id,
                    location: Coordinates::new(latitude, longitude),
                },
                _ => {
                    return Err(
                        "location events require both `latitude` and `longitude`".to_string()
                    )
                }
            },
        };
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(event_type: EventType) -> EventRequest {
        EventRequest {
            user_id: 1,
            event_type,
            text: None,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn test_location_requires_both_coordinates() {
        let mut req = request(EventType::Location);
        req.latitude = Some(10.0);
        assert!(req.into_event().is_err());
    }

    #[test]
    fn test_out_of_range_latitude_fails_validation() {
        let mut req = request(EventType::Location);
        req.latitude = Some(91.0);
        req.longitude = Some(0.0);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_deserializes_snake_case_type() {
        let req: EventRequest =
            serde_json::from_str(r#"{"userId": 5, "type": "find_matches"}"#).unwrap();
        assert_eq!(
            req.into_event().unwrap(),
            InboundEvent::FindMatchesRequested { user_id: 5 }
        );
    }
}
