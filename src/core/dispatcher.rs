use std::sync::Arc;

use crate::core::{
    conversation::ConversationStateMachine,
    error::CoreError,
    location::LocationUpdater,
    matcher::{MatchOutcome, ProximityMatcher},
};
use crate::models::{InboundEvent, OutboundMessage};

/// Single entry point for inbound events
///
/// Each event is routed to exactly one component. Core errors never escape:
/// they become replies, and the component that failed keeps its state.
#[derive(Clone)]
pub struct Dispatcher {
    conversation: Arc<ConversationStateMachine>,
    matcher: ProximityMatcher,
    locations: LocationUpdater,
}

impl Dispatcher {
    pub fn new(
        conversation: Arc<ConversationStateMachine>,
        matcher: ProximityMatcher,
        locations: LocationUpdater,
    ) -> Self {
        Self {
            conversation,
            matcher,
            locations,
        }
    }

    pub fn conversation(&self) -> &ConversationStateMachine {
        &self.conversation
    }

    /// Handle one inbound event and return the replies for the user
    pub async fn dispatch(&self, event: InboundEvent) -> Vec<OutboundMessage> {
        let user_id = event.user_id();
        let event_name = event.name();
        tracing::debug!(user_id, event = event_name, "Dispatching event");

        let result = match event {
            InboundEvent::StartRequested { .. } => Ok(vec![OutboundMessage::Welcome]),
            InboundEvent::RegisterRequested { user_id } => self.conversation.begin(user_id).await,
            InboundEvent::TextReceived { user_id, text } => self
                .conversation
                .handle_text(user_id, &text)
                .await
                .map(|replies| replies.unwrap_or_else(|| vec![OutboundMessage::NotRegistering])),
            InboundEvent::ShareLocationRequested { .. } => {
                Ok(vec![OutboundMessage::RequestLocation])
            }
            InboundEvent::LocationShared { user_id, location } => self
                .locations
                .update(user_id, location)
                .await
                .map(|_| vec![OutboundMessage::LocationSaved]),
            InboundEvent::FindMatchesRequested { user_id } => {
                self.matcher
                    .find_matches(user_id)
                    .await
                    .map(|outcome| match outcome {
                        MatchOutcome::Found(matches) => vec![OutboundMessage::MatchList { matches }],
                        MatchOutcome::NoneWithinRadius => vec![OutboundMessage::NoMatches {
                            radius_km: self.matcher.radius_km(),
                        }],
                    })
            }
        };

        result.unwrap_or_else(|err| reply_for_error(user_id, event_name, err))
    }
}

fn reply_for_error(user_id: i64, event: &str, err: CoreError) -> Vec<OutboundMessage> {
    match err {
        CoreError::Validation(reason) => {
            tracing::info!(user_id, event, %reason, "Rejected user input");
            vec![OutboundMessage::InvalidDob]
        }
        CoreError::MissingLocation(_) => {
            tracing::info!(user_id, event, "Match requested without a location");
            vec![OutboundMessage::ShareLocationFirst]
        }
        CoreError::Storage(e) => {
            tracing::error!(user_id, event, error = %e, "Storage failure");
            vec![OutboundMessage::StorageFailure]
        }
    }
}
