use crate::models::domain::{Coordinates, MatchCandidate, UserId};

/// Events delivered to the core by a transport adapter
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    StartRequested { user_id: UserId },
    RegisterRequested { user_id: UserId },
    TextReceived { user_id: UserId, text: String },
    ShareLocationRequested { user_id: UserId },
    LocationShared { user_id: UserId, location: Coordinates },
    FindMatchesRequested { user_id: UserId },
}

impl InboundEvent {
    pub fn user_id(&self) -> UserId {
        match self {
            InboundEvent::StartRequested { user_id }
            | InboundEvent::RegisterRequested { user_id }
            | InboundEvent::TextReceived { user_id, .. }
            | InboundEvent::ShareLocationRequested { user_id }
            | InboundEvent::LocationShared { user_id, .. }
            | InboundEvent::FindMatchesRequested { user_id } => *user_id,
        }
    }

    /// Short name used in log lines
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::StartRequested { .. } => "start",
            InboundEvent::RegisterRequested { .. } => "register",
            InboundEvent::TextReceived { .. } => "text",
            InboundEvent::ShareLocationRequested { .. } => "share_location",
            InboundEvent::LocationShared { .. } => "location",
            InboundEvent::FindMatchesRequested { .. } => "find_matches",
        }
    }
}

/// Reply intents produced by the core. Wording lives in [`OutboundMessage::text`].
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    Welcome,
    PromptName,
    PromptDob,
    InvalidDob,
    AgeAnnouncement { age: i64 },
    PromptGender,
    RegistrationComplete,
    AlreadyRegistered,
    NotRegistering,
    RequestLocation,
    LocationSaved,
    MatchList { matches: Vec<MatchCandidate> },
    NoMatches { radius_km: f64 },
    ShareLocationFirst,
    StorageFailure,
}

impl OutboundMessage {
    /// Stable machine-readable identifier of the intent
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Welcome => "welcome",
            OutboundMessage::PromptName => "prompt_name",
            OutboundMessage::PromptDob => "prompt_dob",
            OutboundMessage::InvalidDob => "invalid_dob",
            OutboundMessage::AgeAnnouncement { .. } => "age_announcement",
            OutboundMessage::PromptGender => "prompt_gender",
            OutboundMessage::RegistrationComplete => "registration_complete",
            OutboundMessage::AlreadyRegistered => "already_registered",
            OutboundMessage::NotRegistering => "not_registering",
            OutboundMessage::RequestLocation => "request_location",
            OutboundMessage::LocationSaved => "location_saved",
            OutboundMessage::MatchList { .. } => "match_list",
            OutboundMessage::NoMatches { .. } => "no_matches",
            OutboundMessage::ShareLocationFirst => "share_location_first",
            OutboundMessage::StorageFailure => "storage_failure",
        }
    }

    /// Human readable text sent to the user
    pub fn text(&self) -> String {
        match self {
            OutboundMessage::Welcome => {
                "Welcome to the Dating Bot! Type /register to start your profile.".to_string()
            }
            OutboundMessage::PromptName => "Please enter your name.".to_string(),
            OutboundMessage::PromptDob => {
                "Please enter your date of birth (YYYY-MM-DD).".to_string()
            }
            OutboundMessage::InvalidDob => "Invalid date format. Please use YYYY-MM-DD.".to_string(),
            OutboundMessage::AgeAnnouncement { age } => format!("Your age is {}.", age),
            OutboundMessage::PromptGender => {
                "Please select your gender: Male, Female, Other.".to_string()
            }
            OutboundMessage::RegistrationComplete => {
                "Registration complete! You can now start finding matches using /find_matches."
                    .to_string()
            }
            OutboundMessage::AlreadyRegistered => {
                "You are already registered. Use /find_matches to see people nearby.".to_string()
            }
            OutboundMessage::NotRegistering => {
                "Type /register to start your profile.".to_string()
            }
            OutboundMessage::RequestLocation => {
                "Please share your location so we can find matches near you.".to_string()
            }
            OutboundMessage::LocationSaved => "Your location has been saved.".to_string(),
            OutboundMessage::MatchList { matches } => matches
                .iter()
                .map(|m| format!("{}: {:.2} km away", m.name, m.distance_km))
                .collect::<Vec<_>>()
                .join("\n"),
            OutboundMessage::NoMatches { radius_km } => {
                format!("No matches found within {} km.", radius_km)
            }
            OutboundMessage::ShareLocationFirst => {
                "Please share your location first using /share_location.".to_string()
            }
            OutboundMessage::StorageFailure => {
                "Something went wrong on our side. Please try again.".to_string()
            }
        }
    }

    /// Whether the transport should attach a location request affordance
    pub fn requests_location(&self) -> bool {
        matches!(self, OutboundMessage::RequestLocation)
    }
}
