use chrono::{NaiveDate, Utc};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::core::error::CoreError;
use crate::models::{OutboundMessage, ProfileUpdate, UserId};
use crate::services::ProfileStore;

/// Accepted date of birth format
pub const DOB_FORMAT: &str = "%Y-%m-%d";

/// State of an open registration session
///
/// A user with no entry in the session store is idle. The session is removed
/// once the final write succeeds, which is the complete state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationState {
    AwaitingName,
    AwaitingDob { name: String },
    AwaitingGender { name: String, dob: NaiveDate },
}

impl RegistrationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationState::AwaitingName => "awaiting_name",
            RegistrationState::AwaitingDob { .. } => "awaiting_dob",
            RegistrationState::AwaitingGender { .. } => "awaiting_gender",
        }
    }
}

/// Parse a date of birth, rejecting malformed and future dates
pub fn parse_dob(text: &str, today: NaiveDate) -> Result<NaiveDate, CoreError> {
    let dob = NaiveDate::parse_from_str(text.trim(), DOB_FORMAT)
        .map_err(|e| CoreError::Validation(format!("`{}` is not a YYYY-MM-DD date: {}", text, e)))?;

    if dob > today {
        return Err(CoreError::Validation(format!(
            "date of birth {} is in the future",
            dob
        )));
    }

    Ok(dob)
}

/// Age in whole years as `floor(days_since_birth / 365)`
///
/// Leap days are ignored, so the result can run ahead of the calendar age by
/// a few days around birthdays.
pub fn age_in_years(dob: NaiveDate, today: NaiveDate) -> i64 {
    (today - dob).num_days().div_euclid(365)
}

/// Drives the multi-turn registration conversation
///
/// Sessions are keyed strictly by user id, so interleaved registrations of
/// different users never see each other's data. The profile store is written
/// exactly once per registration, on the last step.
pub struct ConversationStateMachine {
    store: Arc<dyn ProfileStore>,
    sessions: Cache<UserId, RegistrationState>,
    today: fn() -> NaiveDate,
}

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

impl ConversationStateMachine {
    /// Create a state machine with an empty session store
    ///
    /// The store has no size bound: a session only leaves it on completion or,
    /// with `idle_timeout` set, after that long without activity.
    pub fn new(store: Arc<dyn ProfileStore>, idle_timeout: Option<Duration>) -> Self {
        let mut builder = Cache::builder();
        if let Some(idle) = idle_timeout {
            builder = builder.time_to_idle(idle);
        }

        Self {
            store,
            sessions: builder.build(),
            today: utc_today,
        }
    }

    /// Replace the clock used for age computation
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Current session state, or `None` when the user is idle
    pub async fn state(&self, user_id: UserId) -> Option<RegistrationState> {
        self.sessions.get(&user_id).await
    }

    /// Whether the user is in the middle of registering
    pub fn has_session(&self, user_id: UserId) -> bool {
        self.sessions.contains_key(&user_id)
    }

    /// Handle a register command
    ///
    /// Users who already completed registration are turned away. A register
    /// command during an open session starts over.
    pub async fn begin(&self, user_id: UserId) -> Result<Vec<OutboundMessage>, CoreError> {
        if let Some(profile) = self.store.get(user_id).await? {
            if profile.is_registered() {
                tracing::info!(user_id, "Registration refused, profile already complete");
                return Ok(vec![OutboundMessage::AlreadyRegistered]);
            }
        }

        if self.has_session(user_id) {
            tracing::debug!(user_id, "Restarting open registration session");
        }

        self.sessions
            .insert(user_id, RegistrationState::AwaitingName)
            .await;

        tracing::info!(user_id, "Registration started");
        Ok(vec![OutboundMessage::PromptName])
    }

    /// Feed one text message into the user's session
    ///
    /// Returns `Ok(None)` when the user has no open session. On error the
    /// session keeps its current state so the same step can be retried.
    pub async fn handle_text(
        &self,
        user_id: UserId,
        text: &str,
    ) -> Result<Option<Vec<OutboundMessage>>, CoreError> {
        let Some(state) = self.sessions.get(&user_id).await else {
            return Ok(None);
        };

        let from = state.as_str();
        let (next, replies) = self.step(user_id, state, text).await?;

        match next {
            Some(next) => {
                tracing::debug!(user_id, from, to = next.as_str(), "Registration advanced");
                self.sessions.insert(user_id, next).await;
            }
            None => {
                tracing::info!(user_id, "Registration complete");
                self.sessions.invalidate(&user_id).await;
            }
        }

        Ok(Some(replies))
    }

    /// Single transition function: one handler per state
    async fn step(
        &self,
        user_id: UserId,
        state: RegistrationState,
        text: &str,
    ) -> Result<(Option<RegistrationState>, Vec<OutboundMessage>), CoreError> {
        match state {
            RegistrationState::AwaitingName => Ok((
                Some(RegistrationState::AwaitingDob {
                    name: text.to_string(),
                }),
                vec![OutboundMessage::PromptDob],
            )),
            RegistrationState::AwaitingDob { name } => {
                let today = (self.today)();
                let dob = parse_dob(text, today)?;
                let age = age_in_years(dob, today);

                Ok((
                    Some(RegistrationState::AwaitingGender { name, dob }),
                    vec![
                        OutboundMessage::AgeAnnouncement { age },
                        OutboundMessage::PromptGender,
                    ],
                ))
            }
            RegistrationState::AwaitingGender { name, dob } => {
                let gender = text.to_lowercase();
                self.store
                    .upsert(user_id, &ProfileUpdate::registration(name, dob, gender))
                    .await?;

                Ok((None, vec![OutboundMessage::RegistrationComplete]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, UserProfile};
    use crate::services::{InMemoryProfileStore, StoreError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    /// Store wrapper that counts writes and can be switched to fail
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryProfileStore,
        writes: AtomicUsize,
        fail_writes: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl ProfileStore for RecordingStore {
        async fn upsert(&self, user_id: UserId, update: &ProfileUpdate) -> Result<(), StoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("connection refused".to_string()));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.upsert(user_id, update).await
        }

        async fn get(&self, user_id: UserId) -> Result<Option<UserProfile>, StoreError> {
            self.inner.get(user_id).await
        }

        async fn list_others_with_location(
            &self,
            user_id: UserId,
        ) -> Result<Vec<UserProfile>, StoreError> {
            self.inner.list_others_with_location(user_id).await
        }

        async fn health_check(&self) -> Result<bool, StoreError> {
            Ok(true)
        }
    }

    fn machine(store: Arc<RecordingStore>) -> ConversationStateMachine {
        ConversationStateMachine::new(store, None).with_today(fixed_today)
    }

    #[test]
    fn test_age_uses_365_day_years() {
        let today = fixed_today();
        let dob = today - chrono::Duration::days(30 * 365);
        assert_eq!(age_in_years(dob, today), 30);
        assert_eq!(age_in_years(dob + chrono::Duration::days(1), today), 29);
    }

    #[test]
    fn test_parse_dob_rejects_bad_and_future_dates() {
        let today = fixed_today();
        assert!(parse_dob("1990-02-30", today).is_err());
        assert!(parse_dob("01/02/1990", today).is_err());
        assert!(parse_dob("2030-01-01", today).is_err());
        assert_eq!(
            parse_dob(" 1990-01-01 ", today).unwrap(),
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap()
        );
    }

    #[tokio::test]
    async fn test_full_registration_writes_once() {
        let store = Arc::new(RecordingStore::default());
        let sm = machine(store.clone());

        assert_eq!(sm.begin(1).await.unwrap(), vec![OutboundMessage::PromptName]);
        assert_eq!(
            sm.handle_text(1, "A").await.unwrap(),
            Some(vec![OutboundMessage::PromptDob])
        );
        assert_eq!(
            sm.handle_text(1, "1990-01-01").await.unwrap(),
            Some(vec![
                OutboundMessage::AgeAnnouncement { age: 34 },
                OutboundMessage::PromptGender
            ])
        );
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert_eq!(
            sm.handle_text(1, "Female").await.unwrap(),
            Some(vec![OutboundMessage::RegistrationComplete])
        );

        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
        let profile = store.get(1).await.unwrap().unwrap();
        assert_eq!(profile.name.as_deref(), Some("A"));
        assert_eq!(profile.dob, NaiveDate::from_ymd_opt(1990, 1, 1));
        assert_eq!(profile.gender.as_deref(), Some("female"));
        assert_eq!(profile.location, None);
        assert_eq!(sm.state(1).await, None);
    }

    #[tokio::test]
    async fn test_invalid_dob_keeps_state_and_skips_storage() {
        let store = Arc::new(RecordingStore::default());
        let sm = machine(store.clone());

        sm.begin(1).await.unwrap();
        sm.handle_text(1, "A").await.unwrap();
        let result = sm.handle_text(1, "not a date").await;

        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert_eq!(
            sm.state(1).await,
            Some(RegistrationState::AwaitingDob { name: "A".to_string() })
        );
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);

        // Retries are unlimited
        assert!(sm.handle_text(1, "still wrong").await.is_err());
        assert!(sm.handle_text(1, "1990-01-01").await.is_ok());
    }

    #[tokio::test]
    async fn test_storage_failure_keeps_awaiting_gender() {
        let store = Arc::new(RecordingStore::default());
        let sm = machine(store.clone());

        sm.begin(1).await.unwrap();
        sm.handle_text(1, "A").await.unwrap();
        sm.handle_text(1, "1990-01-01").await.unwrap();

        store.fail_writes.store(true, Ordering::SeqCst);
        let result = sm.handle_text(1, "male").await;
        assert!(matches!(result, Err(CoreError::Storage(_))));
        assert!(matches!(
            sm.state(1).await,
            Some(RegistrationState::AwaitingGender { .. })
        ));

        store.fail_writes.store(false, Ordering::SeqCst);
        assert_eq!(
            sm.handle_text(1, "male").await.unwrap(),
            Some(vec![OutboundMessage::RegistrationComplete])
        );
    }

    #[tokio::test]
    async fn test_interleaved_sessions_are_isolated() {
        let store = Arc::new(RecordingStore::default());
        let sm = machine(store.clone());

        sm.begin(1).await.unwrap();
        sm.begin(2).await.unwrap();
        sm.handle_text(1, "Alice").await.unwrap();
        sm.handle_text(2, "Bob").await.unwrap();
        sm.handle_text(2, "1985-05-05").await.unwrap();
        sm.handle_text(1, "1992-02-02").await.unwrap();
        sm.handle_text(2, "male").await.unwrap();
        sm.handle_text(1, "female").await.unwrap();

        let alice = store.get(1).await.unwrap().unwrap();
        let bob = store.get(2).await.unwrap().unwrap();
        assert_eq!(alice.name.as_deref(), Some("Alice"));
        assert_eq!(alice.gender.as_deref(), Some("female"));
        assert_eq!(bob.name.as_deref(), Some("Bob"));
        assert_eq!(bob.dob, NaiveDate::from_ymd_opt(1985, 5, 5));
    }

    #[tokio::test]
    async fn test_text_without_session_is_not_handled() {
        let store = Arc::new(RecordingStore::default());
        let sm = machine(store);
        assert_eq!(sm.handle_text(9, "hello").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_completed_profile_cannot_register_again() {
        let store = Arc::new(RecordingStore::default());
        store
            .upsert(
                1,
                &ProfileUpdate::registration(
                    "A".to_string(),
                    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                    "female".to_string(),
                ),
            )
            .await
            .unwrap();
        let sm = machine(store);

        assert_eq!(sm.begin(1).await.unwrap(), vec![OutboundMessage::AlreadyRegistered]);
        assert!(!sm.has_session(1));
    }

    #[tokio::test]
    async fn test_location_only_profile_can_register() {
        let store = Arc::new(RecordingStore::default());
        store
            .upsert(1, &ProfileUpdate::location(Coordinates::new(1.0, 1.0)))
            .await
            .unwrap();
        let sm = machine(store);

        assert_eq!(sm.begin(1).await.unwrap(), vec![OutboundMessage::PromptName]);
    }

    #[tokio::test]
    async fn test_register_restarts_open_session() {
        let store = Arc::new(RecordingStore::default());
        let sm = machine(store);

        sm.begin(1).await.unwrap();
        sm.handle_text(1, "A").await.unwrap();
        sm.begin(1).await.unwrap();

        assert_eq!(sm.state(1).await, Some(RegistrationState::AwaitingName));
    }

    #[tokio::test]
    async fn test_many_open_sessions_all_survive() {
        let store = Arc::new(RecordingStore::default());
        let sm = machine(store);

        for user_id in 1..=5_000 {
            assert_eq!(
                sm.begin(user_id).await.unwrap(),
                vec![OutboundMessage::PromptName]
            );
        }
        sm.sessions.run_pending_tasks().await;

        for user_id in 1..=5_000 {
            assert_eq!(
                sm.handle_text(user_id, "A").await.unwrap(),
                Some(vec![OutboundMessage::PromptDob]),
                "session for user {} was dropped",
                user_id
            );
        }
    }
}
