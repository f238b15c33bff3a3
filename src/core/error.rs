use thiserror::Error;

use crate::services::StoreError;

/// Failures surfaced by the core components
///
/// None of these are fatal to the process. The dispatcher turns each one into
/// a reply and leaves session state where it was.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed user input; the user is re-prompted
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A match request from a user without stored coordinates
    #[error("No location stored for user {0}")]
    MissingLocation(i64),

    /// Any storage read or write failure
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}
