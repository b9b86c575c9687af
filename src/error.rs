//! Error taxonomy for record validation and the record store.

use thiserror::Error;

use crate::RecordId;

/// Problems detected in user input before the store is called.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Title is empty or whitespace-only.
    #[error("Record title cannot be empty")]
    EmptyTitle,

    /// Date input is neither RFC 3339 nor `YYYY-MM-DD`.
    #[error("Malformed date '{0}' (expected YYYY-MM-DD or RFC 3339)")]
    MalformedDate(String),

    /// Completion was requested for a record that is not a task.
    #[error("Only tasks can be marked completed")]
    CompletedNote,
}

/// Errors surfaced by a [`RecordStore`](crate::RecordStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The submitted fields failed validation; nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No record exists with the given id.
    #[error("Record {0} not found")]
    NotFound(RecordId),

    /// The backing store could not be reached or rejected the request.
    #[error("Record store unavailable: {0}")]
    Unavailable(#[source] rusqlite::Error),

    /// A stored value could not be decoded into a record.
    #[error("Corrupt record data: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Returns true when retrying the same request may succeed.
    ///
    /// Only transport-level failures qualify; validation and not-found
    /// errors will fail again until the input changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Returns true for errors caused by the caller's input rather than the store.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Unavailable(err)
    }
}

impl From<time::error::ComponentRange> for StoreError {
    fn from(err: time::error::ComponentRange) -> Self {
        Self::Corrupt(err.to_string())
    }
}
