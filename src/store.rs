//! The record store seam.
//!
//! Views only ever see records through this trait. Each call is an
//! independent request/response: there is no retry, no caching across calls,
//! and no concurrency token. Two concurrent saves of one record resolve as
//! last-write-wins.

use crate::error::{StoreError, ValidationError};
use crate::{Record, RecordFields, RecordId};

/// CRUD access to persisted records.
pub trait RecordStore {
    /// Returns every record, most recently updated first.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unavailable`] when the backend cannot be read.
    fn list_records(&self) -> Result<Vec<Record>, StoreError>;

    /// Returns one record.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no record has this id.
    fn get_record(&self, id: RecordId) -> Result<Record, StoreError>;

    /// Validates `fields` and stores them as a new record.
    ///
    /// The store assigns the id and both timestamps.
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] for invalid fields; nothing is written.
    fn create_record(&self, fields: RecordFields) -> Result<Record, StoreError>;

    /// Replaces every user field of an existing record and refreshes `updated_at`.
    ///
    /// # Errors
    ///
    /// [`StoreError::Validation`] for invalid fields, [`StoreError::NotFound`]
    /// for an unknown id.
    fn update_record(&self, id: RecordId, fields: RecordFields) -> Result<Record, StoreError>;

    /// Deletes a record.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the record is already absent.
    fn delete_record(&self, id: RecordId) -> Result<(), StoreError>;

    /// Marks a task completed or reopens it.
    ///
    /// # Errors
    ///
    /// [`ValidationError::CompletedNote`] when completing a note, plus the
    /// errors of [`get_record`](Self::get_record) and
    /// [`update_record`](Self::update_record).
    fn set_completed(&self, id: RecordId, completed: bool) -> Result<Record, StoreError> {
        let record = self.get_record(id)?;
        if completed && !record.is_task() {
            return Err(ValidationError::CompletedNote.into());
        }
        self.update_record(id, RecordFields::from_record(&record).completed(completed))
    }
}
