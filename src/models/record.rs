use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{FolderId, RecordId, RecordKind};
use crate::error::ValidationError;
use crate::tags::TagNormalizer;

/// A note or task as held by the record store.
///
/// Records are the single persisted entity. Notes and tasks share one shape
/// and are told apart by [`RecordKind`]; only tasks carry a meaningful
/// `completed` flag.
///
/// Deserializing goes through the same normalization as [`RecordBuilder`]
/// and rejects a blank title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordData")]
pub struct Record {
    id: RecordId,
    title: String,
    content: String,
    kind: RecordKind,
    completed: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    date: Option<OffsetDateTime>,
    tags: Vec<String>,
    folder_id: Option<FolderId>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

/// Wire form of a [`Record`], before normalization.
#[derive(Deserialize)]
struct RecordData {
    id: RecordId,
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    kind: RecordKind,
    #[serde(default)]
    completed: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    date: Option<OffsetDateTime>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    folder_id: Option<FolderId>,
    #[serde(with = "time::serde::rfc3339")]
    created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl TryFrom<RecordData> for Record {
    type Error = ValidationError;

    fn try_from(data: RecordData) -> Result<Self, Self::Error> {
        if data.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        Ok(RecordBuilder::new()
            .id(data.id)
            .title(data.title)
            .content(data.content)
            .kind(data.kind)
            .completed(data.completed)
            .date(data.date)
            .tags(data.tags)
            .folder_id(data.folder_id)
            .created_at(data.created_at)
            .updated_at(data.updated_at)
            .build())
    }
}

impl Record {
    /// Returns the record's unique identifier.
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Returns the record's title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the record's body text (empty when absent).
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns whether this is a note or a task.
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Returns true when this is a completed task.
    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Returns the scheduled date, or `None` when unscheduled.
    pub fn date(&self) -> Option<OffsetDateTime> {
        self.date
    }

    /// Returns the tags in the order the user entered them.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the folder this record belongs to, if any.
    pub fn folder_id(&self) -> Option<&FolderId> {
        self.folder_id.as_ref()
    }

    /// Returns when the record was created.
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Returns when the record was last updated.
    pub fn updated_at(&self) -> OffsetDateTime {
        self.updated_at
    }

    /// Returns true if the record carries exactly this tag.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Returns true for task records.
    pub fn is_task(&self) -> bool {
        self.kind == RecordKind::Task
    }
}

/// Builder for constructing `Record` instances with optional fields.
///
/// Tags are normalized and `completed` is cleared for notes on `build`, so a
/// built record always satisfies the record invariants.
///
/// # Examples
///
/// ```
/// use tagloom::{RecordBuilder, RecordId, RecordKind};
///
/// let record = RecordBuilder::new()
///     .id(RecordId::new(1))
///     .title("Write report")
///     .kind(RecordKind::Task)
///     .tags(vec!["work".to_string(), " work".to_string()])
///     .build();
///
/// assert_eq!(record.id(), RecordId::new(1));
/// assert_eq!(record.tags(), &["work"]);
/// ```
#[derive(Debug, Default)]
pub struct RecordBuilder {
    id: Option<RecordId>,
    title: Option<String>,
    content: Option<String>,
    kind: Option<RecordKind>,
    completed: bool,
    date: Option<OffsetDateTime>,
    tags: Option<Vec<String>>,
    folder_id: Option<FolderId>,
    created_at: Option<OffsetDateTime>,
    updated_at: Option<OffsetDateTime>,
}

impl RecordBuilder {
    /// Creates a new `RecordBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the record ID.
    pub fn id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    /// Sets the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the body text.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the record kind.
    pub fn kind(mut self, kind: RecordKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Sets the completion flag. Ignored for notes.
    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// Sets the scheduled date.
    pub fn date(mut self, date: Option<OffsetDateTime>) -> Self {
        self.date = date;
        self
    }

    /// Sets the tags.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Sets the folder.
    pub fn folder_id(mut self, folder_id: Option<FolderId>) -> Self {
        self.folder_id = folder_id;
        self
    }

    /// Sets the created timestamp.
    pub fn created_at(mut self, created_at: OffsetDateTime) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Sets the updated timestamp.
    pub fn updated_at(mut self, updated_at: OffsetDateTime) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Builds the `Record`, using defaults for optional fields.
    ///
    /// # Panics
    ///
    /// Panics if `id` or `title` have not been set.
    pub fn build(self) -> Record {
        let now = OffsetDateTime::now_utc();
        let kind = self.kind.unwrap_or_default();
        let created_at = self.created_at.unwrap_or(now);
        Record {
            id: self.id.expect("id is required"),
            title: self.title.expect("title is required"),
            content: self.content.unwrap_or_default(),
            kind,
            completed: kind == RecordKind::Task && self.completed,
            date: self.date,
            tags: TagNormalizer::normalize_tags(self.tags.unwrap_or_default()),
            folder_id: self.folder_id,
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
        }
    }
}
