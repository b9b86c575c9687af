use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use super::{FolderId, Record, RecordKind};
use crate::error::ValidationError;
use crate::tags::TagNormalizer;

/// Client-supplied fields for creating or replacing a record.
///
/// The store owns `id`, `created_at`, and `updated_at`; everything else comes
/// from here. An update replaces all fields, so edits usually start from
/// [`RecordFields::from_record`].
///
/// # Examples
///
/// ```
/// use tagloom::{RecordFields, RecordKind};
///
/// let fields = RecordFields::new("Pay rent")
///     .kind(RecordKind::Task)
///     .tags(["home", "money"]);
///
/// let valid = fields.validate().unwrap();
/// assert_eq!(valid.title, "Pay rent");
/// assert_eq!(valid.tags, vec!["home", "money"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordFields {
    /// Title shown in every view. Required.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Note or task.
    pub kind: RecordKind,
    /// Completion flag, only honoured for tasks.
    pub completed: bool,
    /// Scheduled date; `None` leaves the record unscheduled.
    pub date: Option<OffsetDateTime>,
    /// Tags in entry order.
    pub tags: Vec<String>,
    /// Owning folder.
    pub folder_id: Option<FolderId>,
}

impl RecordFields {
    /// Creates fields for a note with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Seeds fields from an existing record, for read-modify-write edits.
    pub fn from_record(record: &Record) -> Self {
        Self {
            title: record.title().to_string(),
            content: record.content().to_string(),
            kind: record.kind(),
            completed: record.completed(),
            date: record.date(),
            tags: record.tags().to_vec(),
            folder_id: record.folder_id().cloned(),
        }
    }

    /// Sets the body text.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Sets the record kind.
    pub fn kind(mut self, kind: RecordKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the completion flag.
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
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the folder.
    pub fn folder(mut self, folder_id: Option<FolderId>) -> Self {
        self.folder_id = folder_id;
        self
    }

    /// Validates and normalizes the fields for storage.
    ///
    /// Trims the title, normalizes tags, and clears `completed` for notes.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyTitle`] if the title is blank.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        let completed = self.kind == RecordKind::Task && self.completed;
        let folder_id = self.folder_id.filter(|f| !f.as_str().trim().is_empty());

        Ok(Self {
            title,
            content: self.content,
            kind: self.kind,
            completed,
            date: self.date,
            tags: TagNormalizer::normalize_tags(self.tags),
            folder_id,
        })
    }
}

/// Parses a user-supplied date.
///
/// Accepts a full RFC 3339 timestamp or a plain `YYYY-MM-DD` day, which is
/// taken as midnight UTC.
///
/// # Errors
///
/// Returns [`ValidationError::MalformedDate`] for anything else.
///
/// # Examples
///
/// ```
/// use tagloom::parse_date;
///
/// let day = parse_date("2024-05-01").unwrap();
/// assert_eq!(day.hour(), 0);
/// assert!(parse_date("next tuesday").is_err());
/// ```
pub fn parse_date(input: &str) -> Result<OffsetDateTime, ValidationError> {
    let trimmed = input.trim();

    if let Ok(timestamp) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(timestamp);
    }

    Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
        .map(|day| day.midnight().assume_utc())
        .map_err(|_| ValidationError::MalformedDate(input.to_string()))
}
