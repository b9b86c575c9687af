//! Filter/sort stage for record views.
//!
//! Every view (notes list, tasks list, search, calendar, graph) narrows the
//! same flat record list through one parametrized [`RecordQuery`]. The query
//! is an explicit value passed in by the caller; there is no shared view
//! state. Filtering never fails and never mutates its input: unmatched
//! filters simply produce an empty list.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{FolderId, Record, RecordKind};

/// How a tag filter combines multiple tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagMatch {
    /// Keep records carrying at least one of the tags.
    #[default]
    Any,
    /// Keep records carrying every one of the tags.
    All,
}

/// Which timestamp a date range is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateField {
    /// The record's scheduled date. Unscheduled records never match a range.
    #[default]
    Scheduled,
    /// The record's creation timestamp.
    Created,
}

/// Inclusive date range; a missing bound leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    /// Earliest accepted instant.
    #[serde(with = "time::serde::rfc3339::option")]
    pub start: Option<OffsetDateTime>,
    /// Latest accepted instant.
    #[serde(with = "time::serde::rfc3339::option")]
    pub end: Option<OffsetDateTime>,
}

impl DateRange {
    /// Creates a range from optional bounds.
    pub fn new(start: Option<OffsetDateTime>, end: Option<OffsetDateTime>) -> Self {
        Self { start, end }
    }

    /// Returns true if neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Returns true if `instant` lies within the inclusive bounds.
    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start.is_none_or(|start| instant >= start) && self.end.is_none_or(|end| instant <= end)
    }
}

/// Ordering applied after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Case-insensitive by title, A to Z.
    Title,
    /// Newest created first.
    CreatedAt,
    /// Most recently updated first.
    #[default]
    UpdatedAt,
    /// Earliest scheduled first, unscheduled last.
    Date,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Title => "title",
            Self::CreatedAt => "created",
            Self::UpdatedAt => "updated",
            Self::Date => "date",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing an unknown sort key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key '{0}' (expected title, created, updated, or date)")]
pub struct ParseSortKeyError(pub String);

impl FromStr for SortKey {
    type Err = ParseSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "created" | "created_at" => Ok(Self::CreatedAt),
            "updated" | "updated_at" => Ok(Self::UpdatedAt),
            "date" | "due" => Ok(Self::Date),
            _ => Err(ParseSortKeyError(s.to_string())),
        }
    }
}

/// View configuration threaded through every filter/sort call.
///
/// All fields default to "no constraint", so `RecordQuery::default()` keeps
/// every record and orders by most recently updated.
///
/// # Examples
///
/// ```
/// use tagloom::{RecordQuery, RecordKind, SortKey, TagMatch};
///
/// let query = RecordQuery {
///     kind: Some(RecordKind::Task),
///     tags: vec!["work".to_string()],
///     tag_match: TagMatch::Any,
///     sort: SortKey::Date,
///     ..Default::default()
/// };
/// assert!(query.search.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordQuery {
    /// Keep only this kind.
    pub kind: Option<RecordKind>,
    /// Keep only records in this folder.
    pub folder: Option<FolderId>,
    /// Tags to match. Empty means no tag constraint.
    pub tags: Vec<String>,
    /// How `tags` combine.
    pub tag_match: TagMatch,
    /// Inclusive date bounds.
    pub date_range: Option<DateRange>,
    /// Timestamp the date range applies to.
    pub date_field: DateField,
    /// Case-insensitive substring over title, content, and tags.
    pub search: Option<String>,
    /// Drop completed tasks.
    pub hide_completed: bool,
    /// Result ordering.
    pub sort: SortKey,
}

impl RecordQuery {
    /// Configuration used by the notes and tasks list views.
    ///
    /// Tags match ANY, date ranges apply to the scheduled date.
    pub fn list_view() -> Self {
        Self {
            tag_match: TagMatch::Any,
            date_field: DateField::Scheduled,
            ..Default::default()
        }
    }

    /// Configuration used by the graph view.
    ///
    /// Tags match ALL, date ranges apply to the creation time.
    pub fn graph_view() -> Self {
        Self {
            tag_match: TagMatch::All,
            date_field: DateField::Created,
            ..Default::default()
        }
    }

    /// Configuration used by free-text search.
    pub fn search_view(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            ..Self::list_view()
        }
    }

    /// Returns true if `record` passes every configured filter.
    pub fn matches(&self, record: &Record) -> bool {
        self.matches_kind(record)
            && self.matches_folder(record)
            && self.matches_completion(record)
            && self.matches_tags(record)
            && self.matches_date(record)
            && self.matches_search(record, self.normalized_search().as_deref())
    }

    fn matches_kind(&self, record: &Record) -> bool {
        self.kind.is_none_or(|kind| record.kind() == kind)
    }

    fn matches_folder(&self, record: &Record) -> bool {
        match &self.folder {
            Some(folder) => record.folder_id() == Some(folder),
            None => true,
        }
    }

    fn matches_completion(&self, record: &Record) -> bool {
        !(self.hide_completed && record.completed())
    }

    fn matches_tags(&self, record: &Record) -> bool {
        let wanted: Vec<&str> = self
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if wanted.is_empty() {
            return true;
        }

        match self.tag_match {
            TagMatch::Any => wanted.iter().any(|tag| record.has_tag(tag)),
            TagMatch::All => wanted.iter().all(|tag| record.has_tag(tag)),
        }
    }

    fn matches_date(&self, record: &Record) -> bool {
        let Some(range) = self.date_range.filter(|r| !r.is_unbounded()) else {
            return true;
        };

        let instant = match self.date_field {
            DateField::Scheduled => record.date(),
            DateField::Created => Some(record.created_at()),
        };

        instant.is_some_and(|at| range.contains(at))
    }

    fn matches_search(&self, record: &Record, needle: Option<&str>) -> bool {
        let Some(needle) = needle else {
            return true;
        };

        record.title().to_lowercase().contains(needle)
            || record.content().to_lowercase().contains(needle)
            || record
                .tags()
                .iter()
                .any(|tag| tag.to_lowercase().contains(needle))
    }

    /// Lowercased search text, or `None` when blank.
    fn normalized_search(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

/// Returns the records that pass `query`, in input order.
pub fn filter_records(records: &[Record], query: &RecordQuery) -> Vec<Record> {
    let needle = query.normalized_search();
    records
        .iter()
        .filter(|record| {
            query.matches_kind(record)
                && query.matches_folder(record)
                && query.matches_completion(record)
                && query.matches_tags(record)
                && query.matches_date(record)
                && query.matches_search(record, needle.as_deref())
        })
        .cloned()
        .collect()
}

/// Sorts records in place by `key`. The sort is stable.
pub fn sort_records(records: &mut [Record], key: SortKey) {
    records.sort_by(|a, b| compare(a, b, key));
}

/// Filters then sorts, leaving `records` untouched.
///
/// # Examples
///
/// ```
/// use tagloom::{RecordBuilder, RecordId, RecordQuery, SortKey, apply};
///
/// let records = vec![
///     RecordBuilder::new().id(RecordId::new(1)).title("Banana").build(),
///     RecordBuilder::new().id(RecordId::new(2)).title("apple").build(),
/// ];
/// let query = RecordQuery { sort: SortKey::Title, ..Default::default() };
///
/// let sorted = apply(&records, &query);
/// assert_eq!(sorted[0].title(), "apple");
/// assert_eq!(records[0].title(), "Banana");
/// ```
pub fn apply(records: &[Record], query: &RecordQuery) -> Vec<Record> {
    let mut result = filter_records(records, query);
    sort_records(&mut result, query.sort);
    log::debug!(
        "event=query_applied input={} output={} sort={}",
        records.len(),
        result.len(),
        query.sort
    );
    result
}

fn compare(a: &Record, b: &Record, key: SortKey) -> Ordering {
    match key {
        SortKey::Title => a
            .title()
            .to_lowercase()
            .cmp(&b.title().to_lowercase())
            .then_with(|| a.title().cmp(b.title()))
            .then_with(|| a.id().cmp(&b.id())),
        SortKey::CreatedAt => b.created_at().cmp(&a.created_at()),
        SortKey::UpdatedAt => b.updated_at().cmp(&a.updated_at()),
        SortKey::Date => match (a.date(), b.date()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    }
}
