use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, params};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{StoreError, ValidationError};
use crate::store::RecordStore;
use crate::{Database, FolderId, Record, RecordBuilder, RecordFields, RecordId, RecordKind};

const RECORD_COLUMNS: &str =
    "id, title, content, kind, completed, date, folder_id, created_at, updated_at";

/// Search terms shorter than this many characters are not remembered.
pub const MIN_SEARCH_TERM_CHARS: usize = 2;

/// Number of distinct search terms kept; older ones are dropped.
pub const SEARCH_HISTORY_CAPACITY: usize = 10;

/// SQLite-backed record store.
///
/// RecordService owns a Database instance and implements [`RecordStore`] on
/// top of it. It is UI-independent: the CLI and the tests drive the same
/// methods.
///
/// # Examples
///
/// ```
/// use tagloom::{Database, RecordFields, RecordService, RecordStore};
///
/// # fn main() -> anyhow::Result<()> {
/// let db = Database::in_memory()?;
/// let service = RecordService::new(db);
///
/// let record = service.create_record(RecordFields::new("My first note"))?;
/// assert!(record.id().get() > 0);
/// assert_eq!(service.list_records()?.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct RecordService {
    db: Database,
}

impl RecordService {
    /// Creates a new RecordService with the given database.
    ///
    /// Takes ownership of the database instance.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns a reference to the underlying database.
    ///
    /// Useful for testing or advanced operations that need direct database access.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Remembers a search term, moving it to the front if it was already
    /// there.
    ///
    /// The term is trimmed first. Returns `false` without writing when it is
    /// shorter than [`MIN_SEARCH_TERM_CHARS`]. Only the newest
    /// [`SEARCH_HISTORY_CAPACITY`] terms are kept.
    pub fn record_search(&self, term: &str) -> Result<bool, StoreError> {
        let term = term.trim();
        if term.chars().count() < MIN_SEARCH_TERM_CHARS {
            return Ok(false);
        }

        let tx = self.db.connection().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO search_history (term, seq, searched_at)
             VALUES (?1, (SELECT COALESCE(MAX(seq), 0) + 1 FROM search_history), ?2)
             ON CONFLICT(term) DO UPDATE
             SET seq = excluded.seq, searched_at = excluded.searched_at",
            params![term, to_millis(now_millis())],
        )?;
        let dropped = tx.execute(
            "DELETE FROM search_history
             WHERE term NOT IN (SELECT term FROM search_history ORDER BY seq DESC LIMIT ?1)",
            [SEARCH_HISTORY_CAPACITY as i64],
        )?;
        tx.commit()?;

        log::debug!("event=search_recorded dropped={}", dropped);
        Ok(true)
    }

    /// Up to `limit` remembered search terms, newest first.
    pub fn recent_searches(&self, limit: usize) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .db
            .connection()
            .prepare("SELECT term FROM search_history ORDER BY seq DESC LIMIT ?1")?;
        let rows = stmt.query_map([limit as i64], |row| row.get::<_, String>(0))?;

        let mut terms = Vec::new();
        for row_result in rows {
            terms.push(row_result?);
        }
        Ok(terms)
    }

    /// Tags for one record in entry order.
    fn load_tags(&self, record_id: i64) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.db.connection().prepare(
            "SELECT t.name
             FROM record_tags rt
             JOIN tags t ON t.id = rt.tag_id
             WHERE rt.record_id = ?1
             ORDER BY rt.position",
        )?;

        let rows = stmt.query_map([record_id], |row| row.get::<_, String>(0))?;
        let mut tags = Vec::new();
        for row_result in rows {
            tags.push(row_result?);
        }
        Ok(tags)
    }

    /// Tags for every record, keyed by record id, each list in entry order.
    fn load_all_tags(&self) -> Result<HashMap<i64, Vec<String>>, StoreError> {
        let mut stmt = self.db.connection().prepare(
            "SELECT rt.record_id, t.name
             FROM record_tags rt
             JOIN tags t ON t.id = rt.tag_id
             ORDER BY rt.record_id, rt.position",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut by_record: HashMap<i64, Vec<String>> = HashMap::new();
        for row_result in rows {
            let (record_id, name) = row_result?;
            by_record.entry(record_id).or_default().push(name);
        }
        Ok(by_record)
    }
}

impl RecordStore for RecordService {
    fn list_records(&self) -> Result<Vec<Record>, StoreError> {
        let mut tags = self.load_all_tags()?;

        let conn = self.db.connection();
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM records ORDER BY updated_at DESC, id DESC"
        ))?;
        let rows = stmt.query_map([], RecordRow::from_row)?;

        let mut records = Vec::new();
        for row_result in rows {
            let row = row_result?;
            let record_tags = tags.remove(&row.id).unwrap_or_default();
            records.push(row.into_record(record_tags)?);
        }

        log::debug!("event=records_listed count={}", records.len());
        Ok(records)
    }

    fn get_record(&self, id: RecordId) -> Result<Record, StoreError> {
        let row = self
            .db
            .connection()
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1"),
                [id.get()],
                RecordRow::from_row,
            )
            .optional()?;

        let Some(row) = row else {
            return Err(StoreError::NotFound(id));
        };

        let tags = self.load_tags(row.id)?;
        row.into_record(tags)
    }

    fn create_record(&self, fields: RecordFields) -> Result<Record, StoreError> {
        let fields = fields.validate()?;
        let date = fields.date.map(encode_date).transpose()?;
        let now = now_millis();

        let tx = self.db.connection().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO records
                 (title, content, kind, completed, date, folder_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                fields.title,
                fields.content,
                fields.kind.as_str(),
                fields.completed,
                date,
                fields.folder_id.as_ref().map(FolderId::as_str),
                to_millis(now),
            ],
        )?;
        let id = tx.last_insert_rowid();
        write_tags(&tx, id, &fields.tags)?;
        tx.commit()?;

        log::info!(
            "event=record_created id={} kind={} tags={}",
            id,
            fields.kind,
            fields.tags.len()
        );

        Ok(RecordBuilder::new()
            .id(RecordId::new(id))
            .title(fields.title)
            .content(fields.content)
            .kind(fields.kind)
            .completed(fields.completed)
            .date(fields.date)
            .tags(fields.tags)
            .folder_id(fields.folder_id)
            .created_at(now)
            .updated_at(now)
            .build())
    }

    fn update_record(&self, id: RecordId, fields: RecordFields) -> Result<Record, StoreError> {
        let fields = fields.validate()?;
        let date = fields.date.map(encode_date).transpose()?;
        let now = now_millis();

        let tx = self.db.connection().unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE records
             SET title = ?1, content = ?2, kind = ?3, completed = ?4,
                 date = ?5, folder_id = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                fields.title,
                fields.content,
                fields.kind.as_str(),
                fields.completed,
                date,
                fields.folder_id.as_ref().map(FolderId::as_str),
                to_millis(now),
                id.get(),
            ],
        )?;
        if changed == 0 {
            // Dropping the transaction rolls it back.
            return Err(StoreError::NotFound(id));
        }
        write_tags(&tx, id.get(), &fields.tags)?;
        prune_unused_tags(&tx)?;
        tx.commit()?;

        log::info!(
            "event=record_updated id={} kind={} tags={}",
            id,
            fields.kind,
            fields.tags.len()
        );

        self.get_record(id)
    }

    fn delete_record(&self, id: RecordId) -> Result<(), StoreError> {
        let tx = self.db.connection().unchecked_transaction()?;
        let changed = tx.execute("DELETE FROM records WHERE id = ?1", [id.get()])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        prune_unused_tags(&tx)?;
        tx.commit()?;

        log::info!("event=record_deleted id={}", id);
        Ok(())
    }
}

/// Raw column values of one `records` row.
struct RecordRow {
    id: i64,
    title: String,
    content: String,
    kind: String,
    completed: bool,
    date: Option<String>,
    folder_id: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl RecordRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            kind: row.get(3)?,
            completed: row.get(4)?,
            date: row.get(5)?,
            folder_id: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    fn into_record(self, tags: Vec<String>) -> Result<Record, StoreError> {
        let kind: RecordKind = self
            .kind
            .parse()
            .map_err(|e: crate::ParseKindError| StoreError::Corrupt(e.to_string()))?;
        let date = self.date.as_deref().map(decode_date).transpose()?;

        Ok(RecordBuilder::new()
            .id(RecordId::new(self.id))
            .title(self.title)
            .content(self.content)
            .kind(kind)
            .completed(self.completed)
            .date(date)
            .tags(tags)
            .folder_id(self.folder_id.map(FolderId::new))
            .created_at(from_millis(self.created_at)?)
            .updated_at(from_millis(self.updated_at)?)
            .build())
    }
}

/// Replaces the tag links of a record, creating missing tags.
fn write_tags(conn: &Connection, record_id: i64, tags: &[String]) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM record_tags WHERE record_id = ?1", [record_id])?;

    for (position, name) in tags.iter().enumerate() {
        conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", [name])?;
        let tag_id: i64 =
            conn.query_row("SELECT id FROM tags WHERE name = ?1", [name], |row| row.get(0))?;
        conn.execute(
            "INSERT INTO record_tags (record_id, tag_id, position) VALUES (?1, ?2, ?3)",
            params![record_id, tag_id, position as i64],
        )?;
    }
    Ok(())
}

/// Removes tags no record refers to any more.
fn prune_unused_tags(conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM tags WHERE id NOT IN (SELECT tag_id FROM record_tags)",
        [],
    )
}

/// Current time truncated to the millisecond precision the store keeps.
fn now_millis() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(now.nanosecond() / 1_000_000 * 1_000_000)
        .unwrap_or(now)
}

fn to_millis(instant: OffsetDateTime) -> i64 {
    (instant.unix_timestamp_nanos() / 1_000_000) as i64
}

fn from_millis(millis: i64) -> Result<OffsetDateTime, StoreError> {
    Ok(OffsetDateTime::from_unix_timestamp_nanos(
        i128::from(millis) * 1_000_000,
    )?)
}

fn encode_date(date: OffsetDateTime) -> Result<String, StoreError> {
    date.format(&Rfc3339)
        .map_err(|_| ValidationError::MalformedDate(date.to_string()).into())
}

fn decode_date(text: &str) -> Result<OffsetDateTime, StoreError> {
    OffsetDateTime::parse(text, &Rfc3339)
        .map_err(|e| StoreError::Corrupt(format!("date '{text}': {e}")))
}
