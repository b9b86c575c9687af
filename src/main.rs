use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use time::format_description::well_known::Rfc3339;
use time::macros::time;
use time::{Month, OffsetDateTime};

use tagloom::calendar;
use tagloom::tags::TagNormalizer;
use tagloom::{
    Config, DateField, DateRange, Database, FolderId, GraphStats, LayoutConfig, Record,
    RecordFields, RecordId, RecordKind, RecordQuery, RecordService, RecordStore, SortKey,
    StoreError, TagMatch, ValidationError, apply, graph_view, parse_date,
};

/// tagloom - notes, tasks, and the tags that connect them
#[derive(Parser)]
#[command(name = "tagloom")]
#[command(about = "Organize notes and tasks and explore how their tags connect")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Add a new note or task
    Add(AddCommand),
    /// Edit an existing record
    Edit(EditCommand),
    /// Mark a task completed
    Done(IdArg),
    /// Reopen a completed task
    Undone(IdArg),
    /// Delete a record
    Delete(IdArg),
    /// List records
    List(ListCommand),
    /// Search titles, content, and tags
    Search(SearchCommand),
    /// Show records by day
    Calendar(CalendarCommand),
    /// Show the tag-overlap graph
    Graph(ListCommand),
    /// Show tag statistics
    Stats(StatsCommand),
}

#[derive(Args)]
struct IdArg {
    /// Record id
    id: i64,
}

/// Add a new record
#[derive(Args)]
struct AddCommand {
    /// The record's title
    #[arg(value_name = "TITLE")]
    title: String,

    /// Body text
    #[arg(short, long)]
    content: Option<String>,

    /// Create a task instead of a note
    #[arg(long)]
    task: bool,

    /// Comma-separated tags
    #[arg(short, long, value_name = "TAGS")]
    tags: Option<String>,

    /// Scheduled date (YYYY-MM-DD or RFC 3339)
    #[arg(short, long, value_name = "DATE")]
    date: Option<String>,

    /// Folder id
    #[arg(short, long)]
    folder: Option<String>,
}

/// Edit an existing record; omitted fields stay unchanged
#[derive(Args)]
struct EditCommand {
    /// Record id
    id: i64,

    /// New title
    #[arg(long)]
    title: Option<String>,

    /// New body text
    #[arg(short, long)]
    content: Option<String>,

    /// New kind (note or task)
    #[arg(short, long)]
    kind: Option<RecordKind>,

    /// Replace tags with this comma-separated list
    #[arg(short, long, value_name = "TAGS")]
    tags: Option<String>,

    /// New scheduled date
    #[arg(short, long, value_name = "DATE", conflicts_with = "clear_date")]
    date: Option<String>,

    /// Remove the scheduled date
    #[arg(long)]
    clear_date: bool,

    /// New folder id
    #[arg(short, long, conflicts_with = "clear_folder")]
    folder: Option<String>,

    /// Remove the folder
    #[arg(long)]
    clear_folder: bool,
}

/// Filter and sort options shared by list-like commands
#[derive(Args, Default)]
struct FilterArgs {
    /// Only this kind (note or task)
    #[arg(short, long)]
    kind: Option<RecordKind>,

    /// Only records in this folder
    #[arg(short, long)]
    folder: Option<String>,

    /// Comma-separated tags; records need at least one unless --all-tags
    #[arg(short, long, value_name = "TAGS")]
    tags: Option<String>,

    /// Require every tag in --tags
    #[arg(long)]
    all_tags: bool,

    /// Range start (inclusive)
    #[arg(long, value_name = "DATE")]
    from: Option<String>,

    /// Range end (inclusive; a plain day covers the whole day)
    #[arg(long, value_name = "DATE")]
    to: Option<String>,

    /// Apply --from/--to to the creation time instead of the scheduled date
    #[arg(long)]
    by_created: bool,

    /// Sort by title, created, updated, or date
    #[arg(short, long)]
    sort: Option<SortKey>,

    /// Hide completed tasks
    #[arg(long)]
    hide_completed: bool,
}

impl FilterArgs {
    /// Overlays the flags on a call-site preset.
    fn to_query(&self, base: RecordQuery) -> Result<RecordQuery> {
        let mut query = base;

        if let Some(kind) = self.kind {
            query.kind = Some(kind);
        }
        if let Some(folder) = &self.folder {
            query.folder = Some(FolderId::new(folder.trim()));
        }
        if let Some(tags) = &self.tags {
            query.tags = TagNormalizer::parse_list(tags);
        }
        if self.all_tags {
            query.tag_match = TagMatch::All;
        }
        if self.by_created {
            query.date_field = DateField::Created;
        }
        if self.from.is_some() || self.to.is_some() {
            let start = self.from.as_deref().map(parse_date).transpose()?;
            let end = self.to.as_deref().map(parse_range_end).transpose()?;
            query.date_range = Some(DateRange::new(start, end));
        }
        if let Some(sort) = self.sort {
            query.sort = sort;
        }
        query.hide_completed |= self.hide_completed;

        Ok(query)
    }
}

/// List records
#[derive(Args)]
struct ListCommand {
    #[command(flatten)]
    filter: FilterArgs,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

/// Search records
#[derive(Args)]
struct SearchCommand {
    /// Text to look for (case-insensitive)
    #[arg(required_unless_present = "history")]
    text: Option<String>,

    /// Show recent search terms instead of searching
    #[arg(long, conflicts_with = "text")]
    history: bool,

    #[command(flatten)]
    filter: FilterArgs,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

/// Calendar view
#[derive(Args)]
struct CalendarCommand {
    /// Month to show as YYYY-MM (defaults to the current month)
    #[arg(short, long, value_name = "YYYY-MM")]
    month: Option<String>,

    /// How many upcoming records to list
    #[arg(short, long, default_value_t = 5)]
    upcoming: usize,
}

/// Tag statistics
#[derive(Args)]
struct StatsCommand {
    /// How many popular tags to list
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

/// Recent search terms shown by `search --history`.
const RECENT_SEARCHES_SHOWN: usize = 5;

fn main() {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::from_env();

    if let Err(e) = tagloom::logging::init_logging(&config.log_level) {
        eprintln!("Warning: {e:#}");
    }

    let result =
        open_service(&config).and_then(|service| run(&cli.command, &service, &config));

    if let Err(e) = result {
        // Determine exit code based on error type
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        if e
            .downcast_ref::<StoreError>()
            .is_some_and(StoreError::is_retryable)
        {
            eprintln!("The record store may be temporarily unavailable; try again.");
        }
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are invalid input and unknown ids. Internal errors include
/// database failures and I/O errors.
fn is_user_error(error: &anyhow::Error) -> bool {
    if let Some(store_error) = error.downcast_ref::<StoreError>() {
        return store_error.is_user_error();
    }
    error.downcast_ref::<ValidationError>().is_some()
}

fn open_service(config: &Config) -> Result<RecordService> {
    let db_path = config.database_path()?;
    ensure_database_directory(&db_path)?;
    let db = Database::open(&db_path).context("Failed to open database")?;
    Ok(RecordService::new(db))
}

/// Ensures the parent directory of the database file exists.
fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    Ok(())
}

fn run(command: &Commands, service: &RecordService, config: &Config) -> Result<()> {
    match command {
        Commands::Add(cmd) => handle_add(cmd, service),
        Commands::Edit(cmd) => handle_edit(cmd, service),
        Commands::Done(arg) => handle_completion(arg.id, true, service),
        Commands::Undone(arg) => handle_completion(arg.id, false, service),
        Commands::Delete(arg) => handle_delete(arg.id, service),
        Commands::List(cmd) => {
            let query = cmd.filter.to_query(RecordQuery::list_view())?;
            print_records(&apply(&service.list_records()?, &query), cmd.json)
        }
        Commands::Search(cmd) => handle_search(cmd, service),
        Commands::Calendar(cmd) => handle_calendar(cmd, service),
        Commands::Graph(cmd) => handle_graph(cmd, service, config),
        Commands::Stats(cmd) => handle_stats(cmd, service),
    }
}

/// Handles the search command: records the term, then filters by it.
fn handle_search(cmd: &SearchCommand, service: &RecordService) -> Result<()> {
    let Some(text) = cmd.text.as_deref().filter(|_| !cmd.history) else {
        return print_search_history(service, cmd.json);
    };

    service.record_search(text)?;
    let query = cmd.filter.to_query(RecordQuery::search_view(text))?;
    let found = apply(&service.list_records()?, &query);
    if !cmd.json {
        println!("{} items found", found.len());
    }
    print_records(&found, cmd.json)
}

fn print_search_history(service: &RecordService, json: bool) -> Result<()> {
    let terms = service.recent_searches(RECENT_SEARCHES_SHOWN)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&terms)?);
    } else if terms.is_empty() {
        println!("No recent searches.");
    } else {
        println!("Recent searches");
        for term in &terms {
            println!("  {term}");
        }
    }
    Ok(())
}

/// Handles the add command by creating a new record.
fn handle_add(cmd: &AddCommand, store: &impl RecordStore) -> Result<()> {
    let fields = build_add_fields(cmd)?;
    let record = store
        .create_record(fields)
        .context("Failed to create record")?;

    print!("{} created (id: {})", kind_label(record.kind()), record.id());
    if !record.tags().is_empty() {
        print!(" with tags: {}", record.tags().join(", "));
    }
    println!();
    Ok(())
}

fn build_add_fields(cmd: &AddCommand) -> Result<RecordFields> {
    let kind = if cmd.task {
        RecordKind::Task
    } else {
        RecordKind::Note
    };

    Ok(RecordFields::new(cmd.title.as_str())
        .content(cmd.content.clone().unwrap_or_default())
        .kind(kind)
        .tags(cmd.tags.as_deref().map(TagNormalizer::parse_list).unwrap_or_default())
        .date(cmd.date.as_deref().map(parse_date).transpose()?)
        .folder(cmd.folder.as_deref().map(FolderId::new)))
}

/// Handles the edit command with a read-modify-write update.
fn handle_edit(cmd: &EditCommand, store: &impl RecordStore) -> Result<()> {
    let id = RecordId::new(cmd.id);
    let current = store.get_record(id)?;
    let fields = apply_edits(RecordFields::from_record(&current), cmd)?;

    let record = store
        .update_record(id, fields)
        .context("Failed to update record")?;
    println!("{} updated (id: {})", kind_label(record.kind()), record.id());
    Ok(())
}

fn apply_edits(mut fields: RecordFields, cmd: &EditCommand) -> Result<RecordFields> {
    if let Some(title) = &cmd.title {
        fields.title = title.clone();
    }
    if let Some(content) = &cmd.content {
        fields.content = content.clone();
    }
    if let Some(kind) = cmd.kind {
        fields.kind = kind;
    }
    if let Some(tags) = &cmd.tags {
        fields.tags = TagNormalizer::parse_list(tags);
    }
    if let Some(date) = &cmd.date {
        fields.date = Some(parse_date(date)?);
    }
    if cmd.clear_date {
        fields.date = None;
    }
    if let Some(folder) = &cmd.folder {
        fields.folder_id = Some(FolderId::new(folder.as_str()));
    }
    if cmd.clear_folder {
        fields.folder_id = None;
    }
    Ok(fields)
}

fn handle_completion(id: i64, completed: bool, store: &impl RecordStore) -> Result<()> {
    let record = store.set_completed(RecordId::new(id), completed)?;
    if record.completed() {
        println!("Task completed! (id: {})", record.id());
    } else {
        println!("Task reopened (id: {})", record.id());
    }
    Ok(())
}

fn handle_delete(id: i64, store: &impl RecordStore) -> Result<()> {
    let id = RecordId::new(id);
    store.delete_record(id)?;
    println!("Record {id} deleted");
    Ok(())
}

fn handle_calendar(cmd: &CalendarCommand, store: &impl RecordStore) -> Result<()> {
    let now = OffsetDateTime::now_utc();
    let (year, month) = match &cmd.month {
        Some(text) => parse_month(text)?,
        None => (now.year(), now.month()),
    };

    let records = store.list_records()?;

    println!("{month} {year}");
    for bucket in calendar::month_grid(&records, year, month) {
        if bucket.records.is_empty() {
            continue;
        }
        println!("{}", bucket.day);
        for record in &bucket.records {
            println!("  {}", format_record(record));
        }
    }

    let overdue = calendar::overdue_tasks(&records, now);
    if !overdue.is_empty() {
        println!("\nOverdue ({})", overdue.len());
        for record in &overdue {
            println!("  {}", format_record(record));
        }
    }

    let upcoming = calendar::upcoming(&records, now, cmd.upcoming);
    if !upcoming.is_empty() {
        println!("\nUpcoming");
        for record in &upcoming {
            println!("  {}", format_record(record));
        }
    }

    println!("\n{} unscheduled", calendar::unscheduled(&records).len());
    Ok(())
}

fn handle_graph(cmd: &ListCommand, store: &impl RecordStore, config: &Config) -> Result<()> {
    let query = cmd.filter.to_query(RecordQuery::graph_view())?;
    let records = store.list_records()?;
    let graph = graph_view(
        &records,
        &query,
        &config.graph,
        config.canvas,
        LayoutConfig::default(),
    );

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
        return Ok(());
    }

    if graph.nodes.is_empty() {
        println!("No records match. Create notes and tasks with shared tags to see connections.");
        return Ok(());
    }

    println!("Nodes ({}):", graph.nodes.len());
    for node in &graph.nodes {
        println!(
            "  [{}] {}  r={:.1} at ({:.1}, {:.1})  connected to {}",
            node.id,
            node.title,
            node.radius,
            node.x,
            node.y,
            graph.degree(node.id)
        );
    }

    println!("Edges ({}):", graph.edges.len());
    for edge in &graph.edges {
        println!(
            "  {} -- {}  strength {}  [{}]",
            edge.from,
            edge.to,
            edge.strength,
            edge.shared_tags.join(", ")
        );
    }

    let isolated = graph.isolated();
    if !isolated.is_empty() {
        let ids: Vec<String> = isolated.iter().map(ToString::to_string).collect();
        println!("Isolated: {}", ids.join(", "));
    }
    Ok(())
}

fn handle_stats(cmd: &StatsCommand, store: &impl RecordStore) -> Result<()> {
    let records = store.list_records()?;
    let stats = GraphStats::from_records(&records);

    if cmd.json {
        let popular = stats.popular_tags(cmd.top);
        let value = serde_json::json!({
            "total_records": records.len(),
            "total_connections": stats.total_connections,
            "most_connected_tag": stats.most_connected_tag,
            "unique_tags": stats.unique_tags,
            "untagged_records": stats.untagged_records,
            "max_tags_per_record": stats.max_tags_per_record,
            "popular_tags": popular,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Records:             {}", records.len());
    println!("Connections:         {}", stats.total_connections);
    println!(
        "Most connected tag:  {}",
        stats.most_connected_tag.as_deref().unwrap_or("-")
    );
    println!("Unique tags:         {}", stats.unique_tags);
    println!("Untagged records:    {}", stats.untagged_records);
    println!("Max tags per record: {}", stats.max_tags_per_record);

    let popular = stats.popular_tags(cmd.top);
    if !popular.is_empty() {
        println!("\nPopular tags");
        for entry in popular {
            println!("  {:<20} {}", entry.tag, entry.count);
        }
    }
    Ok(())
}

fn print_records(records: &[Record], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No records found.");
        return Ok(());
    }
    for record in records {
        println!("{}", format_record(record));
    }
    Ok(())
}

/// One-line text rendering of a record.
fn format_record(record: &Record) -> String {
    let marker = match (record.kind(), record.completed()) {
        (RecordKind::Task, true) => "[x]",
        (RecordKind::Task, false) => "[ ]",
        (RecordKind::Note, _) => " - ",
    };

    let mut line = format!("{:>4} {} {}", record.id(), marker, record.title());
    if let Some(date) = record.date() {
        line.push_str(&format!("  @{}", date.date()));
    }
    if let Some(folder) = record.folder_id() {
        line.push_str(&format!("  /{folder}"));
    }
    if !record.tags().is_empty() {
        let tags: Vec<String> = record.tags().iter().map(|t| format!("#{t}")).collect();
        line.push_str(&format!("  {}", tags.join(" ")));
    }
    line
}

fn kind_label(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Note => "Note",
        RecordKind::Task => "Task",
    }
}

/// Parses an inclusive range end. A plain `YYYY-MM-DD` covers the whole day.
fn parse_range_end(input: &str) -> Result<OffsetDateTime, ValidationError> {
    let parsed = parse_date(input)?;
    if OffsetDateTime::parse(input.trim(), &Rfc3339).is_ok() {
        Ok(parsed)
    } else {
        Ok(parsed.replace_time(time!(23:59:59.999_999_999)))
    }
}

/// Parses `YYYY-MM` into a year and month.
fn parse_month(input: &str) -> Result<(i32, Month)> {
    let (year, month) = input
        .trim()
        .split_once('-')
        .ok_or_else(|| anyhow::anyhow!("Month must look like YYYY-MM, got '{input}'"))?;

    let year: i32 = year
        .parse()
        .with_context(|| format!("Invalid year in '{input}'"))?;
    let month: u8 = month
        .parse()
        .with_context(|| format!("Invalid month in '{input}'"))?;
    let month = Month::try_from(month).with_context(|| format!("Invalid month in '{input}'"))?;

    Ok((year, month))
}
