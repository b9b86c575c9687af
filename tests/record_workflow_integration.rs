use anyhow::Result;
use tagloom::{
    Database, DateField, DateRange, FolderId, Record, RecordFields, RecordKind, RecordQuery,
    RecordService, RecordStore, SortKey, StoreError, TagMatch, apply, filter_records, parse_date,
};
use time::macros::datetime;

fn create_test_service() -> RecordService {
    let db = Database::in_memory().expect("failed to create in-memory database");
    RecordService::new(db)
}

fn titles(records: &[Record]) -> Vec<&str> {
    records.iter().map(Record::title).collect()
}

/// Seeds a small mixed workspace of notes and tasks.
fn seed(service: &RecordService) -> Result<()> {
    service.create_record(
        RecordFields::new("Quarterly report")
            .kind(RecordKind::Task)
            .tags(["work", "urgent"])
            .date(Some(parse_date("2024-03-10")?))
            .folder(Some(FolderId::new("office"))),
    )?;
    service.create_record(
        RecordFields::new("Team offsite ideas")
            .tags(["work"])
            .folder(Some(FolderId::new("office"))),
    )?;
    let groceries = service.create_record(
        RecordFields::new("Buy groceries")
            .kind(RecordKind::Task)
            .tags(["home"])
            .date(Some(parse_date("2024-03-02")?)),
    )?;
    service.set_completed(groceries.id(), true)?;
    service.create_record(RecordFields::new("Reading list").content("Dune, Neuromancer"))?;
    Ok(())
}

#[test]
fn test_empty_query_keeps_every_record() -> Result<()> {
    // Arrange
    let service = create_test_service();
    seed(&service)?;
    let records = service.list_records()?;

    // Act
    let visible = apply(&records, &RecordQuery::default());

    // Assert
    assert_eq!(visible.len(), records.len());
    Ok(())
}

#[test]
fn test_filtering_is_pure_and_idempotent() -> Result<()> {
    let service = create_test_service();
    seed(&service)?;
    let records = service.list_records()?;
    let before = records.clone();

    let query = RecordQuery {
        tags: vec!["work".into()],
        ..RecordQuery::list_view()
    };
    let first = filter_records(&records, &query);
    let second = filter_records(&records, &query);

    assert_eq!(first, second);
    assert_eq!(records, before, "input list must not change");
    Ok(())
}

#[test]
fn test_list_view_matches_any_tag() -> Result<()> {
    let service = create_test_service();
    seed(&service)?;

    let query = RecordQuery {
        tags: vec!["urgent".into(), "home".into()],
        sort: SortKey::Title,
        ..RecordQuery::list_view()
    };
    let visible = apply(&service.list_records()?, &query);

    assert_eq!(titles(&visible), vec!["Buy groceries", "Quarterly report"]);
    Ok(())
}

#[test]
fn test_all_tags_requires_every_tag() -> Result<()> {
    let service = create_test_service();
    seed(&service)?;

    let query = RecordQuery {
        tags: vec!["work".into(), "urgent".into()],
        tag_match: TagMatch::All,
        ..RecordQuery::default()
    };
    let visible = apply(&service.list_records()?, &query);

    assert_eq!(titles(&visible), vec!["Quarterly report"]);
    Ok(())
}

#[test]
fn test_scheduled_date_range_excludes_undated_records() -> Result<()> {
    let service = create_test_service();
    seed(&service)?;

    let query = RecordQuery {
        date_range: Some(DateRange::new(
            Some(datetime!(2024-03-01 00:00 UTC)),
            Some(datetime!(2024-03-05 00:00 UTC)),
        )),
        date_field: DateField::Scheduled,
        ..RecordQuery::default()
    };
    let visible = apply(&service.list_records()?, &query);

    assert_eq!(titles(&visible), vec!["Buy groceries"]);
    Ok(())
}

#[test]
fn test_hide_completed_and_kind_filter_combine() -> Result<()> {
    let service = create_test_service();
    seed(&service)?;

    let query = RecordQuery {
        kind: Some(RecordKind::Task),
        hide_completed: true,
        ..RecordQuery::default()
    };
    let visible = apply(&service.list_records()?, &query);

    assert_eq!(titles(&visible), vec!["Quarterly report"]);
    Ok(())
}

#[test]
fn test_folder_and_search_filters() -> Result<()> {
    let service = create_test_service();
    seed(&service)?;
    let records = service.list_records()?;

    let in_office = RecordQuery {
        folder: Some(FolderId::new("office")),
        sort: SortKey::Title,
        ..RecordQuery::default()
    };
    assert_eq!(
        titles(&apply(&records, &in_office)),
        vec!["Quarterly report", "Team offsite ideas"]
    );

    let by_content = apply(&records, &RecordQuery::search_view("NEUROMANCER"));
    assert_eq!(titles(&by_content), vec!["Reading list"]);
    Ok(())
}

#[test]
fn test_title_sort_is_case_insensitive() -> Result<()> {
    // Arrange
    let service = create_test_service();
    for title in ["Banana", "apple", "Cherry"] {
        service.create_record(RecordFields::new(title))?;
    }

    // Act
    let query = RecordQuery {
        sort: SortKey::Title,
        ..RecordQuery::default()
    };
    let sorted = apply(&service.list_records()?, &query);

    // Assert
    assert_eq!(titles(&sorted), vec!["apple", "Banana", "Cherry"]);
    Ok(())
}

#[test]
fn test_deleting_missing_record_reports_not_found() -> Result<()> {
    // Arrange
    let service = create_test_service();
    seed(&service)?;
    let cached = service.list_records()?;
    let stale = cached[0].id();
    service.delete_record(stale)?;

    // Act
    let result = service.delete_record(stale);

    // Assert: an error value, not a panic, and the caller's list is untouched
    match result {
        Err(err @ StoreError::NotFound(_)) => {
            assert!(err.is_user_error());
            assert!(!err.is_retryable());
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert_eq!(cached.len(), 4);
    assert_eq!(service.list_records()?.len(), 3);
    Ok(())
}

#[test]
fn test_updating_stale_record_reports_not_found() -> Result<()> {
    let service = create_test_service();
    let record = service.create_record(RecordFields::new("Short lived"))?;
    service.delete_record(record.id())?;

    let result = service.update_record(record.id(), RecordFields::from_record(&record));

    assert!(matches!(result, Err(StoreError::NotFound(id)) if id == record.id()));
    Ok(())
}

#[test]
fn test_file_database_persists_across_reopen() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("records.db");

    let id = {
        let service = RecordService::new(Database::open(&path)?);
        service
            .create_record(RecordFields::new("Persistent").tags(["kept"]))?
            .id()
    };

    let service = RecordService::new(Database::open(&path)?);
    let record = service.get_record(id)?;
    assert_eq!(record.title(), "Persistent");
    assert_eq!(record.tags(), &["kept"]);
    Ok(())
}
