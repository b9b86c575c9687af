pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod graph;
pub mod layout;
pub mod logging;
pub mod models;
pub mod query;
pub mod service;
pub mod store;
pub mod tags;

pub use config::Config;
pub use db::Database;
pub use error::{StoreError, ValidationError};
pub use graph::{GraphConfig, GraphEdge, GraphNode, GraphStats, TagCount, TagGraph, build_graph};
pub use layout::{Canvas, LayoutConfig, layout_graph};
pub use models::{
    FolderId, ParseKindError, Record, RecordBuilder, RecordFields, RecordId, RecordKind,
    parse_date,
};
pub use query::{
    DateField, DateRange, RecordQuery, SortKey, TagMatch, apply, filter_records, sort_records,
};
pub use service::{MIN_SEARCH_TERM_CHARS, RecordService, SEARCH_HISTORY_CAPACITY};
pub use store::RecordStore;

/// Filters `records` with `query`, then builds and lays out the tag graph.
///
/// This is the whole graph-view pipeline in one call; it recomputes from
/// scratch every time.
///
/// # Examples
///
/// ```
/// use tagloom::{
///     Canvas, GraphConfig, LayoutConfig, RecordBuilder, RecordId, RecordQuery, graph_view,
/// };
///
/// let records = vec![
///     RecordBuilder::new().id(RecordId::new(1)).title("a").tags(vec!["x".into()]).build(),
///     RecordBuilder::new().id(RecordId::new(2)).title("b").tags(vec!["x".into()]).build(),
/// ];
/// let graph = graph_view(
///     &records,
///     &RecordQuery::graph_view(),
///     &GraphConfig::default(),
///     Canvas::default(),
///     LayoutConfig::default(),
/// );
/// assert_eq!(graph.nodes.len(), 2);
/// assert_eq!(graph.edges.len(), 1);
/// ```
pub fn graph_view(
    records: &[Record],
    query: &RecordQuery,
    graph_config: &GraphConfig,
    canvas: Canvas,
    layout_config: LayoutConfig,
) -> TagGraph {
    let visible = apply(records, query);
    let mut graph = build_graph(&visible, graph_config);
    layout_graph(&mut graph, canvas, layout_config);
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_accessible_from_crate_root() {
        let db = Database::in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn types_accessible_from_crate_root() {
        let record = RecordBuilder::new()
            .id(RecordId::new(1))
            .title("test")
            .kind(RecordKind::Task)
            .build();
        assert_eq!(record.title(), "test");
        assert_eq!(format!("{}", record.kind()), "task");

        let query = RecordQuery::default();
        assert_eq!(query.sort, SortKey::UpdatedAt);
    }

    #[test]
    fn graph_view_lays_out_only_filtered_records() {
        let tagged = |id: i64, tags: &[&str]| {
            RecordBuilder::new()
                .id(RecordId::new(id))
                .title(format!("r{id}"))
                .tags(tags.iter().map(|t| t.to_string()).collect())
                .build()
        };
        let records = vec![
            tagged(1, &["work", "urgent"]),
            tagged(2, &["work"]),
            tagged(3, &["work", "urgent"]),
        ];
        let query = RecordQuery {
            tags: vec!["work".into(), "urgent".into()],
            sort: SortKey::Title,
            ..RecordQuery::graph_view()
        };

        let graph = graph_view(
            &records,
            &query,
            &GraphConfig::default(),
            Canvas::default(),
            LayoutConfig::default(),
        );

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].strength, 2);
        assert_eq!(graph.nodes[0].x, 400.0 + 180.0);
    }
}
