//! Tag-overlap graph construction.
//!
//! Every visible record becomes a node; every unordered pair of records that
//! shares at least one tag becomes an edge weighted by the number of shared
//! tags. The graph is rebuilt from scratch whenever the input list changes.
//! Pairwise comparison is O(n²), which is fine for one person's records.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{Record, RecordId, RecordKind};

/// Radius constants for graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Radius of a node with no tags.
    pub base_radius: f64,
    /// Extra radius per tag. Must be non-negative.
    pub radius_per_tag: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_radius: 20.0,
            radius_per_tag: 5.0,
        }
    }
}

impl GraphConfig {
    /// Node radius for a record with `tag_count` tags.
    ///
    /// Monotonically non-decreasing in `tag_count`; a negative increment is
    /// treated as zero.
    pub fn radius_for(&self, tag_count: usize) -> f64 {
        self.base_radius + tag_count as f64 * self.radius_per_tag.max(0.0)
    }
}

/// One record as it appears in the graph view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: RecordId,
    pub title: String,
    pub kind: RecordKind,
    pub completed: bool,
    pub tags: Vec<String>,
    pub radius: f64,
    /// Horizontal position, filled in by the layout stage.
    pub x: f64,
    /// Vertical position, filled in by the layout stage.
    pub y: f64,
}

/// Tag overlap between two records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: RecordId,
    pub to: RecordId,
    /// Tags carried by both records, in the `from` record's tag order.
    pub shared_tags: Vec<String>,
    /// Number of shared tags.
    pub strength: usize,
}

/// Nodes and edges derived from a record list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TagGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl TagGraph {
    /// Returns the node for `id`, if present.
    pub fn node(&self, id: RecordId) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Returns the ids connected to `id`, in edge order.
    pub fn neighbors(&self, id: RecordId) -> Vec<RecordId> {
        self.edges
            .iter()
            .filter_map(|edge| {
                if edge.from == id {
                    Some(edge.to)
                } else if edge.to == id {
                    Some(edge.from)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Number of edges touching `id`.
    pub fn degree(&self, id: RecordId) -> usize {
        self.edges
            .iter()
            .filter(|edge| edge.from == id || edge.to == id)
            .count()
    }

    /// Ids of nodes with no edges, in node order.
    pub fn isolated(&self) -> Vec<RecordId> {
        self.nodes
            .iter()
            .map(|node| node.id)
            .filter(|id| self.degree(*id) == 0)
            .collect()
    }
}

/// Tags shared by two tag lists, in the order of `a`.
pub fn shared_tags(a: &[String], b: &[String]) -> Vec<String> {
    let other: HashSet<&str> = b.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    a.iter()
        .filter(|tag| other.contains(tag.as_str()) && seen.insert(tag.as_str()))
        .cloned()
        .collect()
}

/// Builds the tag-overlap graph for `records`.
///
/// Nodes follow input order. Edges are emitted for each pair `(i, j)` with
/// `i < j` in input order, so equal-strength edges keep pair iteration
/// order. Node positions are left at the origin; see
/// [`layout_graph`](crate::layout::layout_graph).
///
/// # Examples
///
/// ```
/// use tagloom::{GraphConfig, RecordBuilder, RecordId, build_graph};
///
/// let tagged = |id, tags: &[&str]| {
///     RecordBuilder::new()
///         .id(RecordId::new(id))
///         .title(format!("record {id}"))
///         .tags(tags.iter().map(|t| t.to_string()).collect())
///         .build()
/// };
/// let records = vec![tagged(1, &["a", "b", "c"]), tagged(2, &["b", "c", "d"])];
///
/// let graph = build_graph(&records, &GraphConfig::default());
/// assert_eq!(graph.edges.len(), 1);
/// assert_eq!(graph.edges[0].strength, 2);
/// assert_eq!(graph.edges[0].shared_tags, vec!["b", "c"]);
/// ```
pub fn build_graph(records: &[Record], config: &GraphConfig) -> TagGraph {
    let nodes: Vec<GraphNode> = records
        .iter()
        .map(|record| GraphNode {
            id: record.id(),
            title: record.title().to_string(),
            kind: record.kind(),
            completed: record.completed(),
            tags: record.tags().to_vec(),
            radius: config.radius_for(record.tags().len()),
            x: 0.0,
            y: 0.0,
        })
        .collect();

    let mut edges = Vec::new();
    for (i, a) in records.iter().enumerate() {
        for b in &records[i + 1..] {
            let shared = shared_tags(a.tags(), b.tags());
            if shared.is_empty() {
                continue;
            }
            edges.push(GraphEdge {
                from: a.id(),
                to: b.id(),
                strength: shared.len(),
                shared_tags: shared,
            });
        }
    }

    log::debug!(
        "event=graph_built nodes={} edges={}",
        nodes.len(),
        edges.len()
    );

    TagGraph { nodes, edges }
}

/// Occurrence count for one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Summary figures shown alongside the graph.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GraphStats {
    /// Number of record pairs sharing at least one tag.
    pub total_connections: usize,
    /// Tag that appears in the most connected pairs.
    pub most_connected_tag: Option<String>,
    /// Distinct tags across all records.
    pub unique_tags: usize,
    /// Records without any tag.
    pub untagged_records: usize,
    /// Largest tag count on a single record.
    pub max_tags_per_record: usize,
    /// Per-tag record counts, most used first.
    tag_counts: Vec<TagCount>,
}

impl GraphStats {
    /// Computes statistics over `records`.
    ///
    /// Ties in `most_connected_tag` and the tag ranking go to the tag seen
    /// first in record order.
    pub fn from_records(records: &[Record]) -> Self {
        let mut first_seen: Vec<&str> = Vec::new();
        let mut usage: HashMap<&str, usize> = HashMap::new();
        for record in records {
            for tag in record.tags() {
                let count = usage.entry(tag.as_str()).or_insert_with(|| {
                    first_seen.push(tag.as_str());
                    0
                });
                *count += 1;
            }
        }

        let mut connections_per_tag: HashMap<String, usize> = HashMap::new();
        let mut total_connections = 0;
        for (i, a) in records.iter().enumerate() {
            for b in &records[i + 1..] {
                let shared = shared_tags(a.tags(), b.tags());
                if shared.is_empty() {
                    continue;
                }
                total_connections += 1;
                for tag in shared {
                    *connections_per_tag.entry(tag).or_default() += 1;
                }
            }
        }

        let mut most_connected_tag: Option<(&str, usize)> = None;
        for tag in &first_seen {
            let count = connections_per_tag.get(*tag).copied().unwrap_or(0);
            if count > 0 && most_connected_tag.is_none_or(|(_, best)| count > best) {
                most_connected_tag = Some((*tag, count));
            }
        }

        let mut tag_counts: Vec<TagCount> = first_seen
            .iter()
            .map(|tag| TagCount {
                tag: (*tag).to_string(),
                count: usage[tag],
            })
            .collect();
        // Stable sort keeps first-seen order among equal counts.
        tag_counts.sort_by(|a, b| b.count.cmp(&a.count));

        Self {
            total_connections,
            most_connected_tag: most_connected_tag.map(|(tag, _)| tag.to_string()),
            unique_tags: first_seen.len(),
            untagged_records: records.iter().filter(|r| r.tags().is_empty()).count(),
            max_tags_per_record: records.iter().map(|r| r.tags().len()).max().unwrap_or(0),
            tag_counts,
        }
    }

    /// The `limit` most used tags.
    pub fn popular_tags(&self, limit: usize) -> &[TagCount] {
        &self.tag_counts[..limit.min(self.tag_counts.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordBuilder;

    fn tagged(id: i64, tags: &[&str]) -> Record {
        RecordBuilder::new()
            .id(RecordId::new(id))
            .title(format!("record {id}"))
            .tags(tags.iter().map(|t| t.to_string()).collect())
            .build()
    }

    #[test]
    fn overlapping_tag_sets_produce_one_weighted_edge() {
        let records = vec![tagged(1, &["a", "b", "c"]), tagged(2, &["b", "c", "d"])];
        let graph = build_graph(&records, &GraphConfig::default());

        assert_eq!(graph.edges.len(), 1);
        let edge = &graph.edges[0];
        assert_eq!(edge.from, RecordId::new(1));
        assert_eq!(edge.to, RecordId::new(2));
        assert_eq!(edge.strength, 2);
        assert_eq!(edge.shared_tags, vec!["b", "c"]);
    }

    #[test]
    fn third_record_without_overlap_is_isolated() {
        let records = vec![tagged(1, &["x"]), tagged(2, &["x", "y"]), tagged(3, &["z"])];
        let graph = build_graph(&records, &GraphConfig::default());

        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].from, RecordId::new(1));
        assert_eq!(graph.edges[0].to, RecordId::new(2));
        assert_eq!(graph.edges[0].strength, 1);
        assert_eq!(graph.degree(RecordId::new(3)), 0);
        assert_eq!(graph.isolated(), vec![RecordId::new(3)]);
    }

    #[test]
    fn untagged_records_produce_no_edges() {
        let records = vec![tagged(1, &[]), tagged(2, &[]), tagged(3, &[])];
        let graph = build_graph(&records, &GraphConfig::default());

        assert_eq!(graph.nodes.len(), 3);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn empty_input_produces_empty_graph() {
        let graph = build_graph(&[], &GraphConfig::default());
        assert_eq!(graph, TagGraph::default());
    }

    #[test]
    fn edge_count_matches_tag_sharing_pairs() {
        let records = vec![
            tagged(1, &["a"]),
            tagged(2, &["a", "b"]),
            tagged(3, &["b"]),
            tagged(4, &["c"]),
            tagged(5, &["a", "c"]),
        ];
        let graph = build_graph(&records, &GraphConfig::default());

        let mut expected = 0;
        for i in 0..records.len() {
            for j in (i + 1)..records.len() {
                if !shared_tags(records[i].tags(), records[j].tags()).is_empty() {
                    expected += 1;
                }
            }
        }
        assert_eq!(graph.edges.len(), expected);
        assert_eq!(graph.edges.len(), 5);
    }

    #[test]
    fn edges_follow_pair_iteration_order() {
        let records = vec![tagged(1, &["a"]), tagged(2, &["a"]), tagged(3, &["a"])];
        let graph = build_graph(&records, &GraphConfig::default());

        let pairs: Vec<(i64, i64)> = graph
            .edges
            .iter()
            .map(|e| (e.from.get(), e.to.get()))
            .collect();
        assert_eq!(pairs, vec![(1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn radius_grows_with_tag_count() {
        let records = vec![tagged(1, &[]), tagged(2, &["a", "b", "c"])];
        let graph = build_graph(&records, &GraphConfig::default());

        assert_eq!(graph.nodes[0].radius, 20.0);
        assert_eq!(graph.nodes[1].radius, 35.0);
    }

    #[test]
    fn negative_increment_never_shrinks_radius() {
        let config = GraphConfig {
            base_radius: 10.0,
            radius_per_tag: -3.0,
        };
        assert_eq!(config.radius_for(0), 10.0);
        assert_eq!(config.radius_for(4), 10.0);
    }

    #[test]
    fn nodes_carry_record_identity() {
        let task = RecordBuilder::new()
            .id(RecordId::new(9))
            .title("Finish draft")
            .kind(RecordKind::Task)
            .completed(true)
            .tags(vec!["writing".into()])
            .build();
        let graph = build_graph(&[task], &GraphConfig::default());

        let node = graph.node(RecordId::new(9)).unwrap();
        assert_eq!(node.title, "Finish draft");
        assert_eq!(node.kind, RecordKind::Task);
        assert!(node.completed);
        assert_eq!(node.tags, vec!["writing"]);
    }

    #[test]
    fn neighbors_and_degree_cover_both_edge_directions() {
        let records = vec![tagged(1, &["a"]), tagged(2, &["a", "b"]), tagged(3, &["b"])];
        let graph = build_graph(&records, &GraphConfig::default());

        assert_eq!(graph.neighbors(RecordId::new(2)), vec![RecordId::new(1), RecordId::new(3)]);
        assert_eq!(graph.degree(RecordId::new(2)), 2);
        assert_eq!(graph.neighbors(RecordId::new(3)), vec![RecordId::new(2)]);
    }

    #[test]
    fn stats_summarize_tag_usage() {
        let records = vec![
            tagged(1, &["rust", "cli"]),
            tagged(2, &["rust"]),
            tagged(3, &["cli", "rust", "db"]),
            tagged(4, &[]),
        ];
        let stats = GraphStats::from_records(&records);

        assert_eq!(stats.total_connections, 3);
        assert_eq!(stats.most_connected_tag.as_deref(), Some("rust"));
        assert_eq!(stats.unique_tags, 3);
        assert_eq!(stats.untagged_records, 1);
        assert_eq!(stats.max_tags_per_record, 3);

        let popular = stats.popular_tags(2);
        assert_eq!(popular.len(), 2);
        assert_eq!(popular[0], TagCount { tag: "rust".into(), count: 3 });
        assert_eq!(popular[1], TagCount { tag: "cli".into(), count: 2 });
    }

    #[test]
    fn stats_on_unconnected_records() {
        let records = vec![tagged(1, &["a"]), tagged(2, &["b"])];
        let stats = GraphStats::from_records(&records);

        assert_eq!(stats.total_connections, 0);
        assert_eq!(stats.most_connected_tag, None);
        assert_eq!(stats.popular_tags(10).len(), 2);
        assert_eq!(stats.popular_tags(10)[0].tag, "a");
    }
}
