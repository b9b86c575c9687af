//! Deterministic radial layout for the tag graph.
//!
//! Node `k` of `n` sits at angle `k / n * 2π` on a ring centred on the
//! canvas. The ring radius is a fixed fraction of the shorter canvas side.
//! Identical inputs always produce bit-identical coordinates. There is no
//! force simulation and no overlap resolution.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::graph::TagGraph;

/// Drawing surface the layout targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl Canvas {
    /// Creates a canvas of the given size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Centre point of the canvas.
    pub fn center(&self) -> Point {
        Point {
            x: self.width / 2.0,
            y: self.height / 2.0,
        }
    }
}

/// Ring sizing for the radial layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Ring radius as a fraction of the shorter canvas side.
    pub ring_fraction: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { ring_fraction: 0.3 }
    }
}

/// A 2D position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Position of node `k` out of `n` on the ring.
///
/// With `n == 0` there is nothing to place and the canvas centre is returned.
///
/// # Examples
///
/// ```
/// use tagloom::layout::{Canvas, LayoutConfig, radial_position};
///
/// let p = radial_position(0, 4, Canvas::new(200.0, 100.0), LayoutConfig::default());
/// assert_eq!((p.x, p.y), (130.0, 50.0));
/// ```
pub fn radial_position(k: usize, n: usize, canvas: Canvas, config: LayoutConfig) -> Point {
    let center = canvas.center();
    if n == 0 {
        return center;
    }

    let angle = k as f64 / n as f64 * TAU;
    let ring = canvas.width.min(canvas.height) * config.ring_fraction;
    Point {
        x: center.x + angle.cos() * ring,
        y: center.y + angle.sin() * ring,
    }
}

/// Assigns every node in `graph` its ring position by index.
pub fn layout_graph(graph: &mut TagGraph, canvas: Canvas, config: LayoutConfig) {
    let n = graph.nodes.len();
    for (k, node) in graph.nodes.iter_mut().enumerate() {
        let point = radial_position(k, n, canvas, config);
        node.x = point.x;
        node.y = point.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GraphConfig, RecordBuilder, RecordId, build_graph};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn first_node_sits_right_of_center() {
        let p = radial_position(0, 3, Canvas::new(800.0, 600.0), LayoutConfig::default());
        assert_eq!(p.x, 400.0 + 180.0);
        assert_eq!(p.y, 300.0);
    }

    #[test]
    fn quarter_turn_places_node_below_center() {
        let p = radial_position(1, 4, Canvas::new(800.0, 600.0), LayoutConfig::default());
        assert!(approx(p.x, 400.0));
        assert!(approx(p.y, 480.0));
    }

    #[test]
    fn ring_uses_shorter_side() {
        let tall = radial_position(0, 1, Canvas::new(100.0, 1000.0), LayoutConfig::default());
        assert_eq!(tall.x, 50.0 + 30.0);

        let wide = radial_position(0, 1, Canvas::new(1000.0, 100.0), LayoutConfig::default());
        assert_eq!(wide.x, 500.0 + 30.0);
    }

    #[test]
    fn zero_nodes_map_to_center() {
        let p = radial_position(0, 0, Canvas::default(), LayoutConfig::default());
        assert_eq!(p, Point { x: 400.0, y: 300.0 });
    }

    #[test]
    fn positions_are_bit_for_bit_reproducible() {
        let canvas = Canvas::new(1024.0, 768.0);
        let config = LayoutConfig::default();
        for n in 1..20 {
            for k in 0..n {
                let a = radial_position(k, n, canvas, config);
                let b = radial_position(k, n, canvas, config);
                assert_eq!(a.x.to_bits(), b.x.to_bits());
                assert_eq!(a.y.to_bits(), b.y.to_bits());
            }
        }
    }

    #[test]
    fn every_node_lies_on_the_ring() {
        let canvas = Canvas::new(800.0, 600.0);
        let config = LayoutConfig::default();
        let center = canvas.center();
        for k in 0..7 {
            let p = radial_position(k, 7, canvas, config);
            let distance = ((p.x - center.x).powi(2) + (p.y - center.y).powi(2)).sqrt();
            assert!(approx(distance, 180.0));
        }
    }

    #[test]
    fn layout_graph_positions_nodes_by_index() {
        let records: Vec<_> = (1..=4)
            .map(|id| {
                RecordBuilder::new()
                    .id(RecordId::new(id))
                    .title(format!("r{id}"))
                    .build()
            })
            .collect();
        let mut graph = build_graph(&records, &GraphConfig::default());
        let canvas = Canvas::default();
        let config = LayoutConfig::default();

        layout_graph(&mut graph, canvas, config);

        for (k, node) in graph.nodes.iter().enumerate() {
            let expected = radial_position(k, 4, canvas, config);
            assert_eq!(node.x, expected.x);
            assert_eq!(node.y, expected.y);
        }
    }
}
