//! Procedural city graph: intersections scattered on a jittered grid and
//! connected to their nearest neighbours.
//!
//! Uses petgraph for the underlying graph structure. A parallel adjacency
//! table keeps neighbours in insertion order so random path choice is stable
//! for a given seed.

use bevy::prelude::*;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rand::Rng;
use smallvec::SmallVec;

/// Parameters for city graph generation.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct CityGraphConfig {
    /// Number of placement attempts (upper bound on node count).
    pub node_count: usize,
    /// Side length of the square the city is generated in.
    pub range: f32,
    /// Coarse grid that candidate positions snap toward.
    pub grid_step: f32,
    /// Total width of the random jitter added after snapping.
    pub jitter: f32,
    /// Minimum distance between any two intersections.
    pub min_separation: f32,
    /// Roads are only built between nodes closer than this.
    pub max_connect_distance: f32,
    /// Nearest neighbours considered per intersection.
    pub max_connections: usize,
    /// Seed for placement. Changing it regenerates the city.
    pub seed: u64,
}

impl Default for CityGraphConfig {
    fn default() -> Self {
        Self {
            node_count: 80,
            range: 25.0,
            grid_step: 4.0,
            jitter: 1.5,
            min_separation: 4.0,
            max_connect_distance: 14.0,
            max_connections: 3,
            seed: 2024,
        }
    }
}

/// An intersection in the city.
#[derive(Clone, Debug)]
pub struct CityNode {
    pub position: Vec2,
}

/// A road between two intersections.
#[derive(Clone, Debug)]
pub struct CityRoad {
    pub length: f32,
}

/// The generated road network.
#[derive(Resource, Default, Clone)]
pub struct CityGraph {
    graph: UnGraph<CityNode, CityRoad>,
    /// Neighbours per node, in the order roads were added.
    adjacency: Vec<SmallVec<[usize; 6]>>,
}

impl CityGraph {
    /// Add an intersection and return its index.
    pub fn add_node(&mut self, position: Vec2) -> usize {
        let idx = self.graph.add_node(CityNode { position });
        self.adjacency.push(SmallVec::new());
        idx.index()
    }

    /// Add a road between two intersections.
    ///
    /// Self-loops, unknown indices and pairs that are already connected
    /// (in either direction) are ignored. Returns whether a road was added.
    pub fn add_road(&mut self, a: usize, b: usize) -> bool {
        if a == b || self.is_connected(a, b) {
            return false;
        }
        let (Some(pa), Some(pb)) = (self.position(a), self.position(b)) else {
            return false;
        };

        self.graph.add_edge(
            NodeIndex::new(a),
            NodeIndex::new(b),
            CityRoad {
                length: pa.distance(pb),
            },
        );
        self.adjacency[a].push(b);
        self.adjacency[b].push(a);
        true
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Position of a node on the ground plane.
    pub fn position(&self, idx: usize) -> Option<Vec2> {
        self.graph
            .node_weight(NodeIndex::new(idx))
            .map(|node| node.position)
    }

    /// All nodes with their indices.
    pub fn nodes(&self) -> impl Iterator<Item = (usize, &CityNode)> {
        self.graph
            .node_indices()
            .map(|i| (i.index(), &self.graph[i]))
    }

    /// Neighbours of a node in insertion order. Empty for unknown indices.
    pub fn neighbors(&self, idx: usize) -> &[usize] {
        self.adjacency.get(idx).map_or(&[], |n| n.as_slice())
    }

    /// Road endpoints as `(a, b)` pairs, each road reported once.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.graph.edge_indices().filter_map(|e| {
            self.graph
                .edge_endpoints(e)
                .map(|(a, b)| (a.index(), b.index()))
        })
    }

    /// Roads as `(a, b, road)`, each road reported once.
    pub fn roads(&self) -> impl Iterator<Item = (usize, usize, &CityRoad)> {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), e.weight()))
    }

    pub fn is_connected(&self, a: usize, b: usize) -> bool {
        if a >= self.node_count() || b >= self.node_count() {
            return false;
        }
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .is_some()
    }

    /// The `k` nodes closest to `idx`, nearest first, with their distances.
    pub fn nearest_nodes(&self, idx: usize, k: usize) -> SmallVec<[(usize, f32); 4]> {
        let Some(origin) = self.position(idx) else {
            return SmallVec::new();
        };

        let mut ranked: Vec<(usize, f32)> = self
            .nodes()
            .filter(|(other, _)| *other != idx)
            .map(|(other, node)| (other, origin.distance(node.position)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        ranked.into_iter().take(k).collect()
    }
}

/// Generate a city graph.
///
/// Placement is plain rejection sampling: a rejected candidate is not
/// retried, so the graph may hold fewer nodes than `node_count`.
pub fn generate_city_graph(config: &CityGraphConfig, rng: &mut impl Rng) -> CityGraph {
    let mut graph = CityGraph::default();

    for _ in 0..config.node_count {
        let candidate = sample_candidate(config, rng);
        let clear = graph
            .nodes()
            .all(|(_, node)| node.position.distance(candidate) >= config.min_separation);
        if clear {
            graph.add_node(candidate);
        }
    }

    connect_nearest(&mut graph, config);

    info!(
        "City graph generated: {} nodes ({} requested), {} roads",
        graph.node_count(),
        config.node_count,
        graph.edge_count()
    );

    graph
}

/// Sample a position in the square, snapped toward the grid and jittered.
fn sample_candidate(config: &CityGraphConfig, rng: &mut impl Rng) -> Vec2 {
    let half = config.range.abs() / 2.0;
    let half_jitter = config.jitter.abs() / 2.0;

    let mut axis = || {
        let raw = rng.gen_range(-half..=half);
        let snapped = if config.grid_step > 0.0 {
            (raw / config.grid_step).round() * config.grid_step
        } else {
            raw
        };
        snapped + rng.gen_range(-half_jitter..=half_jitter)
    };

    let x = axis();
    let z = axis();
    Vec2::new(x, z)
}

/// Connect every node to its nearest neighbours within reach.
fn connect_nearest(graph: &mut CityGraph, config: &CityGraphConfig) {
    for idx in 0..graph.node_count() {
        for (other, dist) in graph.nearest_nodes(idx, config.max_connections) {
            if dist >= config.max_connect_distance {
                // Ranked nearest first, nothing further can qualify.
                break;
            }
            graph.add_road(idx, other);
        }
    }
}
