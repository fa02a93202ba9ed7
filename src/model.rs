//! Graph model: nodes and edges built once per input graph
//!
//! Edges are resolved to node indices when the model is built; relationships
//! that reference unknown concepts are dropped here so the simulator and
//! renderer never see them.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use tracing::{debug, info};

use crate::config::{LayoutConfig, NodeStyle};
use crate::graph_types::{ConceptType, GraphInput, IMPLICIT_EDGE_STRENGTH};
use crate::persistence::{PersistedPosition, PositionMap};

/// Who currently owns a node's position
///
/// Only the simulator writes `Free` nodes; only the interaction controller
/// writes a `Dragging` node; nobody moves a `Pinned` node except a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    #[default]
    Free,
    Pinned,
    /// Held by the pointer. Remembers whether to return to `Pinned` on release.
    Dragging { was_pinned: bool },
}

impl NodeState {
    /// The durable pin flag, as persisted
    pub fn is_pinned(&self) -> bool {
        matches!(
            self,
            NodeState::Pinned | NodeState::Dragging { was_pinned: true }
        )
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self, NodeState::Dragging { .. })
    }

    /// Pinned and dragged nodes act as fixed anchors for the simulation
    pub fn is_fixed(&self) -> bool {
        !matches!(self, NodeState::Free)
    }
}

/// A concept with its physics state and display metadata
#[derive(Debug, Clone)]
pub struct Node {
    /// Concept ID
    pub id: String,
    /// Human-readable label for display
    pub label: String,
    pub concept_type: ConceptType,
    pub mention_count: u32,
    /// Radius for rendering and hit-testing, derived from `mention_count`
    pub radius: f32,
    /// Position in graph space
    pub x: f32,
    pub y: f32,
    /// Velocity
    pub vx: f32,
    pub vy: f32,
    pub state: NodeState,
}

impl Node {
    /// Snapshot of the durable part of this node
    pub fn persisted(&self) -> PersistedPosition {
        PersistedPosition {
            x: self.x,
            y: self.y,
            pinned: self.state.is_pinned(),
        }
    }

    /// Squared distance from the node centre to a graph-space point
    pub fn distance_sq_to(&self, x: f32, y: f32) -> f32 {
        let dx = x - self.x;
        let dy = y - self.y;
        dx * dx + dy * dy
    }
}

/// A weighted spring between two nodes (indices into the node array)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    /// Strength in `[0, 1]`; scales line weight and attraction
    pub strength: f32,
}

/// Size of the layout area in graph units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Centre of the layout area
    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Clamp a point to `[margin, extent - margin]` on each axis
    ///
    /// An axis narrower than twice the margin collapses to its centre.
    pub fn clamp(&self, x: f32, y: f32, margin: f32) -> (f32, f32) {
        (
            clamp_axis(x, self.width, margin),
            clamp_axis(y, self.height, margin),
        )
    }

    /// Check whether a point lies within the margin-inset area
    pub fn contains(&self, x: f32, y: f32, margin: f32) -> bool {
        self.clamp(x, y, margin) == (x, y)
    }
}

fn clamp_axis(value: f32, extent: f32, margin: f32) -> f32 {
    let lo = margin;
    let hi = extent - margin;
    if hi < lo {
        extent / 2.0
    } else {
        value.clamp(lo, hi)
    }
}

/// Nodes and edges of the current graph
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    node_id_to_index: HashMap<String, usize>,
}

impl GraphModel {
    /// Build the model from extraction output and any saved positions
    ///
    /// Saved positions are used verbatim (including the pin flag) unless
    /// their coordinates are non-finite. Everything else is placed on a
    /// circle around the centre of `bounds` with random jitter.
    pub fn initialize<R: Rng>(
        input: &GraphInput,
        prior: &PositionMap,
        bounds: Bounds,
        layout: &LayoutConfig,
        style: &NodeStyle,
        rng: &mut R,
    ) -> Self {
        let mut node_id_to_index = HashMap::with_capacity(input.concepts.len());
        let mut concepts = Vec::with_capacity(input.concepts.len());
        for concept in &input.concepts {
            if node_id_to_index.contains_key(&concept.id) {
                debug!(id = %concept.id, "skipping duplicate concept id");
                continue;
            }
            node_id_to_index.insert(concept.id.clone(), concepts.len());
            concepts.push(concept);
        }

        let total = concepts.len();
        let mut restored = 0usize;
        let nodes: Vec<Node> = concepts
            .iter()
            .enumerate()
            .map(|(index, concept)| {
                let saved = prior.get(&concept.id).filter(|p| {
                    let valid = p.is_finite();
                    if !valid {
                        debug!(id = %concept.id, "discarding non-finite saved position");
                    }
                    valid
                });
                let (x, y, state) = match saved {
                    Some(p) => {
                        restored += 1;
                        let state = if p.pinned {
                            NodeState::Pinned
                        } else {
                            NodeState::Free
                        };
                        (p.x, p.y, state)
                    }
                    None => {
                        let (x, y) = default_position(index, total, bounds, layout, &mut *rng);
                        (x, y, NodeState::Free)
                    }
                };
                Node {
                    id: concept.id.clone(),
                    label: concept.name.clone(),
                    concept_type: concept.concept_type,
                    mention_count: concept.mention_count,
                    radius: style.radius_for(concept.mention_count),
                    x,
                    y,
                    vx: 0.0,
                    vy: 0.0,
                    state,
                }
            })
            .collect();

        let edges = build_edges(input, &node_id_to_index);

        info!(
            nodes = nodes.len(),
            edges = edges.len(),
            restored,
            "initialized graph model"
        );

        Self {
            nodes,
            edges,
            node_id_to_index,
        }
    }

    /// Index of the node with the given concept ID
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.node_id_to_index.get(id).copied()
    }

    /// Node with the given concept ID
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    /// Full snapshot of every node's durable position
    pub fn positions(&self) -> PositionMap {
        self.nodes
            .iter()
            .map(|n| (n.id.clone(), n.persisted()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Position on the initial circle for the node at `index`, plus jitter
pub fn default_position<R: Rng>(
    index: usize,
    total: usize,
    bounds: Bounds,
    layout: &LayoutConfig,
    rng: &mut R,
) -> (f32, f32) {
    let (cx, cy) = bounds.center();
    let radius = layout.circle_ratio * bounds.width.min(bounds.height);
    let angle = 2.0 * std::f32::consts::PI * (index as f32) / (total.max(1) as f32);
    let (jx, jy) = if layout.jitter > 0.0 {
        (
            rng.gen_range(-layout.jitter..=layout.jitter),
            rng.gen_range(-layout.jitter..=layout.jitter),
        )
    } else {
        (0.0, 0.0)
    };
    (cx + radius * angle.cos() + jx, cy + radius * angle.sin() + jy)
}

fn build_edges(input: &GraphInput, index: &HashMap<String, usize>) -> Vec<Edge> {
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut edges = Vec::with_capacity(input.relationships.len());

    let mut push = |source: usize, target: usize, strength: f32, edges: &mut Vec<Edge>| {
        let key = (source.min(target), source.max(target));
        if source != target && seen.insert(key) {
            edges.push(Edge {
                source,
                target,
                strength,
            });
        }
    };

    for rel in &input.relationships {
        let (Some(&source), Some(&target)) = (index.get(&rel.source_id), index.get(&rel.target_id))
        else {
            debug!(
                source = %rel.source_id,
                target = %rel.target_id,
                "skipping relationship with unknown endpoint"
            );
            continue;
        };
        if !rel.strength.is_finite() {
            debug!(source = %rel.source_id, target = %rel.target_id, "skipping non-finite strength");
            continue;
        }
        push(source, target, rel.strength.clamp(0.0, 1.0), &mut edges);
    }

    for concept in &input.concepts {
        let Some(&source) = index.get(&concept.id) else {
            continue;
        };
        for related in &concept.related_concept_ids {
            if let Some(&target) = index.get(related) {
                push(source, target, IMPLICIT_EDGE_STRENGTH, &mut edges);
            }
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_types::{Concept, Relationship};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn make_input() -> GraphInput {
        GraphInput {
            concepts: vec![
                Concept::new("a", "A").with_mentions(3),
                Concept::new("b", "B"),
                Concept::new("c", "C"),
            ],
            relationships: vec![
                Relationship::new("a", "b", 0.8),
                Relationship::new("b", "c", 1.0),
            ],
        }
    }

    fn init(input: &GraphInput, prior: &PositionMap) -> GraphModel {
        let mut rng = StdRng::seed_from_u64(7);
        GraphModel::initialize(
            input,
            prior,
            Bounds::new(800.0, 600.0),
            &LayoutConfig::default(),
            &NodeStyle::default(),
            &mut rng,
        )
    }

    #[test]
    fn builds_nodes_and_edges() {
        let model = init(&make_input(), &PositionMap::new());

        assert_eq!(model.nodes.len(), 3);
        assert_eq!(model.edges.len(), 2);
        assert_eq!(model.index_of("c"), Some(2));
        assert_eq!(model.edges[0].strength, 0.8);
        assert!(model.nodes[0].radius > model.nodes[1].radius);
    }

    #[test]
    fn default_layout_is_circle_around_center_with_jitter() {
        let model = init(&make_input(), &PositionMap::new());
        // 0.3 * min(800, 600) = 180
        for node in &model.nodes {
            let dist = node.distance_sq_to(400.0, 300.0).sqrt();
            assert!(
                (dist - 180.0).abs() <= 25.0 * std::f32::consts::SQRT_2 + 1e-3,
                "node {} at distance {dist}",
                node.id
            );
            assert_eq!(node.state, NodeState::Free);
        }
    }

    #[test]
    fn zero_jitter_places_exactly_on_circle() {
        let layout = LayoutConfig {
            jitter: 0.0,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let (x, y) = default_position(1, 4, Bounds::new(800.0, 600.0), &layout, &mut rng);
        assert!((x - 400.0).abs() < 1e-3);
        assert!((y - 480.0).abs() < 1e-3);
    }

    #[test]
    fn prior_positions_are_used_verbatim() {
        let mut prior = PositionMap::new();
        prior.insert(
            "b".to_string(),
            PersistedPosition {
                x: 12.5,
                y: 640.0,
                pinned: true,
            },
        );
        prior.insert(
            "ghost".to_string(),
            PersistedPosition {
                x: 1.0,
                y: 1.0,
                pinned: false,
            },
        );

        let model = init(&make_input(), &prior);
        let b = model.node("b").unwrap();

        assert_eq!((b.x, b.y), (12.5, 640.0));
        assert_eq!(b.state, NodeState::Pinned);
        assert!(model.node("ghost").is_none());
    }

    #[test]
    fn non_finite_prior_falls_back_to_circle() {
        let mut prior = PositionMap::new();
        prior.insert(
            "a".to_string(),
            PersistedPosition {
                x: f32::NAN,
                y: 10.0,
                pinned: true,
            },
        );

        let model = init(&make_input(), &prior);
        let a = model.node("a").unwrap();

        assert!(a.x.is_finite());
        assert_eq!(a.state, NodeState::Free);
    }

    #[test]
    fn dangling_and_degenerate_relationships_are_skipped() {
        let input = GraphInput {
            concepts: vec![Concept::new("a", "A"), Concept::new("b", "B")],
            relationships: vec![
                Relationship::new("a", "nonexistent", 1.0),
                Relationship::new("a", "a", 1.0),
                Relationship::new("a", "b", f32::NAN),
                Relationship::new("b", "a", 7.0),
                Relationship::new("a", "b", 0.3),
            ],
        };

        let model = init(&input, &PositionMap::new());

        assert_eq!(model.edges.len(), 1);
        assert_eq!(model.edges[0].source, 1);
        assert_eq!(model.edges[0].strength, 1.0);
    }

    #[test]
    fn related_ids_add_implicit_edges_once() {
        let mut a = Concept::new("a", "A");
        a.related_concept_ids = vec!["b".into(), "c".into(), "missing".into()];
        let input = GraphInput {
            concepts: vec![a, Concept::new("b", "B"), Concept::new("c", "C")],
            relationships: vec![Relationship::new("b", "a", 0.9)],
        };

        let model = init(&input, &PositionMap::new());

        assert_eq!(model.edges.len(), 2);
        assert_eq!(model.edges[0].strength, 0.9);
        assert_eq!(
            model.edges[1],
            Edge {
                source: 0,
                target: 2,
                strength: IMPLICIT_EDGE_STRENGTH
            }
        );
    }

    #[test]
    fn duplicate_concept_ids_keep_first() {
        let input = GraphInput {
            concepts: vec![Concept::new("a", "First"), Concept::new("a", "Second")],
            relationships: vec![],
        };
        let model = init(&input, &PositionMap::new());
        assert_eq!(model.nodes.len(), 1);
        assert_eq!(model.nodes[0].label, "First");
    }

    #[test]
    fn empty_input_builds_empty_model() {
        let model = init(&GraphInput::default(), &PositionMap::new());
        assert!(model.is_empty());
        assert!(model.edges.is_empty());
    }

    #[test]
    fn node_state_flags() {
        assert!(!NodeState::Free.is_fixed());
        assert!(NodeState::Pinned.is_pinned());
        assert!(NodeState::Dragging { was_pinned: true }.is_pinned());
        assert!(!NodeState::Dragging { was_pinned: false }.is_pinned());
        assert!(NodeState::Dragging { was_pinned: false }.is_fixed());
    }

    #[test]
    fn bounds_clamp_and_degenerate_axis() {
        let bounds = Bounds::new(800.0, 40.0);
        assert_eq!(bounds.clamp(-5.0, 0.0, 30.0), (30.0, 20.0));
        assert_eq!(bounds.clamp(900.0, 100.0, 30.0), (770.0, 20.0));
        assert!(Bounds::new(800.0, 600.0).contains(400.0, 300.0, 30.0));
        assert!(!Bounds::new(800.0, 600.0).contains(10.0, 300.0, 30.0));
    }
}
