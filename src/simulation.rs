//! CPU force simulation for graph layout
//!
//! Each tick accumulates three forces into the velocity of every free node
//! (centering, pairwise inverse-square repulsion, and springs along edges),
//! then damps and integrates. Forces are computed from a snapshot of the
//! positions at the start of the tick, so node order does not bias the
//! result.
//!
//! Repulsion is all-pairs, O(n²). That is fine for a few hundred concepts;
//! anything much larger would need a spatial index.

use crate::config::PhysicsConfig;
use crate::model::{Bounds, Edge, Node, NodeState};

/// Summary of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickStats {
    /// Sum of `vx² + vy²` over free nodes after integration
    pub kinetic_energy: f32,
    /// Number of nodes the tick was allowed to move
    pub free_nodes: usize,
}

/// Force-directed layout integrator
#[derive(Debug, Clone, Default)]
pub struct PhysicsSimulator {
    config: PhysicsConfig,
    /// Per-node velocity change accumulated during a tick
    forces: Vec<(f32, f32)>,
}

impl PhysicsSimulator {
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            forces: Vec::new(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Run one simulation tick, mutating free nodes in place
    ///
    /// Pinned and dragged nodes are never moved but still repel and pull
    /// on their neighbours. Edges whose endpoints are out of range are
    /// ignored.
    pub fn tick(&mut self, nodes: &mut [Node], edges: &[Edge], bounds: Bounds) -> TickStats {
        let n = nodes.len();
        if n == 0 {
            return TickStats::default();
        }

        self.forces.clear();
        self.forces.resize(n, (0.0, 0.0));

        self.apply_center_force(nodes, bounds);
        self.apply_repulsion(nodes);
        self.apply_springs(nodes, edges);

        self.integrate(nodes, bounds)
    }

    /// Pull free nodes toward the centre of the bounds
    fn apply_center_force(&mut self, nodes: &[Node], bounds: Bounds) {
        let (cx, cy) = bounds.center();
        for (node, force) in nodes.iter().zip(self.forces.iter_mut()) {
            if node.state != NodeState::Free {
                continue;
            }
            force.0 += (cx - node.x) * self.config.center_force;
            force.1 += (cy - node.y) * self.config.center_force;
        }
    }

    /// Push every free node away from every other node
    fn apply_repulsion(&mut self, nodes: &[Node]) {
        let n = nodes.len();
        for i in 0..n {
            if nodes[i].state != NodeState::Free {
                continue;
            }
            let (mut fx, mut fy) = (0.0, 0.0);
            for j in 0..n {
                if i == j {
                    continue;
                }
                let dx = nodes[i].x - nodes[j].x;
                let dy = nodes[i].y - nodes[j].y;
                let dist = (dx * dx + dy * dy).sqrt();

                // Coincident nodes get a deterministic direction so they separate
                let (ux, uy) = if dist > 0.0 {
                    (dx / dist, dy / dist)
                } else {
                    let angle = (i.min(j) as f32 + 1.0) * 2.399_963;
                    let sign = if i < j { 1.0 } else { -1.0 };
                    (sign * angle.cos(), sign * angle.sin())
                };

                let floored = dist.max(1.0);
                let force = self.config.repulsion / (floored * floored);
                fx += ux * force;
                fy += uy * force;
            }
            self.forces[i].0 += fx;
            self.forces[i].1 += fy;
        }
    }

    /// Hooke springs along edges, scaled by edge strength
    fn apply_springs(&mut self, nodes: &[Node], edges: &[Edge]) {
        let n = nodes.len();
        for edge in edges {
            let (s, t) = (edge.source, edge.target);
            if s >= n || t >= n || s == t {
                continue;
            }

            let dx = nodes[t].x - nodes[s].x;
            let dy = nodes[t].y - nodes[s].y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist <= f32::EPSILON {
                continue;
            }

            let stretch = dist - self.config.rest_length;
            let force = stretch * self.config.attraction * edge.strength;
            let fx = force * dx / dist;
            let fy = force * dy / dist;

            if nodes[s].state == NodeState::Free {
                self.forces[s].0 += fx;
                self.forces[s].1 += fy;
            }
            if nodes[t].state == NodeState::Free {
                self.forces[t].0 -= fx;
                self.forces[t].1 -= fy;
            }
        }
    }

    /// Apply accumulated forces, damping, and the bounds clamp
    fn integrate(&mut self, nodes: &mut [Node], bounds: Bounds) -> TickStats {
        let margin = self.config.margin;
        let mut stats = TickStats::default();

        for (node, &(fx, fy)) in nodes.iter_mut().zip(self.forces.iter()) {
            if node.state != NodeState::Free {
                continue;
            }
            stats.free_nodes += 1;

            let vx = (node.vx + fx) * self.config.damping;
            let vy = (node.vy + fy) * self.config.damping;
            let (x, y) = bounds.clamp(node.x + vx, node.y + vy, margin);
            if !(x.is_finite() && y.is_finite() && vx.is_finite() && vy.is_finite()) {
                node.vx = 0.0;
                node.vy = 0.0;
                continue;
            }

            // Velocity into a wall is absorbed by it
            node.vx = if x == node.x + vx { vx } else { 0.0 };
            node.vy = if y == node.y + vy { vy } else { 0.0 };
            node.x = x;
            node.y = y;

            stats.kinetic_energy += node.vx * node.vx + node.vy * node.vy;
        }

        stats
    }

    /// Tick until kinetic energy drops below `energy_threshold` or
    /// `max_ticks` is reached; returns the number of ticks run
    pub fn run_to_convergence(
        &mut self,
        nodes: &mut [Node],
        edges: &[Edge],
        bounds: Bounds,
        max_ticks: usize,
        energy_threshold: f32,
    ) -> usize {
        for tick in 0..max_ticks {
            let stats = self.tick(nodes, edges, bounds);
            if stats.kinetic_energy < energy_threshold {
                return tick + 1;
            }
        }
        max_ticks
    }
}
