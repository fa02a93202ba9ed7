//! Pointer and wheel handling
//!
//! The controller is a small state machine:
//!
//! ```text
//! Idle <-> Hovering --down on node--> Dragging --up--> Hovering
//!    \         \----down on background--> Panning --up--> Idle
//!     \--------------shift+down---------> SelectingRect --up--> Idle
//! ```
//!
//! Wheel zoom is instantaneous and does not change state. Every handler
//! takes screen coordinates and converts them through the [`Viewport`];
//! nodes only ever receive graph coordinates.
//!
//! Handlers report what happened as a [`Gesture`] so the owner can persist
//! and notify once per gesture rather than once per event.

use crate::config::InteractionConfig;
use crate::hit_test::{find_node_at, nodes_in_rect};
use crate::model::{Bounds, Node, NodeState};
use crate::viewport::{BoundingBox, Viewport};

/// Keyboard modifiers held during a pointer event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Current pointer gesture
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Pointer is over a node, no button held
    Hovering { node: usize },
    /// A node follows the pointer
    Dragging {
        node: usize,
        last: (f32, f32),
        /// Cumulative screen-space movement since pointer-down
        travelled: f32,
    },
    /// The background follows the pointer
    Panning { last: (f32, f32), travelled: f32 },
    /// Rubber-band selection; corners in graph space
    SelectingRect {
        origin: (f32, f32),
        current: (f32, f32),
    },
}

/// What a handler did, for the owner to act on
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    /// Nothing the owner needs to react to
    #[default]
    None,
    /// Hover target changed
    HoverChanged(Option<usize>),
    /// A drag finished; `clicked` when it moved less than the click threshold
    DragEnded { node: usize, clicked: bool },
    /// A pan finished
    PanEnded { moved: bool },
    /// Wheel zoom changed the viewport
    Zoomed,
    /// Double-click flipped a node's pin flag
    PinToggled { node: usize, pinned: bool },
    /// Rubber-band selection finished
    Selected(Vec<usize>),
}

/// Pointer state machine over a node slice and a viewport
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    config: InteractionConfig,
    state: InteractionState,
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            state: InteractionState::Idle,
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Node under the pointer (hovered or dragged)
    pub fn hovered(&self) -> Option<usize> {
        match self.state {
            InteractionState::Hovering { node } | InteractionState::Dragging { node, .. } => {
                Some(node)
            }
            _ => None,
        }
    }

    /// Node currently held by the pointer
    pub fn dragging(&self) -> Option<usize> {
        match self.state {
            InteractionState::Dragging { node, .. } => Some(node),
            _ => None,
        }
    }

    /// Rubber-band rectangle in graph space, while selecting
    pub fn selection_rect(&self) -> Option<BoundingBox> {
        match self.state {
            InteractionState::SelectingRect { origin, current } => {
                Some(BoundingBox::from_corners(origin, current))
            }
            _ => None,
        }
    }

    /// Forget any gesture in progress, e.g. when the node set is replaced
    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
    }

    pub fn pointer_down(
        &mut self,
        nodes: &mut [Node],
        viewport: &Viewport,
        sx: f32,
        sy: f32,
        modifiers: Modifiers,
    ) -> Gesture {
        let (gx, gy) = viewport.screen_to_graph(sx, sy);

        if modifiers.shift {
            self.state = InteractionState::SelectingRect {
                origin: (gx, gy),
                current: (gx, gy),
            };
            return Gesture::None;
        }

        match find_node_at(nodes, gx, gy) {
            Some(index) if !modifiers.any() => {
                let node = &mut nodes[index];
                node.state = NodeState::Dragging {
                    was_pinned: node.state.is_pinned(),
                };
                node.vx = 0.0;
                node.vy = 0.0;
                self.state = InteractionState::Dragging {
                    node: index,
                    last: (sx, sy),
                    travelled: 0.0,
                };
            }
            _ => {
                self.state = InteractionState::Panning {
                    last: (sx, sy),
                    travelled: 0.0,
                };
            }
        }
        Gesture::None
    }

    pub fn pointer_move(
        &mut self,
        nodes: &mut [Node],
        viewport: &mut Viewport,
        bounds: Bounds,
        margin: f32,
        sx: f32,
        sy: f32,
    ) -> Gesture {
        match self.state {
            InteractionState::Idle | InteractionState::Hovering { .. } => {
                let (gx, gy) = viewport.screen_to_graph(sx, sy);
                let hovered = find_node_at(nodes, gx, gy);
                let previous = self.hovered();
                self.state = match hovered {
                    Some(node) => InteractionState::Hovering { node },
                    None => InteractionState::Idle,
                };
                if hovered != previous {
                    Gesture::HoverChanged(hovered)
                } else {
                    Gesture::None
                }
            }
            InteractionState::Dragging {
                node: index,
                last,
                travelled,
            } => {
                let (gx, gy) = viewport.screen_to_graph(sx, sy);
                if let Some(node) = nodes.get_mut(index) {
                    let (x, y) = bounds.clamp(gx, gy, margin);
                    node.x = x;
                    node.y = y;
                    node.vx = 0.0;
                    node.vy = 0.0;
                }
                self.state = InteractionState::Dragging {
                    node: index,
                    last: (sx, sy),
                    travelled: travelled + distance(last, (sx, sy)),
                };
                Gesture::None
            }
            InteractionState::Panning { last, travelled } => {
                viewport.pan_by(sx - last.0, sy - last.1);
                self.state = InteractionState::Panning {
                    last: (sx, sy),
                    travelled: travelled + distance(last, (sx, sy)),
                };
                Gesture::None
            }
            InteractionState::SelectingRect { origin, .. } => {
                self.state = InteractionState::SelectingRect {
                    origin,
                    current: viewport.screen_to_graph(sx, sy),
                };
                Gesture::None
            }
        }
    }

    pub fn pointer_up(
        &mut self,
        nodes: &mut [Node],
        viewport: &Viewport,
        sx: f32,
        sy: f32,
    ) -> Gesture {
        match self.state {
            InteractionState::Dragging {
                node, travelled, ..
            } => {
                release(nodes, node);
                self.state = InteractionState::Hovering { node };
                Gesture::DragEnded {
                    node,
                    clicked: travelled < self.config.click_threshold,
                }
            }
            InteractionState::Panning { travelled, .. } => {
                self.state = InteractionState::Idle;
                Gesture::PanEnded {
                    moved: travelled > 0.0,
                }
            }
            InteractionState::SelectingRect { origin, .. } => {
                let rect = BoundingBox::from_corners(origin, viewport.screen_to_graph(sx, sy));
                self.state = InteractionState::Idle;
                Gesture::Selected(nodes_in_rect(nodes, &rect))
            }
            InteractionState::Idle | InteractionState::Hovering { .. } => Gesture::None,
        }
    }

    /// Pointer left the surface or the platform cancelled the gesture
    ///
    /// Ends a drag or pan as if released, but never reports a click.
    pub fn pointer_cancel(&mut self, nodes: &mut [Node]) -> Gesture {
        let gesture = match self.state {
            InteractionState::Dragging { node, .. } => {
                release(nodes, node);
                Gesture::DragEnded {
                    node,
                    clicked: false,
                }
            }
            InteractionState::Panning { travelled, .. } => Gesture::PanEnded {
                moved: travelled > 0.0,
            },
            InteractionState::Hovering { .. } => Gesture::HoverChanged(None),
            InteractionState::Idle | InteractionState::SelectingRect { .. } => Gesture::None,
        };
        self.state = InteractionState::Idle;
        gesture
    }

    /// Zoom one notch toward the cursor; negative `delta_y` zooms in
    pub fn wheel(&mut self, viewport: &mut Viewport, sx: f32, sy: f32, delta_y: f32) -> Gesture {
        let factor = if delta_y < 0.0 {
            self.config.zoom_step
        } else if delta_y > 0.0 {
            1.0 / self.config.zoom_step
        } else {
            return Gesture::None;
        };
        if viewport.zoom_toward(sx, sy, factor) {
            Gesture::Zoomed
        } else {
            Gesture::None
        }
    }

    /// Toggle the pin flag of the node under the pointer
    pub fn double_click(
        &mut self,
        nodes: &mut [Node],
        viewport: &Viewport,
        sx: f32,
        sy: f32,
    ) -> Gesture {
        let (gx, gy) = viewport.screen_to_graph(sx, sy);
        let Some(index) = find_node_at(nodes, gx, gy) else {
            return Gesture::None;
        };
        let pinned = toggle_pin(&mut nodes[index]);
        Gesture::PinToggled {
            node: index,
            pinned,
        }
    }
}

/// Flip a node's pin flag, returning the new value
pub fn toggle_pin(node: &mut Node) -> bool {
    node.state = match node.state {
        NodeState::Free => NodeState::Pinned,
        NodeState::Pinned => NodeState::Free,
        NodeState::Dragging { was_pinned } => NodeState::Dragging {
            was_pinned: !was_pinned,
        },
    };
    node.vx = 0.0;
    node.vy = 0.0;
    node.state.is_pinned()
}

/// Hand a dragged node back to the simulator (or leave it pinned)
fn release(nodes: &mut [Node], index: usize) {
    if let Some(node) = nodes.get_mut(index) {
        node.state = if node.state.is_pinned() {
            NodeState::Pinned
        } else {
            NodeState::Free
        };
        node.vx = 0.0;
        node.vy = 0.0;
    }
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_types::ConceptType;
    use crate::viewport::ViewKind;

    const BOUNDS: Bounds = Bounds {
        width: 800.0,
        height: 600.0,
    };
    const MARGIN: f32 = 30.0;

    fn node(id: &str, x: f32, y: f32) -> Node {
        Node {
            id: id.to_string(),
            label: id.to_string(),
            concept_type: ConceptType::Concept,
            mention_count: 0,
            radius: 10.0,
            x,
            y,
            vx: 3.0,
            vy: -2.0,
            state: NodeState::Free,
        }
    }

    fn setup() -> (InteractionController, Vec<Node>, Viewport) {
        (
            InteractionController::default(),
            vec![node("a", 100.0, 100.0), node("b", 300.0, 200.0)],
            Viewport::new(ViewKind::Graph),
        )
    }

    #[test]
    fn drag_moves_node_in_graph_space() {
        let (mut ctl, mut nodes, _) = setup();
        let mut vp = Viewport::with_state(ViewKind::Graph, 50.0, 20.0, 2.0);
        // Node a at graph (100, 100) is at screen (250, 220)
        ctl.pointer_down(&mut nodes, &vp, 250.0, 220.0, Modifiers::NONE);

        assert_eq!(ctl.dragging(), Some(0));
        assert!(nodes[0].state.is_dragging());
        assert_eq!((nodes[0].vx, nodes[0].vy), (0.0, 0.0));

        ctl.pointer_move(&mut nodes, &mut vp, BOUNDS, MARGIN, 450.0, 420.0);
        assert_eq!((nodes[0].x, nodes[0].y), (200.0, 200.0));

        let gesture = ctl.pointer_up(&mut nodes, &vp, 450.0, 420.0);
        assert_eq!(
            gesture,
            Gesture::DragEnded {
                node: 0,
                clicked: false
            }
        );
        assert_eq!(nodes[0].state, NodeState::Free);
        assert_eq!(ctl.state(), InteractionState::Hovering { node: 0 });
    }

    #[test]
    fn small_movement_counts_as_click() {
        let (mut ctl, mut nodes, mut vp) = setup();
        ctl.pointer_down(&mut nodes, &vp, 300.0, 200.0, Modifiers::NONE);
        ctl.pointer_move(&mut nodes, &mut vp, BOUNDS, MARGIN, 302.0, 201.0);

        let gesture = ctl.pointer_up(&mut nodes, &vp, 302.0, 201.0);

        assert_eq!(
            gesture,
            Gesture::DragEnded {
                node: 1,
                clicked: true
            }
        );
    }

    #[test]
    fn movement_is_cumulative_for_click_detection() {
        let (mut ctl, mut nodes, mut vp) = setup();
        ctl.pointer_down(&mut nodes, &vp, 300.0, 200.0, Modifiers::NONE);
        ctl.pointer_move(&mut nodes, &mut vp, BOUNDS, MARGIN, 304.0, 200.0);
        ctl.pointer_move(&mut nodes, &mut vp, BOUNDS, MARGIN, 300.0, 200.0);

        let gesture = ctl.pointer_up(&mut nodes, &vp, 300.0, 200.0);

        assert_eq!(
            gesture,
            Gesture::DragEnded {
                node: 1,
                clicked: false
            }
        );
    }

    #[test]
    fn drag_is_clamped_to_bounds() {
        let (mut ctl, mut nodes, mut vp) = setup();
        ctl.pointer_down(&mut nodes, &vp, 100.0, 100.0, Modifiers::NONE);
        ctl.pointer_move(&mut nodes, &mut vp, BOUNDS, MARGIN, -50.0, 900.0);
        assert_eq!((nodes[0].x, nodes[0].y), (30.0, 570.0));
    }

    #[test]
    fn dragging_pinned_node_keeps_it_pinned() {
        let (mut ctl, mut nodes, mut vp) = setup();
        nodes[0].state = NodeState::Pinned;

        ctl.pointer_down(&mut nodes, &vp, 100.0, 100.0, Modifiers::NONE);
        assert_eq!(nodes[0].state, NodeState::Dragging { was_pinned: true });
        ctl.pointer_move(&mut nodes, &mut vp, BOUNDS, MARGIN, 150.0, 160.0);
        ctl.pointer_up(&mut nodes, &vp, 150.0, 160.0);

        assert_eq!(nodes[0].state, NodeState::Pinned);
        assert_eq!((nodes[0].x, nodes[0].y), (150.0, 160.0));
    }

    #[test]
    fn background_drag_pans() {
        let (mut ctl, mut nodes, mut vp) = setup();
        ctl.pointer_down(&mut nodes, &vp, 600.0, 500.0, Modifiers::NONE);
        assert!(matches!(ctl.state(), InteractionState::Panning { .. }));

        ctl.pointer_move(&mut nodes, &mut vp, BOUNDS, MARGIN, 620.0, 490.0);
        ctl.pointer_move(&mut nodes, &mut vp, BOUNDS, MARGIN, 640.0, 480.0);

        assert_eq!((vp.pan_x, vp.pan_y), (40.0, -20.0));
        // Nodes themselves do not move
        assert_eq!((nodes[0].x, nodes[0].y), (100.0, 100.0));
        assert_eq!(
            ctl.pointer_up(&mut nodes, &vp, 640.0, 480.0),
            Gesture::PanEnded { moved: true }
        );
        assert_eq!(ctl.state(), InteractionState::Idle);
    }

    #[test]
    fn modifier_on_node_does_not_drag() {
        let (mut ctl, mut nodes, vp) = setup();
        let modifiers = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        ctl.pointer_down(&mut nodes, &vp, 100.0, 100.0, modifiers);
        assert!(matches!(ctl.state(), InteractionState::Panning { .. }));
        assert_eq!(nodes[0].state, NodeState::Free);
    }

    #[test]
    fn hover_tracks_node_under_pointer() {
        let (mut ctl, mut nodes, mut vp) = setup();

        let g = ctl.pointer_move(&mut nodes, &mut vp, BOUNDS, MARGIN, 302.0, 198.0);
        assert_eq!(g, Gesture::HoverChanged(Some(1)));
        assert_eq!(ctl.hovered(), Some(1));

        let g = ctl.pointer_move(&mut nodes, &mut vp, BOUNDS, MARGIN, 303.0, 199.0);
        assert_eq!(g, Gesture::None);

        let g = ctl.pointer_move(&mut nodes, &mut vp, BOUNDS, MARGIN, 500.0, 500.0);
        assert_eq!(g, Gesture::HoverChanged(None));
        assert_eq!(ctl.state(), InteractionState::Idle);
    }

    #[test]
    fn wheel_zooms_toward_cursor() {
        let (mut ctl, _, mut vp) = setup();
        let before = vp.screen_to_graph(200.0, 150.0);

        assert_eq!(ctl.wheel(&mut vp, 200.0, 150.0, -120.0), Gesture::Zoomed);
        assert!((vp.zoom - 1.1).abs() < 1e-6);
        let after = vp.graph_to_screen(before.0, before.1);
        assert!((after.0 - 200.0).abs() < 1e-3 && (after.1 - 150.0).abs() < 1e-3);

        ctl.wheel(&mut vp, 200.0, 150.0, 120.0);
        assert!((vp.zoom - 1.0).abs() < 1e-5);
        assert_eq!(ctl.wheel(&mut vp, 200.0, 150.0, 0.0), Gesture::None);
    }

    #[test]
    fn wheel_at_limit_reports_nothing() {
        let (mut ctl, _, _) = setup();
        let mut vp = Viewport::with_state(ViewKind::Graph, 0.0, 0.0, 3.0);
        assert_eq!(ctl.wheel(&mut vp, 10.0, 10.0, -1.0), Gesture::None);
    }

    #[test]
    fn double_click_toggles_pin() {
        let (mut ctl, mut nodes, vp) = setup();

        let g = ctl.double_click(&mut nodes, &vp, 100.0, 100.0);
        assert_eq!(g, Gesture::PinToggled { node: 0, pinned: true });
        assert_eq!(nodes[0].state, NodeState::Pinned);

        let g = ctl.double_click(&mut nodes, &vp, 100.0, 100.0);
        assert_eq!(g, Gesture::PinToggled { node: 0, pinned: false });
        assert_eq!(nodes[0].state, NodeState::Free);

        assert_eq!(ctl.double_click(&mut nodes, &vp, 700.0, 10.0), Gesture::None);
    }

    #[test]
    fn shift_drag_selects_rectangle() {
        let (mut ctl, mut nodes, mut vp) = setup();
        ctl.pointer_down(&mut nodes, &vp, 50.0, 50.0, Modifiers::shift());
        ctl.pointer_move(&mut nodes, &mut vp, BOUNDS, MARGIN, 350.0, 150.0);

        let rect = ctl.selection_rect().unwrap();
        assert_eq!((rect.min_x, rect.max_x), (50.0, 350.0));

        let g = ctl.pointer_up(&mut nodes, &vp, 350.0, 150.0);
        assert_eq!(g, Gesture::Selected(vec![0]));
        assert!(ctl.selection_rect().is_none());
        assert_eq!((vp.pan_x, vp.pan_y), (0.0, 0.0));
    }

    #[test]
    fn cancel_ends_drag_without_click() {
        let (mut ctl, mut nodes, vp) = setup();
        ctl.pointer_down(&mut nodes, &vp, 100.0, 100.0, Modifiers::NONE);

        let g = ctl.pointer_cancel(&mut nodes);

        assert_eq!(
            g,
            Gesture::DragEnded {
                node: 0,
                clicked: false
            }
        );
        assert_eq!(nodes[0].state, NodeState::Free);
        assert_eq!(ctl.state(), InteractionState::Idle);
    }

    #[test]
    fn stale_drag_index_is_harmless() {
        let (mut ctl, mut nodes, mut vp) = setup();
        ctl.pointer_down(&mut nodes, &vp, 300.0, 200.0, Modifiers::NONE);
        nodes.truncate(1);

        ctl.pointer_move(&mut nodes, &mut vp, BOUNDS, MARGIN, 320.0, 220.0);
        let g = ctl.pointer_up(&mut nodes, &vp, 320.0, 220.0);

        assert!(matches!(g, Gesture::DragEnded { node: 1, .. }));
    }
}
