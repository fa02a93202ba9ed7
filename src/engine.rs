//! The engine instance a host view owns
//!
//! [`GraphEngine`] bundles the graph model, simulator, viewport, pointer
//! controller, renderer and persistence store for one view. Hosts feed it
//! pointer events in screen coordinates and drain [`EngineEvent`]s after
//! each call; the [`RenderLoop`](crate::render_loop::RenderLoop) drives
//! [`GraphEngine::frame`].
//!
//! Positions are written as a full snapshot once per completed gesture,
//! never per frame, so a stale write cannot overwrite a newer one.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::graph_types::GraphInput;
use crate::interaction::{Gesture, InteractionController, InteractionState, Modifiers, toggle_pin};
use crate::model::{Bounds, Edge, GraphModel, Node};
use crate::persistence::{PersistenceStore, PositionMap};
use crate::render::{Renderer, Scene, Surface};
use crate::simulation::{PhysicsSimulator, TickStats};
use crate::viewport::{BoundingBox, Viewport};

/// Padding used by [`GraphEngine::fit_to_view`]
pub const FIT_PADDING: f32 = 40.0;

/// Notifications for the host UI
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Pointer released over a node without dragging it
    NodeClicked(String),
    /// Pin flag toggled by double-click; already applied and persisted
    NodeDoubleClicked { id: String, pinned: bool },
    /// Hover target changed
    HoverChanged(Option<String>),
    /// Rectangle selection finished
    SelectionChanged(Vec<String>),
}

/// Result of one [`GraphEngine::frame`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameReport {
    /// False when the surface had no usable size; nothing was simulated
    pub drawn: bool,
    pub stats: TickStats,
}

/// One interactive graph view
pub struct GraphEngine {
    config: EngineConfig,
    model: GraphModel,
    simulator: PhysicsSimulator,
    viewport: Viewport,
    controller: InteractionController,
    renderer: Renderer,
    store: PersistenceStore,
    rng: StdRng,
    /// Unknown until the surface reports a size
    bounds: Option<Bounds>,
    /// Graph received before the surface was sized
    pending_input: Option<GraphInput>,
    selection: Vec<usize>,
    events: Vec<EngineEvent>,
    viewport_dirty: bool,
    generation: u64,
}

impl GraphEngine {
    pub fn new(config: EngineConfig, store: PersistenceStore) -> Self {
        Self::with_rng(config, store, StdRng::from_entropy())
    }

    /// Engine with reproducible initial jitter
    pub fn with_seed(config: EngineConfig, store: PersistenceStore, seed: u64) -> Self {
        Self::with_rng(config, store, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: EngineConfig, store: PersistenceStore, rng: StdRng) -> Self {
        let viewport = store
            .load_viewport(config.view)
            .unwrap_or_else(|| Viewport::new(config.view));
        Self {
            simulator: PhysicsSimulator::new(config.physics.clone()),
            controller: InteractionController::new(config.interaction.clone()),
            renderer: Renderer::new(config.labels),
            model: GraphModel::default(),
            viewport,
            store,
            rng,
            bounds: None,
            pending_input: None,
            selection: Vec::new(),
            events: Vec::new(),
            viewport_dirty: false,
            generation: 0,
            config,
        }
    }

    /// Replace the node set wholesale
    ///
    /// Saved positions are applied when the surface size is known; until
    /// then the input is held and initialized on the first [`resize`].
    ///
    /// [`resize`]: GraphEngine::resize
    pub fn set_graph(&mut self, input: GraphInput) {
        self.controller.reset();
        self.selection.clear();
        match self.bounds {
            Some(bounds) => self.initialize(&input, bounds),
            None => {
                debug!("surface not sized yet, deferring graph initialization");
                self.model = GraphModel::default();
                self.pending_input = Some(input);
            }
        }
        self.reheat();
    }

    fn initialize(&mut self, input: &GraphInput, bounds: Bounds) {
        let prior = self.store.load_positions().unwrap_or_default();
        self.model = GraphModel::initialize(
            input,
            &prior,
            bounds,
            &self.config.layout,
            &self.config.nodes,
            &mut self.rng,
        );
    }

    /// Update the layout area to the surface size in pixels
    ///
    /// Non-positive sizes are ignored. The first valid size initializes a
    /// deferred graph.
    pub fn resize(&mut self, width: f32, height: f32) {
        if !(width > 0.0 && height > 0.0 && width.is_finite() && height.is_finite()) {
            return;
        }
        let bounds = Bounds::new(width, height);
        if self.bounds == Some(bounds) {
            return;
        }
        debug!(width, height, "layout area resized");
        self.bounds = Some(bounds);
        if let Some(input) = self.pending_input.take() {
            self.initialize(&input, bounds);
            self.reheat();
        }
    }

    /// Run one physics tick; does nothing before the first resize
    pub fn simulate(&mut self) -> TickStats {
        match self.bounds {
            Some(bounds) => self
                .simulator
                .tick(&mut self.model.nodes, &self.model.edges, bounds),
            None => TickStats::default(),
        }
    }

    /// Draw the current state; false when the surface has no size
    pub fn draw(&self, surface: &mut dyn Surface) -> bool {
        let scene = Scene {
            nodes: &self.model.nodes,
            edges: &self.model.edges,
            viewport: &self.viewport,
            focused: self.controller.hovered(),
            selected: &self.selection,
            selection_rect: self.controller.selection_rect(),
        };
        self.renderer.draw(surface, &scene)
    }

    /// One loop iteration: track the surface size, simulate, draw, and
    /// flush a coalesced viewport write once no gesture is in progress
    pub fn frame(&mut self, surface: &mut dyn Surface) -> FrameReport {
        match surface.size() {
            Some((width, height)) if width > 0.0 && height > 0.0 => self.resize(width, height),
            _ => return FrameReport::default(),
        }
        let stats = self.simulate();
        let drawn = self.draw(surface);
        if self.viewport_dirty && !self.gesture_in_progress() {
            self.save_viewport();
        }
        FrameReport { drawn, stats }
    }

    pub fn pointer_down(&mut self, sx: f32, sy: f32, modifiers: Modifiers) {
        let gesture =
            self.controller
                .pointer_down(&mut self.model.nodes, &self.viewport, sx, sy, modifiers);
        self.apply(gesture);
    }

    pub fn pointer_move(&mut self, sx: f32, sy: f32) {
        let Some(bounds) = self.bounds else {
            return;
        };
        let gesture = self.controller.pointer_move(
            &mut self.model.nodes,
            &mut self.viewport,
            bounds,
            self.config.physics.margin,
            sx,
            sy,
        );
        self.apply(gesture);
    }

    pub fn pointer_up(&mut self, sx: f32, sy: f32) {
        let gesture = self
            .controller
            .pointer_up(&mut self.model.nodes, &self.viewport, sx, sy);
        self.apply(gesture);
    }

    /// Pointer left the surface mid-gesture
    pub fn pointer_cancel(&mut self) {
        let gesture = self.controller.pointer_cancel(&mut self.model.nodes);
        self.apply(gesture);
    }

    /// Wheel zoom toward the cursor; negative `delta_y` zooms in
    pub fn wheel(&mut self, sx: f32, sy: f32, delta_y: f32) {
        let gesture = self.controller.wheel(&mut self.viewport, sx, sy, delta_y);
        self.apply(gesture);
    }

    pub fn double_click(&mut self, sx: f32, sy: f32) {
        let gesture = self
            .controller
            .double_click(&mut self.model.nodes, &self.viewport, sx, sy);
        self.apply(gesture);
    }

    /// Toggle a node's pin flag by ID; returns the new flag, or `None` for
    /// an unknown ID
    ///
    /// Unlike [`double_click`](GraphEngine::double_click) this emits no
    /// event.
    pub fn toggle_pin(&mut self, id: &str) -> Option<bool> {
        let index = self.model.index_of(id)?;
        let pinned = toggle_pin(&mut self.model.nodes[index]);
        self.after_pin_change(pinned);
        Some(pinned)
    }

    fn after_pin_change(&mut self, pinned: bool) {
        self.save_positions();
        if !pinned {
            self.reheat();
        }
    }

    /// Centre and scale the viewport on the whole graph
    pub fn fit_to_view(&mut self) {
        let Some(bounds) = self.bounds else {
            return;
        };
        let bbox = BoundingBox::of_nodes(&self.model.nodes);
        self.viewport
            .fit_to_bounds(&bbox, bounds.width, bounds.height, FIT_PADDING);
        self.save_viewport();
    }

    /// Back to identity pan and zoom
    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.save_viewport();
    }

    /// Write any coalesced viewport change; call on teardown
    pub fn flush(&mut self) {
        if self.viewport_dirty {
            self.save_viewport();
        }
    }

    /// Persist every node's current position
    pub fn save_layout(&mut self) -> bool {
        self.save_positions()
    }

    /// Drain pending notifications
    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Restart the settling phase
    pub fn reheat(&mut self) {
        self.generation += 1;
    }

    /// Bumped whenever the layout should settle again
    pub fn layout_generation(&self) -> u64 {
        self.generation
    }

    pub fn positions(&self) -> PositionMap {
        self.model.positions()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.model.node(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.model.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.model.edges
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.controller.state()
    }

    pub fn is_dragging(&self) -> bool {
        self.controller.dragging().is_some()
    }

    /// IDs of the rectangle-selected nodes
    pub fn selected_ids(&self) -> Vec<String> {
        self.ids(&self.selection)
    }

    fn gesture_in_progress(&self) -> bool {
        matches!(
            self.controller.state(),
            InteractionState::Dragging { .. }
                | InteractionState::Panning { .. }
                | InteractionState::SelectingRect { .. }
        )
    }

    fn apply(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::None => {}
            Gesture::HoverChanged(index) => {
                let id = index.and_then(|i| self.model.nodes.get(i)).map(|n| n.id.clone());
                self.events.push(EngineEvent::HoverChanged(id));
            }
            Gesture::DragEnded { node, clicked } => {
                self.save_positions();
                if !clicked {
                    return;
                }
                if let Some(n) = self.model.nodes.get(node) {
                    debug!(id = %n.id, "node clicked");
                    self.events.push(EngineEvent::NodeClicked(n.id.clone()));
                }
            }
            Gesture::PanEnded { moved } => {
                self.save_positions();
                if moved || self.viewport_dirty {
                    self.save_viewport();
                }
            }
            Gesture::Zoomed => self.viewport_dirty = true,
            Gesture::PinToggled { node, pinned } => {
                if let Some(n) = self.model.nodes.get(node) {
                    info!(id = %n.id, pinned, "pin toggled");
                    self.events.push(EngineEvent::NodeDoubleClicked {
                        id: n.id.clone(),
                        pinned,
                    });
                }
                self.after_pin_change(pinned);
            }
            Gesture::Selected(indices) => {
                let ids = self.ids(&indices);
                self.selection = indices;
                self.events.push(EngineEvent::SelectionChanged(ids));
            }
        }
    }

    fn ids(&self, indices: &[usize]) -> Vec<String> {
        indices
            .iter()
            .filter_map(|&i| self.model.nodes.get(i))
            .map(|n| n.id.clone())
            .collect()
    }

    fn save_positions(&mut self) -> bool {
        let positions = self.model.positions();
        self.store.save_positions(&positions)
    }

    fn save_viewport(&mut self) {
        self.store.save_viewport(&self.viewport);
        self.viewport_dirty = false;
    }
}
