//! Viewport transform between screen and graph coordinates
//!
//! The viewport is the only place screen pixels and graph units meet.
//! Rendering applies `translate(pan) * scale(zoom)`; pointer input goes
//! through [`Viewport::screen_to_graph`] before anything else sees it.

use serde::{Deserialize, Serialize};

use crate::model::Node;

/// Which surface a viewport belongs to; each has its own zoom range and
/// its own persisted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    #[default]
    Graph,
    Board,
}

impl ViewKind {
    /// Allowed `(min, max)` zoom
    pub fn zoom_range(&self) -> (f32, f32) {
        match self {
            ViewKind::Graph => (0.5, 3.0),
            ViewKind::Board => (0.25, 2.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Graph => "graph",
            ViewKind::Board => "board",
        }
    }
}

/// Pan offset (screen pixels) and zoom factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    kind: ViewKind,
    pub pan_x: f32,
    pub pan_y: f32,
    pub zoom: f32,
}

impl Viewport {
    /// Identity viewport
    pub fn new(kind: ViewKind) -> Self {
        Self {
            kind,
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: 1.0,
        }
    }

    /// Viewport with the given state; zoom is clamped to the kind's range
    pub fn with_state(kind: ViewKind, pan_x: f32, pan_y: f32, zoom: f32) -> Self {
        let mut viewport = Self {
            kind,
            pan_x,
            pan_y,
            zoom: 1.0,
        };
        viewport.zoom = viewport.clamp_zoom(zoom);
        viewport
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    fn clamp_zoom(&self, zoom: f32) -> f32 {
        let (min, max) = self.kind.zoom_range();
        zoom.clamp(min, max)
    }

    /// Convert screen pixels to graph coordinates
    pub fn screen_to_graph(&self, sx: f32, sy: f32) -> (f32, f32) {
        ((sx - self.pan_x) / self.zoom, (sy - self.pan_y) / self.zoom)
    }

    /// Convert graph coordinates to screen pixels
    pub fn graph_to_screen(&self, gx: f32, gy: f32) -> (f32, f32) {
        (gx * self.zoom + self.pan_x, gy * self.zoom + self.pan_y)
    }

    /// Pan the view by a screen-space delta
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Multiply zoom by `factor`, keeping the graph point under the cursor
    /// fixed on screen
    ///
    /// Returns whether the zoom actually changed (it may already sit at a
    /// limit of the range).
    pub fn zoom_toward(&mut self, cursor_x: f32, cursor_y: f32, factor: f32) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        self.zoom_to(cursor_x, cursor_y, self.zoom * factor)
    }

    /// Set an absolute zoom around the cursor
    pub fn zoom_to(&mut self, cursor_x: f32, cursor_y: f32, zoom: f32) -> bool {
        let new_zoom = self.clamp_zoom(zoom);
        if new_zoom == self.zoom {
            return false;
        }
        let ratio = new_zoom / self.zoom;
        self.pan_x = cursor_x - (cursor_x - self.pan_x) * ratio;
        self.pan_y = cursor_y - (cursor_y - self.pan_y) * ratio;
        self.zoom = new_zoom;
        true
    }

    /// Reset to the identity transform
    pub fn reset(&mut self) {
        self.pan_x = 0.0;
        self.pan_y = 0.0;
        self.zoom = 1.0;
    }

    /// Centre `bounds` on a `width` x `height` surface, scaled to fit
    /// inside `padding` pixels on every side
    pub fn fit_to_bounds(&mut self, bounds: &BoundingBox, width: f32, height: f32, padding: f32) {
        if bounds.is_empty() {
            return;
        }

        let available_width = (width - 2.0 * padding).max(1.0);
        let available_height = (height - 2.0 * padding).max(1.0);
        let zoom = (available_width / bounds.width()).min(available_height / bounds.height());
        self.zoom = self.clamp_zoom(zoom);

        let (cx, cy) = bounds.center();
        self.pan_x = width / 2.0 - cx * self.zoom;
        self.pan_y = height / 2.0 - cy * self.zoom;
    }
}

/// Axis-aligned bounding box in graph space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl BoundingBox {
    pub fn empty() -> Self {
        Self {
            min_x: f32::INFINITY,
            max_x: f32::NEG_INFINITY,
            min_y: f32::INFINITY,
            max_y: f32::NEG_INFINITY,
        }
    }

    /// Box spanning two corner points in any order
    pub fn from_corners(a: (f32, f32), b: (f32, f32)) -> Self {
        Self {
            min_x: a.0.min(b.0),
            max_x: a.0.max(b.0),
            min_y: a.1.min(b.1),
            max_y: a.1.max(b.1),
        }
    }

    /// Smallest box containing every node's circle
    pub fn of_nodes(nodes: &[Node]) -> Self {
        let mut bounds = Self::empty();
        for node in nodes {
            bounds.include_circle(node.x, node.y, node.radius);
        }
        bounds
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn include_circle(&mut self, x: f32, y: f32, radius: f32) {
        self.min_x = self.min_x.min(x - radius);
        self.max_x = self.max_x.max(x + radius);
        self.min_y = self.min_y.min(y - radius);
        self.max_y = self.max_y.max(y + radius);
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Width, at least 1 to keep fit calculations finite
    pub fn width(&self) -> f32 {
        (self.max_x - self.min_x).max(1.0)
    }

    /// Height, at least 1
    pub fn height(&self) -> f32 {
        (self.max_y - self.min_y).max(1.0)
    }

    pub fn center(&self) -> (f32, f32) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}
