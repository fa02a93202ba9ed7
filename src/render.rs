//! Drawing the graph onto a 2D surface
//!
//! The renderer is backend-agnostic: anything that implements [`Surface`]
//! (an HTML canvas binding, an immediate-mode painter, the bundled
//! [`SvgSurface`](crate::svg::SvgSurface)) can display the graph. The
//! renderer installs the viewport transform once per frame and then draws
//! in graph coordinates.

use crate::labels::LabelPolicy;
use crate::model::{Edge, Node};
use crate::viewport::{BoundingBox, Viewport};

const BACKGROUND: &str = "#1a1a2e";
const NODE_BORDER: &str = "rgba(255, 255, 255, 0.3)";
const FOCUS_BORDER: &str = "#FFFFFF";
const SELECTED_BORDER: &str = "#3B82F6";
const PIN_COLOR: &str = "#FFD700";
const LABEL_COLOR: &str = "rgba(255, 255, 255, 0.9)";
const SELECTION_FILL: &str = "rgba(59, 130, 246, 0.15)";

/// Outline style
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke<'a> {
    pub color: &'a str,
    pub width: f32,
}

/// A 2D drawing target
///
/// Coordinates passed after [`Surface::set_transform`] are in graph space;
/// the surface applies `translate(pan) * scale(zoom)` itself.
pub trait Surface {
    /// Drawable size in pixels, or `None` while the surface is not yet
    /// mounted or sized
    fn size(&self) -> Option<(f32, f32)>;

    /// Fill the whole surface, ignoring any transform
    fn clear(&mut self, color: &str);

    /// Replace the current transform
    fn set_transform(&mut self, pan_x: f32, pan_y: f32, zoom: f32);

    fn line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: &str);

    fn circle(&mut self, center: (f32, f32), radius: f32, fill: &str, stroke: Option<Stroke<'_>>);

    fn rect(&mut self, rect: &BoundingBox, fill: &str, stroke: Option<Stroke<'_>>);

    /// Left-aligned, vertically centred text
    fn text(&mut self, at: (f32, f32), text: &str, size: f32, color: &str);
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub nodes: &'a [Node],
    pub edges: &'a [Edge],
    pub viewport: &'a Viewport,
    /// Hovered or dragged node
    pub focused: Option<usize>,
    pub selected: &'a [usize],
    pub selection_rect: Option<BoundingBox>,
}

/// Draws a [`Scene`] onto a [`Surface`]
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    labels: LabelPolicy,
}

impl Renderer {
    pub fn new(labels: LabelPolicy) -> Self {
        Self { labels }
    }

    /// Draw the scene; returns `false` without touching the surface when it
    /// has no size yet
    pub fn draw(&self, surface: &mut dyn Surface, scene: &Scene<'_>) -> bool {
        match surface.size() {
            Some((w, h)) if w > 0.0 && h > 0.0 => {}
            _ => return false,
        }

        let zoom = scene.viewport.zoom;
        surface.clear(BACKGROUND);
        surface.set_transform(scene.viewport.pan_x, scene.viewport.pan_y, zoom);

        // Edges first (behind nodes)
        self.draw_edges(surface, scene);
        self.draw_nodes(surface, scene);
        self.draw_labels(surface, scene);

        if let Some(rect) = &scene.selection_rect {
            surface.rect(
                rect,
                SELECTION_FILL,
                Some(Stroke {
                    color: SELECTED_BORDER,
                    width: 1.0 / zoom,
                }),
            );
        }
        true
    }

    fn draw_edges(&self, surface: &mut dyn Surface, scene: &Scene<'_>) {
        let zoom = scene.viewport.zoom;
        for edge in scene.edges {
            let (Some(source), Some(target)) =
                (scene.nodes.get(edge.source), scene.nodes.get(edge.target))
            else {
                continue;
            };
            let color = format!("rgba(100, 100, 120, {:.2})", 0.3 + 0.5 * edge.strength);
            // Line weight is constant on screen, scaled by strength
            let width = (1.0 + 3.0 * edge.strength) / zoom;
            surface.line((source.x, source.y), (target.x, target.y), width, &color);
        }
    }

    fn draw_nodes(&self, surface: &mut dyn Surface, scene: &Scene<'_>) {
        let zoom = scene.viewport.zoom;
        for (i, node) in scene.nodes.iter().enumerate() {
            let stroke = if node.state.is_pinned() {
                Stroke {
                    color: PIN_COLOR,
                    width: 3.0 / zoom,
                }
            } else if scene.selected.contains(&i) {
                Stroke {
                    color: SELECTED_BORDER,
                    width: 2.0 / zoom,
                }
            } else if scene.focused == Some(i) {
                Stroke {
                    color: FOCUS_BORDER,
                    width: 2.0 / zoom,
                }
            } else {
                Stroke {
                    color: NODE_BORDER,
                    width: 1.0 / zoom,
                }
            };
            surface.circle(
                (node.x, node.y),
                node.radius,
                node.concept_type.color(),
                Some(stroke),
            );

            if node.state.is_pinned() {
                // Pin marker at the top-right of the circle
                let offset = node.radius * std::f32::consts::FRAC_1_SQRT_2;
                surface.circle(
                    (node.x + offset, node.y - offset),
                    3.0 / zoom,
                    PIN_COLOR,
                    None,
                );
            }
        }
    }

    fn draw_labels(&self, surface: &mut dyn Surface, scene: &Scene<'_>) {
        let zoom = scene.viewport.zoom;
        let font_size = (12.0 * zoom).clamp(8.0, 16.0) / zoom;
        for (i, node) in scene.nodes.iter().enumerate() {
            if !self.labels.show_label(scene.focused == Some(i), zoom) {
                continue;
            }
            let at = (node.x + node.radius + 4.0 / zoom, node.y);
            surface.text(at, &node.label, font_size, LABEL_COLOR);
        }
    }
}
