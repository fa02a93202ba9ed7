//! Label visibility policy
//!
//! Controls which node labels are drawn in the graph view.

use serde::{Deserialize, Serialize};

/// When node labels are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMode {
    /// Every node, as long as the view is zoomed in far enough
    #[default]
    Always,
    /// Only the hovered or dragged node
    Hovered,
    /// No labels at all
    Never,
}

/// Label visibility options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelPolicy {
    pub mode: LabelMode,
    /// Below this zoom, `Always` behaves like `Hovered`
    pub min_zoom: f32,
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self {
            mode: LabelMode::Always,
            min_zoom: 0.6,
        }
    }
}

impl LabelPolicy {
    /// Check whether a node's label should be drawn
    ///
    /// `focused` is true for the hovered or dragged node.
    pub fn show_label(&self, focused: bool, zoom: f32) -> bool {
        match self.mode {
            LabelMode::Never => false,
            LabelMode::Hovered => focused,
            LabelMode::Always => focused || zoom >= self.min_zoom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_shows_all_labels_at_normal_zoom() {
        let policy = LabelPolicy::default();
        assert!(policy.show_label(false, 1.0));
        assert!(policy.show_label(true, 1.0));
    }

    #[test]
    fn zoomed_out_hides_unfocused_labels() {
        let policy = LabelPolicy::default();
        assert!(!policy.show_label(false, 0.5));
        assert!(policy.show_label(true, 0.5));
    }

    #[test]
    fn hovered_mode_only_shows_focused() {
        let policy = LabelPolicy {
            mode: LabelMode::Hovered,
            ..Default::default()
        };
        assert!(!policy.show_label(false, 3.0));
        assert!(policy.show_label(true, 3.0));
    }

    #[test]
    fn never_mode_hides_everything() {
        let policy = LabelPolicy {
            mode: LabelMode::Never,
            ..Default::default()
        };
        assert!(!policy.show_label(true, 3.0));
    }
}
