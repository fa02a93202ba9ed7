//! Engine configuration
//!
//! Every section has working defaults, so an empty YAML document (or no
//! file at all) yields the stock engine. Sections can be overridden
//! individually:
//!
//! ```yaml
//! physics:
//!   repulsion: 3000.0
//! render_loop:
//!   settle_mode: energy
//!   energy_threshold: 0.5
//! view: board
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::labels::LabelPolicy;
use crate::viewport::ViewKind;

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid YAML for this schema
    #[error("parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Force constants for the layout simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Pull toward the centre of the bounds, per unit of offset
    pub center_force: f32,
    /// Inverse-square repulsion constant between every node pair
    pub repulsion: f32,
    /// Spring rest length along edges
    pub rest_length: f32,
    /// Spring constant, scaled by edge strength
    pub attraction: f32,
    /// Velocity multiplier applied every tick (friction)
    pub damping: f32,
    /// Nodes are kept at least this far from the bounds edges
    pub margin: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            center_force: 0.001,
            repulsion: 2000.0,
            rest_length: 100.0,
            attraction: 0.05,
            damping: 0.9,
            margin: 30.0,
        }
    }
}

/// Initial placement of nodes without a saved position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Circle radius as a fraction of `min(width, height)`
    pub circle_ratio: f32,
    /// Maximum random offset on each axis
    pub jitter: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            circle_ratio: 0.3,
            jitter: 25.0,
        }
    }
}

/// Node sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeStyle {
    pub base_radius: f32,
    /// Added per `ln(mentions + 1)`
    pub radius_scale: f32,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            base_radius: 8.0,
            radius_scale: 4.0,
        }
    }
}

impl NodeStyle {
    /// Visual (and hit-test) radius for a node with the given mention count
    pub fn radius_for(&self, mention_count: u32) -> f32 {
        self.base_radius + (mention_count as f32 + 1.0).ln() * self.radius_scale
    }
}

/// Pointer handling thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// A drag that moves less than this many screen pixels is a click
    pub click_threshold: f32,
    /// Zoom multiplier per wheel notch
    pub zoom_step: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            click_threshold: 5.0,
            zoom_step: 1.1,
        }
    }
}

/// How the render loop decides the layout has settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleMode {
    /// Settled after a fixed number of full-rate frames
    #[default]
    Frames,
    /// Settled once kinetic energy drops below `energy_threshold`
    /// (still capped by `settle_frames`)
    Energy,
}

/// Frame scheduling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Full-rate frames after (re)initialization
    pub settle_frames: u32,
    /// Interval between frames once settled
    pub throttle_ms: u64,
    pub settle_mode: SettleMode,
    /// Total `v²` below which the layout counts as settled in energy mode
    pub energy_threshold: f32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            settle_frames: 100,
            throttle_ms: 100,
            settle_mode: SettleMode::Frames,
            energy_threshold: 0.5,
        }
    }
}

impl LoopConfig {
    /// Throttled frame interval
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub physics: PhysicsConfig,
    pub layout: LayoutConfig,
    pub nodes: NodeStyle,
    pub interaction: InteractionConfig,
    pub render_loop: LoopConfig,
    pub labels: LabelPolicy,
    pub view: ViewKind,
}

impl EngineConfig {
    /// Parse configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> ConfigResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }
}
