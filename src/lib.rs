//! conceptgraph - An interactive force-directed layout engine for concept graphs.
//!
//! This crate turns extracted concepts and weighted relationships into a
//! continuously refined 2D layout that can be drawn onto any [`Surface`],
//! panned, zoomed, dragged and pinned, with manual layout decisions
//! persisted across sessions.

pub mod config;
pub mod engine;
pub mod graph_types;
pub mod interaction;
pub mod labels;
pub mod model;
pub mod persistence;
pub mod render;
pub mod render_loop;
pub mod scheduler;
pub mod simulation;
pub mod svg;
pub mod viewport;

pub use config::EngineConfig;
pub use engine::{EngineEvent, GraphEngine};
pub use graph_types::{Concept, ConceptType, GraphInput, Relationship};
pub use interaction::Modifiers;
pub use persistence::{FileBackend, MemoryBackend, PersistenceStore};
pub use render::Surface;
pub use render_loop::RenderLoop;
pub use scheduler::{ManualScheduler, Scheduler};
pub use svg::SvgSurface;
pub use viewport::{ViewKind, Viewport};
