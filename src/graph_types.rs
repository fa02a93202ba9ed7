//! Input types produced by the concept-extraction service
//!
//! These are the only shapes the engine accepts from outside. Field names
//! follow the camelCase JSON the extraction service emits.

use serde::{Deserialize, Serialize};

/// Fill colors for concept types (CSS hex)
pub mod colors {
    /// Generic concepts: Blue (#4A90D9)
    pub const CONCEPT: &str = "#4A90D9";

    /// People: Orange (#E67E22)
    pub const PERSON: &str = "#E67E22";

    /// Organizations: Purple (#9B59B6)
    pub const ORGANIZATION: &str = "#9B59B6";

    /// Places: Green (#50C878)
    pub const LOCATION: &str = "#50C878";

    /// Events: Red (#E74C3C)
    pub const EVENT: &str = "#E74C3C";

    /// Technologies and tools: Teal (#1ABC9C)
    pub const TECHNOLOGY: &str = "#1ABC9C";

    /// Anything the extractor labelled with an unknown type: Grey (#95A5A6)
    pub const OTHER: &str = "#95A5A6";
}

/// Strength given to edges derived only from `related_concept_ids`
pub const IMPLICIT_EDGE_STRENGTH: f32 = 0.5;

/// Semantic category of a concept, drives the node fill color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptType {
    #[default]
    Concept,
    Person,
    Organization,
    Location,
    Event,
    Technology,
    #[serde(other)]
    Other,
}

impl ConceptType {
    /// Get the fill color for this concept type
    pub fn color(&self) -> &'static str {
        match self {
            ConceptType::Concept => colors::CONCEPT,
            ConceptType::Person => colors::PERSON,
            ConceptType::Organization => colors::ORGANIZATION,
            ConceptType::Location => colors::LOCATION,
            ConceptType::Event => colors::EVENT,
            ConceptType::Technology => colors::TECHNOLOGY,
            ConceptType::Other => colors::OTHER,
        }
    }
}

/// A concept extracted from the source documents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    /// Stable identifier, also the persistence key
    pub id: String,

    /// Human-readable name shown as the node label
    pub name: String,

    /// Concept category
    #[serde(rename = "type", default)]
    pub concept_type: ConceptType,

    /// How often the concept was mentioned; drives node radius
    #[serde(default)]
    pub mention_count: u32,

    /// Other concepts this one is associated with
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_concept_ids: Vec<String>,
}

/// A weighted relationship between two concepts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    /// Source concept ID
    pub source_id: String,

    /// Target concept ID
    pub target_id: String,

    /// Relationship strength in `[0, 1]`
    #[serde(default = "default_strength")]
    pub strength: f32,
}

fn default_strength() -> f32 {
    1.0
}

/// Complete extraction output for one graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphInput {
    /// All concepts
    #[serde(default)]
    pub concepts: Vec<Concept>,

    /// All explicit relationships
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl GraphInput {
    /// Parse extraction output from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Concept {
    /// Shorthand used by tests and demos
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            concept_type: ConceptType::Concept,
            mention_count: 0,
            related_concept_ids: Vec::new(),
        }
    }

    /// Set mention count
    pub fn with_mentions(mut self, mention_count: u32) -> Self {
        self.mention_count = mention_count;
        self
    }

    /// Set concept type
    pub fn with_type(mut self, concept_type: ConceptType) -> Self {
        self.concept_type = concept_type;
        self
    }
}

impl Relationship {
    /// Create a relationship with the given strength
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, strength: f32) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            strength,
        }
    }
}
