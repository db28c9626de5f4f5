use serde::{Deserialize, Serialize};

/// A source excerpt backing one completed assistant answer.
///
/// Arrives as a batch in the terminal `metadata` stream event; never
/// mutated afterwards, replaced wholesale on the next answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextChunk {
    pub chunk_id: i64,
    pub text: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynasty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// An edge of the relationship graph extracted from an answer.
/// Same batch lifecycle as [`ContextChunk`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphLink {
    pub relation: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<i64>,
}
