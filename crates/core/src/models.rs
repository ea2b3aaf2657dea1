use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageMetadata {
    pub manual: String,
    pub page: u32,
    pub source: String,
}

/// One physical page of a manual, as extracted at ingestion time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentPage {
    pub text: String,
    pub metadata: PageMetadata,
}

impl DocumentPage {
    pub fn manual(&self) -> &str {
        &self.metadata.manual
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub content: String,
    pub metadata: PageMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub content: String,
    pub metadata: PageMetadata,
    /// Cosine distance to the query, lower is closer.
    pub distance: f32,
}

impl RetrievalResult {
    pub fn manual(&self) -> &str {
        &self.metadata.manual
    }

    pub fn similarity(&self) -> f32 {
        crate::index::similarity_from_distance(self.distance)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    pub collection: String,
    pub embedder: String,
    pub dimensions: usize,
    pub record_count: usize,
    pub manuals: Vec<String>,
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum IndexState {
    Absent,
    Ready(IndexManifest),
}

impl IndexState {
    pub fn is_ready(&self) -> bool {
        matches!(self, IndexState::Ready(_))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn label(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            sent_at: Utc::now(),
        }
    }
}
