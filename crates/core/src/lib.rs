pub mod collection;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod index;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod providers;
pub mod session;
pub mod synthesizer;
pub mod traits;

#[cfg(test)]
mod testing;

pub use config::{AppConfig, EmbeddingProvider, EmbeddingSettings, DEFAULT_CONFIG_FILE};
pub use embeddings::{CharacterNgramEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{AssistantError, ConfigError, IndexError, IngestError, ModelError};
pub use extractor::{extract_page_texts, LopdfExtractor, PageText, PdfExtractor};
pub use index::{
    cosine_distance, query, similarity_from_distance, EmbeddingIndex, COLLECTION_NAME,
    DEFAULT_TOP_K,
};
pub use ingest::{
    discover_manuals, ingest, ingest_best_effort, ingest_files, manual_name, IngestionReport,
    SkippedPdf,
};
pub use models::{
    ChatMessage, ChatRole, DocumentPage, EmbeddingRecord, IndexManifest, IndexState,
    PageMetadata, RetrievalResult,
};
pub use orchestrator::{Answer, IndexProgress, IndexSummary, ManualAssistant};
pub use providers::{GeminiChatModel, GeminiClient, GeminiEmbedder};
pub use session::{Answerer, ChatSession, INDEX_FIRST_MESSAGE};
pub use synthesizer::{synthesize, CONTEXT_CHAR_BUDGET, NO_RELEVANT_INFORMATION};
pub use traits::{ChatModel, Embedder};
