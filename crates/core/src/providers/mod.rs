pub mod gemini;

pub use gemini::{GeminiChatModel, GeminiClient, GeminiEmbedder, DEFAULT_API_BASE_URL};
