use crate::providers::{GeminiChatModel, GeminiClient, GeminiEmbedder, DEFAULT_API_BASE_URL};
use crate::traits::Embedder;
use crate::{
    CharacterNgramEmbedder, ConfigError, ModelError, DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_TOP_K,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    Ngram,
    Gemini,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimensions: usize,
}

/// Settings read once at startup and handed to every component that needs them.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub api_base_url: String,
    pub chat_model: String,
    pub embedding: EmbeddingSettings,
    pub index_path: PathBuf,
    pub source_directory: PathBuf,
    pub top_k: usize,
    pub request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(alias = "KEY")]
    api_key: Option<String>,
    api_base_url: Option<String>,
    chat_model: Option<String>,
    #[serde(default)]
    embedding: RawEmbedding,
    index_path: Option<PathBuf>,
    source_directory: Option<PathBuf>,
    top_k: Option<usize>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEmbedding {
    provider: Option<EmbeddingProvider>,
    model: Option<String>,
    dimensions: Option<usize>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_yaml(&contents, base)
    }

    /// Parses YAML text; relative paths are resolved against `base`.
    pub fn from_yaml(contents: &str, base: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(contents)?;

        let api_key = raw
            .api_key
            .ok_or(ConfigError::MissingKey("api_key"))?
            .trim()
            .to_string();
        if api_key.is_empty() {
            return Err(ConfigError::Invalid {
                key: "api_key",
                details: "must not be blank".to_string(),
            });
        }

        let api_base_url = raw
            .api_base_url
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        url::Url::parse(&api_base_url).map_err(|error| ConfigError::Invalid {
            key: "api_base_url",
            details: error.to_string(),
        })?;

        let top_k = raw.top_k.unwrap_or(DEFAULT_TOP_K);
        if top_k == 0 {
            return Err(ConfigError::Invalid {
                key: "top_k",
                details: "must be at least 1".to_string(),
            });
        }

        let provider = raw.embedding.provider.unwrap_or(EmbeddingProvider::Ngram);
        let dimensions = raw.embedding.dimensions.unwrap_or(match provider {
            EmbeddingProvider::Ngram => DEFAULT_EMBEDDING_DIMENSIONS,
            EmbeddingProvider::Gemini => 768,
        });
        if dimensions == 0 {
            return Err(ConfigError::Invalid {
                key: "embedding.dimensions",
                details: "must be at least 1".to_string(),
            });
        }

        let request_timeout_secs = raw.request_timeout_secs.unwrap_or(60);
        if request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "request_timeout_secs",
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            api_key,
            api_base_url,
            chat_model: raw
                .chat_model
                .unwrap_or_else(|| "gemini-2.0-flash".to_string()),
            embedding: EmbeddingSettings {
                provider,
                model: raw
                    .embedding
                    .model
                    .unwrap_or_else(|| "text-embedding-004".to_string()),
                dimensions,
            },
            index_path: resolve(
                base,
                raw.index_path.unwrap_or_else(|| PathBuf::from("index_db")),
            ),
            source_directory: resolve(
                base,
                raw.source_directory.unwrap_or_else(|| PathBuf::from("manuals")),
            ),
            top_k,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    fn client(&self) -> Result<GeminiClient, ModelError> {
        GeminiClient::new(&self.api_base_url, self.api_key.clone(), self.request_timeout)
    }

    pub fn chat_model(&self) -> Result<GeminiChatModel, ModelError> {
        Ok(GeminiChatModel::new(self.client()?, self.chat_model.clone()))
    }

    pub fn embedder(&self) -> Result<Box<dyn Embedder>, ModelError> {
        Ok(match self.embedding.provider {
            EmbeddingProvider::Ngram => {
                Box::new(CharacterNgramEmbedder::new(self.embedding.dimensions))
            }
            EmbeddingProvider::Gemini => Box::new(GeminiEmbedder::new(
                self.client()?,
                self.embedding.model.clone(),
                self.embedding.dimensions,
            )),
        })
    }
}

fn resolve(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
