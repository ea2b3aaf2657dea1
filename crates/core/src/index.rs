use crate::collection;
use crate::traits::Embedder;
use crate::{
    DocumentPage, EmbeddingRecord, IndexError, IndexManifest, IndexState, RetrievalResult,
};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Fixed identifier stored in every manifest.
pub const COLLECTION_NAME: &str = "company-manuals";

pub const DEFAULT_TOP_K: usize = 3;

/// A persisted, fully built collection of page embeddings.
///
/// Search is a brute-force scan with cosine distance, which is plenty for a
/// folder of manuals.
#[derive(Debug)]
pub struct EmbeddingIndex {
    path: PathBuf,
    manifest: IndexManifest,
    records: Vec<EmbeddingRecord>,
}

impl EmbeddingIndex {
    pub fn state(path: &Path) -> Result<IndexState, IndexError> {
        if !collection::exists(path) {
            return Ok(IndexState::Absent);
        }
        Ok(IndexState::Ready(collection::read_manifest(path)?))
    }

    /// Replaces whatever is stored at `path` with embeddings of `pages`.
    ///
    /// The old tree is always deleted first. When `pages` is empty or any step
    /// fails, nothing is left behind and the index is absent.
    pub fn rebuild<E: Embedder>(
        pages: Vec<DocumentPage>,
        embedder: &E,
        path: &Path,
    ) -> Result<Self, IndexError> {
        if path.exists() {
            info!(path = %path.display(), "removing previous index");
        }
        collection::destroy(path)?;

        if pages.is_empty() {
            return Err(IndexError::EmptyRebuild);
        }

        match Self::build(pages, embedder, path) {
            Ok(index) => Ok(index),
            Err(error) => {
                if let Err(cleanup) = collection::destroy(path) {
                    warn!(
                        path = %path.display(),
                        error = %cleanup,
                        "could not remove partial index"
                    );
                }
                Err(error)
            }
        }
    }

    fn build<E: Embedder>(
        pages: Vec<DocumentPage>,
        embedder: &E,
        path: &Path,
    ) -> Result<Self, IndexError> {
        let dimensions = embedder.dimensions();
        info!(pages = pages.len(), embedder = %embedder.name(), "embedding pages");

        let mut records = Vec::with_capacity(pages.len());
        let mut manuals: Vec<String> = Vec::new();

        for page in pages {
            let vector = embedder.embed(&page.text)?;
            if vector.len() != dimensions {
                return Err(IndexError::DimensionMismatch {
                    expected: dimensions,
                    actual: vector.len(),
                });
            }

            if !manuals.contains(&page.metadata.manual) {
                manuals.push(page.metadata.manual.clone());
            }

            records.push(EmbeddingRecord {
                id: record_id(&page),
                vector,
                content: page.text,
                metadata: page.metadata,
            });
        }

        let manifest = IndexManifest {
            collection: COLLECTION_NAME.to_string(),
            embedder: embedder.name(),
            dimensions,
            record_count: records.len(),
            manuals,
            built_at: Utc::now(),
        };

        collection::write(path, &manifest, &records)?;
        info!(
            path = %path.display(),
            records = manifest.record_count,
            manuals = manifest.manuals.len(),
            "index written"
        );

        Ok(Self {
            path: path.to_path_buf(),
            manifest,
            records,
        })
    }

    pub fn open(path: &Path) -> Result<Self, IndexError> {
        if !collection::exists(path) {
            return Err(IndexError::NotIndexed(path.to_path_buf()));
        }

        let manifest = collection::read_manifest(path)?;
        if manifest.collection != COLLECTION_NAME {
            return Err(IndexError::CollectionMismatch {
                expected: COLLECTION_NAME.to_string(),
                found: manifest.collection,
            });
        }

        let records = collection::read_records(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            manifest,
            records,
        })
    }

    /// Up to `k` stored pages nearest to `text`, closest first.
    pub fn query<E: Embedder>(
        &self,
        text: &str,
        embedder: &E,
        k: usize,
    ) -> Result<Vec<RetrievalResult>, IndexError> {
        let embedder_name = embedder.name();
        if embedder_name != self.manifest.embedder {
            return Err(IndexError::EmbedderMismatch {
                expected: self.manifest.embedder.clone(),
                actual: embedder_name,
            });
        }

        if k == 0 || self.records.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = embedder.embed(text)?;
        if query_vector.len() != self.manifest.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.manifest.dimensions,
                actual: query_vector.len(),
            });
        }

        let mut scored = self
            .records
            .iter()
            .map(|record| (cosine_distance(&query_vector, &record.vector), record))
            .collect::<Vec<_>>();

        // stable: equal distances keep insertion order
        scored.sort_by(|left, right| left.0.total_cmp(&right.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(distance, record)| RetrievalResult {
                content: record.content.clone(),
                metadata: record.metadata.clone(),
                distance,
            })
            .collect())
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Opens the index at `path` and runs a single query against it.
pub fn query<E: Embedder>(
    text: &str,
    path: &Path,
    embedder: &E,
    k: usize,
) -> Result<Vec<RetrievalResult>, IndexError> {
    EmbeddingIndex::open(path)?.query(text, embedder, k)
}

/// `1 - cos(a, b)`. A zero vector is treated as unrelated to everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    (1.0 - dot / (norm_a * norm_b)).max(0.0)
}

/// Display relevance for a distance: `1 - distance`.
///
/// Only meaningful while distances stay in [0, 1], which holds for cosine
/// distance between embeddings with non-negative similarity (the trigram
/// embedder, and in practice sentence embedders). Opposed vectors can reach a
/// distance of 2 and show a negative relevance.
pub fn similarity_from_distance(distance: f32) -> f32 {
    1.0 - distance
}

fn record_id(page: &DocumentPage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(page.metadata.manual.as_bytes());
    hasher.update(page.metadata.page.to_le_bytes());
    hasher.update(page.text.as_bytes());
    format!("{:x}", hasher.finalize())
}
