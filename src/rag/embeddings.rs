//! Text embedding.
//!
//! [`FastEmbedder`] runs BGE-small-en-v1.5 locally through fastembed and is
//! what the server and the `ingest` command use. It ships with the default
//! `local-embeddings` feature.
//!
//! [`HashingEmbedder`] needs no model files. It hashes lowercase word tokens
//! into buckets, so it only captures shared vocabulary: two names with no
//! word in common are unrelated to it. Select it with
//! `embedding_provider = "hashing"` for offline runs; the test suites use it
//! for deterministic vectors.

use crate::types::{AppError, Result};
use crate::utils::toml_config::{EmbeddingProvider, RagConfig};
use std::sync::Arc;

/// Turns text into fixed-size vectors.
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    fn dimensions(&self) -> usize;

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("Embedder returned no vector".to_string()))
    }
}

/// Build the embedder selected in the RAG configuration.
pub fn create_embedder(config: &RagConfig) -> Result<Arc<dyn Embedder>> {
    match config.embedding_provider {
        EmbeddingProvider::Hashing => Ok(Arc::new(HashingEmbedder::new(
            config.embedding_dimensions,
        ))),
        #[cfg(feature = "local-embeddings")]
        EmbeddingProvider::Fastembed => Ok(Arc::new(FastEmbedder::new()?)),
        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingProvider::Fastembed => Err(AppError::Configuration(
            "embedding_provider = \"fastembed\" requires the 'local-embeddings' feature".into(),
        )),
    }
}

// ============= Hashing embedder =============

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        let tokens = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        for token in tokens {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            // High bit picks the sign so collisions partly cancel out
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

// ============= fastembed =============

#[cfg(feature = "local-embeddings")]
pub use local::FastEmbedder;

#[cfg(feature = "local-embeddings")]
mod local {
    use super::Embedder;
    use crate::types::{AppError, Result};
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use parking_lot::Mutex;

    /// BGE-small-en-v1.5 through fastembed; the model is downloaded on first use.
    pub struct FastEmbedder {
        model: Mutex<TextEmbedding>,
    }

    impl FastEmbedder {
        pub fn new() -> Result<Self> {
            let model = TextEmbedding::try_new(
                InitOptions::new(EmbeddingModel::BGESmallENV15).with_show_download_progress(true),
            )
            .map_err(|e| AppError::Configuration(format!("Failed to load embedding model: {}", e)))?;

            Ok(Self {
                model: Mutex::new(model),
            })
        }
    }

    impl Embedder for FastEmbedder {
        fn name(&self) -> &str {
            "fastembed/bge-small-en-v1.5"
        }

        fn dimensions(&self) -> usize {
            384
        }

        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let inputs: Vec<&str> = texts.iter().map(String::as_str).collect();
            self.model
                .lock()
                .embed(inputs, None)
                .map_err(|e| AppError::Internal(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_hashing_is_deterministic_and_normalised() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed_one("Model Context Protocol").unwrap();
        let b = embedder.embed_one("model context protocol").unwrap();

        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
        assert!((cosine(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_vocabulary_is_closer() {
        let embedder = HashingEmbedder::new(384);
        let query = embedder.embed_one("retrieval augmented generation").unwrap();
        let related = embedder
            .embed_one("This lesson covers retrieval augmented generation pipelines")
            .unwrap();
        let unrelated = embedder.embed_one("Baking sourdough bread at home").unwrap();

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(8);
        let v = embedder.embed_one("  ...  ").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_default_provider_is_fastembed() {
        assert_eq!(
            RagConfig::default().embedding_provider,
            EmbeddingProvider::Fastembed
        );
    }

    #[test]
    fn test_create_embedder_hashing_opt_in() {
        let config = RagConfig {
            embedding_provider: EmbeddingProvider::Hashing,
            embedding_dimensions: 128,
            ..RagConfig::default()
        };
        let embedder = create_embedder(&config).unwrap();

        assert_eq!(embedder.name(), "hashing");
        assert_eq!(embedder.dimensions(), 128);
    }

    #[cfg(not(feature = "local-embeddings"))]
    #[test]
    fn test_fastembed_without_feature_is_config_error() {
        let result = create_embedder(&RagConfig::default());
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
