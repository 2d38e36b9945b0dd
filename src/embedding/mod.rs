//! Embedding generation for semantic retrieval.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::AulaError;

    /// Deterministic embedder for tests: hashes text bytes into a tiny vector,
    /// or fails on demand.
    pub struct MockEmbedder {
        pub fail: bool,
    }

    impl MockEmbedder {
        pub fn new() -> Self {
            Self { fail: false }
        }

        pub fn failing() -> Self {
            Self { fail: true }
        }

        fn vector_for(text: &str) -> Vec<f32> {
            let sum: u32 = text.bytes().map(u32::from).sum();
            vec![1.0, (sum % 7) as f32, (sum % 13) as f32]
        }
    }

    #[async_trait]
    impl Embedder for MockEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if self.fail {
                return Err(AulaError::Embedding("mock embedder failure".to_string()));
            }
            Ok(Self::vector_for(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if self.fail {
                return Err(AulaError::Embedding("mock embedder failure".to_string()));
            }
            Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }
    }
}
