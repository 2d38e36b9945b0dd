//! Query-time retrieval over the vector store.
//!
//! Embeds a standalone query and returns the top-k most similar document
//! chunks. Retrieval policy is plain top-k by cosine similarity; an empty
//! result set is a valid outcome, not an error.

use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorStore;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Default number of chunks fetched per query.
pub const DEFAULT_TOP_K: usize = 4;

/// A document chunk returned for a query. Produced fresh per request.
#[derive(Debug, Clone)]
pub struct RetrievedDocument {
    /// Source identifier of the chunk.
    pub source: String,
    /// Text content.
    pub content: String,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Retrieves relevant document chunks for a query.
pub struct Retriever {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl Retriever {
    /// Create a new retriever with the default k.
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Set the number of chunks to retrieve.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Retrieve the top-k chunks for a query, descending by score.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedDocument>> {
        let query_embedding = self.embedder.embed(query).await?;

        let results = self.vector_store.search(&query_embedding, self.top_k).await?;

        debug!("Retrieved {} chunks for query", results.len());

        Ok(results
            .into_iter()
            .map(|r| RetrievedDocument {
                source: r.document.source,
                content: r.document.content,
                score: r.score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::MockEmbedder;
    use crate::vector_store::{Document, MemoryVectorStore};

    async fn seeded_store(embedder: &MockEmbedder) -> Arc<MemoryVectorStore> {
        let store = Arc::new(MemoryVectorStore::new());
        for (i, content) in [
            "Admission requirements for undergraduate programs",
            "Tuition fee schedule per semester",
            "Library opening hours",
        ]
        .iter()
        .enumerate()
        {
            let embedding = embedder.embed(content).await.unwrap();
            let doc = Document::new(
                "prospectus".to_string(),
                None,
                content.to_string(),
                embedding,
                i as i32,
            );
            store.upsert(&doc).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_retrieve_returns_ranked_chunks() {
        let embedder = MockEmbedder::new();
        let store = seeded_store(&embedder).await;

        let retriever = Retriever::new(store, Arc::new(MockEmbedder::new())).with_top_k(2);
        let docs = retriever.retrieve("library hours").await.unwrap();

        assert_eq!(docs.len(), 2);
        assert!(docs[0].score >= docs[1].score);
    }

    #[tokio::test]
    async fn test_empty_store_yields_empty_result() {
        let store = Arc::new(MemoryVectorStore::new());
        let retriever = Retriever::new(store, Arc::new(MockEmbedder::new()));

        let docs = retriever.retrieve("anything").await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates() {
        let store = Arc::new(MemoryVectorStore::new());
        let retriever = Retriever::new(store, Arc::new(MockEmbedder::failing()));

        assert!(retriever.retrieve("anything").await.is_err());
    }
}
