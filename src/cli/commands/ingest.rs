//! Ingest pre-chunked documents into the vector store.
//!
//! Expects a JSON array of `{source, title?, content}` objects. Crawling,
//! PDF extraction and chunking happen upstream of this tool; ingest only
//! embeds and indexes.

use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::vector_store::{Document, SqliteVectorStore, VectorStore};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// One pre-chunked document as it appears in the input file.
#[derive(Debug, Deserialize)]
struct IngestChunk {
    source: String,
    #[serde(default)]
    title: Option<String>,
    content: String,
}

/// Run the ingest command.
pub async fn run_ingest(file: &str, replace: bool, settings: Settings) -> anyhow::Result<()> {
    let path = Path::new(file);
    let content = std::fs::read_to_string(path)?;
    let chunks: Vec<IngestChunk> = serde_json::from_str(&content)?;

    if chunks.is_empty() {
        Output::warning("Input file contains no chunks, nothing to do.");
        return Ok(());
    }

    let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
        &settings.embedding.model,
        settings.embedding.dimensions as usize,
    ));
    let store = SqliteVectorStore::new(&settings.sqlite_path())?;

    Output::header("Ingest");
    Output::kv("File", file);
    Output::kv("Chunks", &chunks.len().to_string());

    if replace {
        let sources: Vec<String> = {
            let mut seen: Vec<String> = Vec::new();
            for chunk in &chunks {
                if !seen.contains(&chunk.source) {
                    seen.push(chunk.source.clone());
                }
            }
            seen
        };
        for source in &sources {
            let deleted = store.delete_by_source(source).await?;
            if deleted > 0 {
                Output::info(&format!("Replaced {} existing chunks for {}", deleted, source));
            }
        }
    }

    let spinner = Output::spinner("Generating embeddings...");
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;
    spinner.finish_and_clear();

    // Chunk order restarts per source, following input order
    let mut order_by_source: HashMap<String, i32> = HashMap::new();
    let documents: Vec<Document> = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| {
            let order = order_by_source.entry(chunk.source.clone()).or_insert(0);
            let doc = Document::new(chunk.source, chunk.title, chunk.content, embedding, *order);
            *order += 1;
            doc
        })
        .collect();

    let count = store.upsert_batch(&documents).await?;
    info!("Ingested {} chunks from {}", count, file);
    Output::success(&format!("Indexed {} chunks.", count));

    Ok(())
}
