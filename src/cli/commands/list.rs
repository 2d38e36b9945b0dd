//! List indexed sources.

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::{SqliteVectorStore, VectorStore};

/// Run the list command.
pub async fn run_list(settings: Settings) -> anyhow::Result<()> {
    let store = SqliteVectorStore::new(&settings.sqlite_path())?;
    let sources = store.list_sources().await?;

    if sources.is_empty() {
        Output::info("No documents indexed yet. Use 'aula ingest <file>' to add some.");
        return Ok(());
    }

    Output::header("Indexed Sources");
    for source in &sources {
        Output::source_info(&source.source, source.chunk_count);
    }
    println!();
    Output::kv("Total chunks", &store.document_count().await?.to_string());

    Ok(())
}
