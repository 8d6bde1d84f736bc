use async_trait::async_trait;
use serde::Serialize;

use super::index::CorpusEntry;
use crate::error::RagError;

/// Upper bound on documents per batch embedding call.
pub const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    RetrievalQuery,
    RetrievalDocument,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str, task: TaskType) -> Result<Vec<f32>, RagError>;

    /// One upstream call. Returns one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String], task: TaskType)
        -> Result<Vec<Vec<f32>>, RagError>;
}

/// Embeds corpus documents in batches of at most `batch_size`, pairing each text with its vector.
///
/// `on_batch` is called with the number of documents embedded so far.
pub async fn embed_documents(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
    mut on_batch: impl FnMut(usize),
) -> Result<Vec<CorpusEntry>, RagError> {
    let batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
    let mut entries = Vec::with_capacity(texts.len());

    for batch in texts.chunks(batch_size) {
        let vectors = embedder
            .embed_batch(batch, TaskType::RetrievalDocument)
            .await?;

        if vectors.len() != batch.len() {
            return Err(RagError::Upstream(format!(
                "batch embedding returned {} vectors for {} documents",
                vectors.len(),
                batch.len()
            )));
        }

        entries.extend(
            batch
                .iter()
                .zip(vectors)
                .map(|(text, vector)| CorpusEntry {
                    text: text.clone(),
                    vector,
                }),
        );
        tracing::debug!("Embedded {}/{} documents", entries.len(), texts.len());
        on_batch(entries.len());
    }

    Ok(entries)
}
