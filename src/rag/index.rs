use super::embeddings::{embed_documents, Embedder};
use super::similarity::{rank, Ranked, Scorer};
use crate::error::RagError;

#[derive(Debug, Clone, PartialEq)]
pub struct CorpusEntry {
    pub text: String,
    pub vector: Vec<f32>,
}

/// Embedded corpus, built once at startup and read-only afterwards.
#[derive(Debug, Default)]
pub struct CorpusIndex {
    entries: Vec<CorpusEntry>,
}

impl CorpusIndex {
    pub fn new(entries: Vec<CorpusEntry>) -> Result<Self, RagError> {
        if let Some(first) = entries.first() {
            let dimension = first.vector.len();
            if let Some(bad) = entries.iter().find(|e| e.vector.len() != dimension) {
                return Err(RagError::Corpus(format!(
                    "inconsistent embedding dimensions: expected {}, got {}",
                    dimension,
                    bad.vector.len()
                )));
            }
        }
        Ok(Self { entries })
    }

    pub async fn build(
        embedder: &dyn Embedder,
        texts: &[String],
        batch_size: usize,
        on_batch: impl FnMut(usize),
    ) -> Result<Self, RagError> {
        let entries = embed_documents(embedder, texts, batch_size, on_batch).await?;
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.entries.first().map(|e| e.vector.len())
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn search(
        &self,
        query: &[f32],
        scorer: &dyn Scorer,
        top_k: Option<usize>,
    ) -> Result<Vec<Ranked<'_>>, RagError> {
        rank(query, &self.entries, scorer, top_k)
    }
}
