pub mod embeddings;
pub mod generator;
pub mod index;
pub mod similarity;

use std::sync::{Arc, OnceLock};

use self::embeddings::{Embedder, TaskType};
use self::generator::{AnswerGenerator, Generator};
use self::index::CorpusIndex;
use self::similarity::SimilarityMetric;
use crate::error::RagError;

#[derive(Debug, Clone, Copy)]
pub struct RetrievalOptions {
    pub metric: SimilarityMetric,
    /// `None` returns the whole corpus.
    pub top_k: Option<usize>,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            metric: SimilarityMetric::Cosine,
            top_k: Some(10),
        }
    }
}

/// Retrieval + generation pipeline over a corpus index that is published once.
pub struct RAGEngine {
    embedder: Arc<dyn Embedder>,
    answers: AnswerGenerator,
    corpus: OnceLock<CorpusIndex>,
    options: RetrievalOptions,
}

impl RAGEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        options: RetrievalOptions,
    ) -> Self {
        Self {
            embedder,
            answers: AnswerGenerator::new(generator),
            corpus: OnceLock::new(),
            options,
        }
    }

    pub fn options(&self) -> RetrievalOptions {
        self.options
    }

    pub fn is_ready(&self) -> bool {
        self.corpus.get().is_some()
    }

    pub fn corpus(&self) -> Option<&CorpusIndex> {
        self.corpus.get()
    }

    /// Makes the index visible to queries. Only the first call succeeds.
    pub fn publish(&self, index: CorpusIndex) -> Result<(), RagError> {
        self.corpus
            .set(index)
            .map_err(|_| RagError::Corpus("corpus index already published".to_string()))
    }

    /// Embeds the corpus texts and publishes the resulting index.
    pub async fn build_corpus(
        &self,
        texts: &[String],
        batch_size: usize,
        on_batch: impl FnMut(usize),
    ) -> Result<usize, RagError> {
        let index = CorpusIndex::build(self.embedder.as_ref(), texts, batch_size, on_batch).await?;
        let count = index.len();
        self.publish(index)?;
        Ok(count)
    }

    /// Corpus texts most relevant to `question`, best first.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<String>, RagError> {
        let corpus = self.corpus.get().ok_or(RagError::NotReady)?;
        let query = self
            .embedder
            .embed(question, TaskType::RetrievalQuery)
            .await?;

        let ranked = corpus.search(&query, self.options.metric.scorer(), self.options.top_k)?;
        tracing::debug!(
            "Ranked {} of {} documents by {}",
            ranked.len(),
            corpus.len(),
            self.options.metric
        );
        Ok(ranked.into_iter().map(|r| r.text.to_string()).collect())
    }

    pub async fn answer(&self, question: &str) -> Result<String, RagError> {
        let context = self.retrieve(question).await?;
        self.answers.generate_answer(question, context.as_slice()).await
    }
}
