use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RagError;
use crate::filters::answer_cleaner::clean_answer;

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, RagError>;
}

pub fn build_prompt<S: AsRef<str>>(question: &str, context_texts: &[S]) -> String {
    let context = context_texts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("Question: {}\n\nContext:\n{}\n\nAnswer:", question, context)
}

/// Turns a question and its retrieved context into a cleaned-up answer.
#[derive(Clone)]
pub struct AnswerGenerator {
    generator: Arc<dyn Generator>,
}

impl AnswerGenerator {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }

    pub async fn generate_answer<S: AsRef<str> + Sync>(
        &self,
        question: &str,
        context_texts: &[S],
    ) -> Result<String, RagError> {
        let prompt = build_prompt(question, context_texts);
        let raw = self.generator.generate(&prompt).await?;
        Ok(clean_answer(&raw))
    }
}
