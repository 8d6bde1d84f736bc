//! Client for the Google Generative Language API (embeddings and text generation).

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::{
    Settings, DEFAULT_API_BASE_URL, DEFAULT_EMBEDDING_MODEL, DEFAULT_GENERATION_MODEL,
};
use crate::error::RagError;
use crate::rag::embeddings::{Embedder, TaskType};
use crate::rag::generator::Generator;

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
    generation_model: String,
    system_instruction: Option<String>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn text(role: Option<&'a str>, text: &'a str) -> Self {
        Self {
            role,
            parts: vec![Part { text }],
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: TaskType,
}

#[derive(Serialize)]
struct BatchEmbedContentsRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct BatchEmbedContentsResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            system_instruction: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.google_api_key.clone())
            .with_base_url(&settings.api_base_url)
            .with_embedding_model(&settings.embedding_model)
            .with_generation_model(&settings.generation_model)
            .with_system_instruction(&settings.system_instruction)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_embedding_model(mut self, model: &str) -> Self {
        self.embedding_model = model.to_string();
        self
    }

    pub fn with_generation_model(mut self, model: &str) -> Self {
        self.generation_model = model.to_string();
        self
    }

    pub fn with_system_instruction(mut self, instruction: &str) -> Self {
        self.system_instruction = Some(instruction.to_string()).filter(|s| !s.trim().is_empty());
        self
    }

    fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        }
    }

    async fn call<B, R>(&self, model: &str, method: &str, body: &B) -> Result<R, RagError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}:{}", self.base_url, Self::model_path(model), method);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RagError::Upstream(format!(
                "{} request failed: {} - {}",
                method, status, error_text
            )));
        }

        response.json::<R>().await.map_err(|e| {
            RagError::Upstream(format!("invalid {} response: {}", method, e))
        })
    }
}

#[async_trait]
impl Embedder for GeminiClient {
    async fn embed(&self, text: &str, task: TaskType) -> Result<Vec<f32>, RagError> {
        let model = Self::model_path(&self.embedding_model);
        let request = EmbedContentRequest {
            model: &model,
            content: Content::text(None, text),
            task_type: task,
        };

        let response: EmbedContentResponse = self
            .call(&self.embedding_model, "embedContent", &request)
            .await?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        task: TaskType,
    ) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Self::model_path(&self.embedding_model);
        let request = BatchEmbedContentsRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: &model,
                    content: Content::text(None, text),
                    task_type: task,
                })
                .collect(),
        };

        let response: BatchEmbedContentsResponse = self
            .call(&self.embedding_model, "batchEmbedContents", &request)
            .await?;
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, RagError> {
        let request = GenerateContentRequest {
            system_instruction: self
                .system_instruction
                .as_deref()
                .map(|s| Content::text(None, s)),
            contents: vec![Content::text(Some("user"), prompt)],
        };

        let response: GenerateContentResponse = self
            .call(&self.generation_model, "generateContent", &request)
            .await?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(RagError::Upstream(
                "generateContent returned no text".to_string(),
            ));
        }
        Ok(text)
    }
}
