use std::path::PathBuf;

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::rag::embeddings::MAX_BATCH_SIZE;
use crate::rag::similarity::SimilarityMetric;

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a CV chatbot assistant that retrieves information about the candidate's CV. \
Your answer should be precise and attractive. Always answer from the context and do not improvise. \
Provide answers in bullets and in an organized way";

#[derive(Clone, Deserialize)]
pub struct Settings {
    pub google_api_key: String,
    pub port: u16,
    pub corpus_path: PathBuf,
    pub similarity_metric: SimilarityMetric,
    /// 0 returns the whole corpus.
    pub top_k: usize,
    pub embed_batch_size: usize,
    pub api_base_url: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub system_instruction: String,
    pub serve_before_ready: bool,
}

impl Settings {
    /// Defaults, then `chatbot.toml` (or `$CHATBOT_CONFIG`), then the process environment.
    pub fn load() -> Result<Self> {
        let file = std::env::var("CHATBOT_CONFIG").unwrap_or_else(|_| "chatbot".to_string());
        let config = defaults()?
            .add_source(File::with_name(&file).required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()
            .context("Failed to read configuration")?;

        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let settings: Settings = config
            .try_deserialize()
            .context("Invalid configuration")?;

        if settings.google_api_key.trim().is_empty() {
            anyhow::bail!("GOOGLE_API_KEY must not be empty");
        }
        Ok(settings)
    }

    pub fn top_k(&self) -> Option<usize> {
        (self.top_k > 0).then_some(self.top_k)
    }

    pub fn batch_size(&self) -> usize {
        self.embed_batch_size.clamp(1, MAX_BATCH_SIZE)
    }
}

/// Built-in defaults; every key except `google_api_key` has one.
pub fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    let builder = Config::builder()
        .set_default("port", 8000_i64)?
        .set_default("corpus_path", "embeddings.txt")?
        .set_default("similarity_metric", "cosine")?
        .set_default("top_k", 10_i64)?
        .set_default("embed_batch_size", MAX_BATCH_SIZE as i64)?
        .set_default("api_base_url", DEFAULT_API_BASE_URL)?
        .set_default("embedding_model", DEFAULT_EMBEDDING_MODEL)?
        .set_default("generation_model", DEFAULT_GENERATION_MODEL)?
        .set_default("system_instruction", DEFAULT_SYSTEM_INSTRUCTION)?
        .set_default("serve_before_ready", false)?;
    Ok(builder)
}
