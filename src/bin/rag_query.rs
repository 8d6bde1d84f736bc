use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use rag_chatbot::config::{
    DEFAULT_API_BASE_URL, DEFAULT_EMBEDDING_MODEL, DEFAULT_GENERATION_MODEL,
    DEFAULT_SYSTEM_INSTRUCTION,
};
use rag_chatbot::gemini::GeminiClient;
use rag_chatbot::indexer::corpus::load_corpus;
use rag_chatbot::logging;
use rag_chatbot::rag::embeddings::{Embedder, TaskType, MAX_BATCH_SIZE};
use rag_chatbot::rag::generator::AnswerGenerator;
use rag_chatbot::rag::index::CorpusIndex;
use rag_chatbot::rag::similarity::SimilarityMetric;

#[derive(Parser, Debug)]
#[command(name = "rag-query")]
#[command(about = "Embed the corpus and answer one question from the command line")]
struct Args {
    /// Question to answer
    #[arg(short, long)]
    question: String,

    /// Corpus file, one document per line
    #[arg(long, env = "CORPUS_PATH", default_value = "embeddings.txt")]
    corpus: PathBuf,

    /// cosine or euclidean
    #[arg(long, env = "SIMILARITY_METRIC", default_value = "cosine")]
    metric: SimilarityMetric,

    /// Number of documents to use as context (0 = all)
    #[arg(long, env = "TOP_K", default_value_t = 10)]
    top_k: usize,

    /// Print the ranked documents with scores instead of generating an answer
    #[arg(long)]
    retrieve_only: bool,

    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long, env = "API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    #[arg(long, env = "EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    #[arg(long, env = "GENERATION_MODEL", default_value = DEFAULT_GENERATION_MODEL)]
    generation_model: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let args = Args::parse();

    let texts = load_corpus(&args.corpus)?;
    println!("Loaded {} documents from {}", texts.len(), args.corpus.display());

    let client = Arc::new(
        GeminiClient::new(args.api_key.clone())
            .with_base_url(&args.api_base_url)
            .with_embedding_model(&args.embedding_model)
            .with_generation_model(&args.generation_model)
            .with_system_instruction(DEFAULT_SYSTEM_INSTRUCTION),
    );

    let pb = ProgressBar::new(texts.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message("embedding");

    let index = CorpusIndex::build(client.as_ref(), &texts, MAX_BATCH_SIZE, |done| {
        pb.set_position(done as u64)
    })
    .await?;
    pb.finish_with_message("done");

    let query = client.embed(&args.question, TaskType::RetrievalQuery).await?;
    let top_k = (args.top_k > 0).then_some(args.top_k);
    let ranked = index.search(&query, args.metric.scorer(), top_k)?;

    if args.retrieve_only {
        println!("\nTop {} documents by {}:", ranked.len(), args.metric);
        for (position, hit) in ranked.iter().enumerate() {
            println!("  {:>3}. [{:.4}] {}", position + 1, hit.score, hit.text);
        }
        return Ok(());
    }

    let context: Vec<&str> = ranked.iter().map(|r| r.text).collect();
    let answer = AnswerGenerator::new(client)
        .generate_answer(&args.question, context.as_slice())
        .await?;

    println!("\n{}", answer);
    Ok(())
}
