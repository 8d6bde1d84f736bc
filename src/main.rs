use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use rag_chatbot::config::Settings;
use rag_chatbot::gemini::GeminiClient;
use rag_chatbot::indexer::corpus::load_corpus;
use rag_chatbot::logging;
use rag_chatbot::rag::{RAGEngine, RetrievalOptions};
use rag_chatbot::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let settings = Settings::load()?;
    tracing::info!(
        "Corpus: {}, metric: {}, top_k: {}, embedding model: {}, generation model: {}",
        settings.corpus_path.display(),
        settings.similarity_metric,
        settings.top_k().map_or("all".to_string(), |k| k.to_string()),
        settings.embedding_model,
        settings.generation_model,
    );

    // Corpus
    let texts = load_corpus(&settings.corpus_path)?;
    tracing::info!("Loaded {} documents", texts.len());

    // RAG engine
    let client = Arc::new(GeminiClient::from_settings(&settings));
    let options = RetrievalOptions {
        metric: settings.similarity_metric,
        top_k: settings.top_k(),
    };
    let state = Arc::new(AppState {
        rag: RAGEngine::new(client.clone(), client, options),
    });

    // Readiness: block on the index unless serving early was requested
    let batch_size = settings.batch_size();
    if settings.serve_before_ready {
        server::spawn_corpus_build(state.clone(), texts, batch_size);
    } else {
        let total = texts.len();
        let count = state
            .rag
            .build_corpus(&texts, batch_size, |done| {
                tracing::info!("Embedded {}/{} documents", done, total)
            })
            .await
            .context("Failed to embed corpus")?;
        tracing::info!("Corpus index ready with {} documents", count);
    }

    // Server
    let app = server::router(state);
    let listener = TcpListener::bind(("0.0.0.0", settings.port))
        .await
        .with_context(|| format!("Failed to bind to port {}", settings.port))?;
    tracing::info!("Server is running on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
