use std::path::Path;

use anyhow::{Context, Result};

/// Reads the corpus file: one document per line, blank lines dropped.
pub fn load_corpus(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;
    Ok(split_documents(&content))
}

pub fn split_documents(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
