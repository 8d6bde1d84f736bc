//! Vector scoring strategies and the query-time ranker.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use super::index::CorpusEntry;
use crate::error::RagError;

/// A vector scoring strategy.
pub trait Scorer: Send + Sync {
    fn score(&self, a: &[f32], b: &[f32]) -> f32;

    /// Whether a larger score means a closer match.
    fn higher_is_better(&self) -> bool;
}

/// `dot(a,b) / (|a| * |b|)`. A zero-magnitude vector scores 0.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineSimilarity;

impl Scorer for CosineSimilarity {
    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| (*x as f64) * (*y as f64)).sum();
        let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
        let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0) as f32
    }

    fn higher_is_better(&self) -> bool {
        true
    }
}

/// Straight-line (L2) distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanDistance;

impl Scorer for EuclideanDistance {
    fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt()
    }

    fn higher_is_better(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityMetric {
    Cosine,
    Euclidean,
}

impl SimilarityMetric {
    pub fn scorer(self) -> &'static dyn Scorer {
        match self {
            SimilarityMetric::Cosine => &CosineSimilarity,
            SimilarityMetric::Euclidean => &EuclideanDistance,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SimilarityMetric::Cosine => "cosine",
            SimilarityMetric::Euclidean => "euclidean",
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimilarityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cosine" => Ok(SimilarityMetric::Cosine),
            "euclidean" | "l2" => Ok(SimilarityMetric::Euclidean),
            other => Err(format!("unknown similarity metric: {}", other)),
        }
    }
}

impl<'de> Deserialize<'de> for SimilarityMetric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<'a> {
    pub text: &'a str,
    pub score: f32,
}

/// Scores every entry against `query` and returns them most relevant first.
///
/// Ties keep corpus order. `top_k = None` returns the whole corpus.
pub fn rank<'a>(
    query: &[f32],
    entries: &'a [CorpusEntry],
    scorer: &dyn Scorer,
    top_k: Option<usize>,
) -> Result<Vec<Ranked<'a>>, RagError> {
    let mut ranked = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.vector.len() != query.len() {
            return Err(RagError::DimensionMismatch {
                query: query.len(),
                entry: entry.vector.len(),
            });
        }
        ranked.push(Ranked {
            text: &entry.text,
            score: scorer.score(query, &entry.vector),
        });
    }

    if scorer.higher_is_better() {
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    } else {
        ranked.sort_by(|a, b| a.score.total_cmp(&b.score));
    }

    if let Some(k) = top_k {
        ranked.truncate(k);
    }
    Ok(ranked)
}
