//! Relevance scoring.
//!
//! Raw features are normalised against fixed divisors and capped at 1:
//!
//! ```text
//! keyword = min(keyword_score / 10, 1)
//! phrase  = min(phrase_score / 2, 1)
//! entity  = min(entity_matches / 3, 1)
//! base    = 0.4 * keyword + 0.2 * phrase + 0.3 * entity
//! ```
//!
//! With cluster information the final score is
//! `0.9 * base + 0.1 * cluster_weight`; without it the base score is used
//! directly. A document is related when its score reaches 0.5.
//!
//! The feature weights add up to 0.9, so the base-only path needs strong
//! evidence on every signal to reach the threshold. That asymmetry is
//! deliberate and the constants are kept as they are.

use serde::Serialize;

use crate::{
    cluster_weights::ClusterWeightTable,
    config::RelevanceConfig,
    error::Result,
    features::{FeatureExtractor, FeatureVector},
};

/// A document's cluster and the run's shared weight table.
#[derive(Debug, Clone, Copy)]
pub struct ClusterContext<'a> {
    pub cluster: usize,
    pub weights: &'a ClusterWeightTable,
}

/// Decision plus the numbers behind it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RelevanceVerdict {
    pub related: bool,
    /// Final score compared against the threshold.
    pub score: f64,
    pub base_score: f64,
    /// Normalised keyword signal, in `[0, 1]`.
    pub keyword_score: f64,
    /// Normalised phrase signal, in `[0, 1]`.
    pub phrase_score: f64,
    /// Normalised entity signal, in `[0, 1]`.
    pub entity_score: f64,
    pub cluster: Option<usize>,
    /// Weight applied for the document's cluster, including the fallback
    /// used when the id is missing from the table.
    pub cluster_weight: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RelevanceClassifier {
    config: RelevanceConfig,
}

fn normalize(value: f64, divisor: f64) -> f64 {
    (value / divisor).clamp(0.0, 1.0)
}

impl RelevanceClassifier {
    pub fn new(config: RelevanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RelevanceConfig {
        &self.config
    }

    /// Score a feature vector, optionally nudged by its cluster's weight.
    ///
    /// An empty weight table counts as no cluster information.
    pub fn classify(
        &self,
        features: &FeatureVector,
        cluster: Option<ClusterContext<'_>>,
    ) -> RelevanceVerdict {
        let c = &self.config;
        let keyword_score =
            normalize(features.keyword_score, c.keyword_divisor);
        let phrase_score = normalize(features.phrase_score, c.phrase_divisor);
        let entity_score = normalize(features.entity_matches, c.entity_divisor);

        let base_score = c.keyword_weight * keyword_score
            + c.phrase_weight * phrase_score
            + c.entity_weight * entity_score;

        let applied = cluster.filter(|ctx| !ctx.weights.is_empty()).map(|ctx| {
            let weight = ctx
                .weights
                .get(&ctx.cluster)
                .copied()
                .unwrap_or(c.missing_cluster_weight);
            (ctx.cluster, weight)
        });

        let score = match applied {
            Some((_, weight)) => {
                (1.0 - c.cluster_share) * base_score + c.cluster_share * weight
            }
            None => base_score,
        };

        RelevanceVerdict {
            related: score >= c.threshold,
            score,
            base_score,
            keyword_score,
            phrase_score,
            entity_score,
            cluster: cluster.map(|ctx| ctx.cluster),
            cluster_weight: applied.map(|(_, w)| w),
        }
    }

    /// Extract features from `text` and classify them.
    pub fn classify_text(
        &self,
        extractor: &FeatureExtractor,
        text: &str,
        cluster: Option<ClusterContext<'_>>,
    ) -> RelevanceVerdict {
        self.classify(&extractor.extract(text), cluster)
    }

    /// Classify features supplied as a name→value map.
    ///
    /// All four feature names must be present.
    pub fn classify_map(
        &self,
        features: &std::collections::HashMap<String, f64>,
        cluster: Option<ClusterContext<'_>>,
    ) -> Result<RelevanceVerdict> {
        Ok(self.classify(&FeatureVector::from_map(features)?, cluster))
    }
}
