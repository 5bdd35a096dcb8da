//! Whole-directory relevance analysis.
//!
//! [`CorpusAnalyzer::analyze`] reads every `.txt` file in a directory,
//! extracts features, clusters the readable documents, weights the
//! clusters and classifies each document. Unreadable files are recorded
//! and skipped; they take no part in clustering.

use std::{collections::BTreeMap, io::Write, path::Path};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    cluster_weights::cluster_weights,
    clustering::{DocumentClusterer, effective_cluster_count},
    config::{AppConfig, ClusteringConfig},
    error::{FileError, Result},
    features::{FeatureExtractor, FeatureVector},
    relevance::{ClusterContext, RelevanceClassifier, RelevanceVerdict},
    walker::discover_text_files,
};

/// A classified document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentVerdict {
    pub file_name: String,
    #[serde(flatten)]
    pub verdict: RelevanceVerdict,
    pub features: FeatureVector,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterAssignment {
    pub file_name: String,
    pub cluster: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedPoint {
    pub file_name: String,
    pub x: f64,
    pub y: f64,
}

/// Related and total document counts for one cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClusterStats {
    pub related: usize,
    pub total: usize,
}

/// Everything a corpus run produces. Lists follow file-name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorpusReport {
    pub related: Vec<DocumentVerdict>,
    pub not_related: Vec<DocumentVerdict>,
    pub errors: Vec<FileError>,
    pub clusters: Vec<ClusterAssignment>,
    pub projection: Vec<ProjectedPoint>,
    pub cluster_stats: BTreeMap<usize, ClusterStats>,
}

impl CorpusReport {
    pub fn document_count(&self) -> usize {
        self.related.len() + self.not_related.len()
    }

    /// Documents per cluster id.
    pub fn cluster_sizes(&self) -> BTreeMap<usize, usize> {
        let mut sizes = BTreeMap::new();
        for assignment in &self.clusters {
            *sizes.entry(assignment.cluster).or_insert(0) += 1;
        }
        sizes
    }

    /// Write the plain-text report.
    pub fn write_human<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "=== Results ===")?;
        writeln!(out, "Related ({} files):", self.related.len())?;
        for doc in &self.related {
            let v = &doc.verdict;
            writeln!(out, " - {}", doc.file_name)?;
            writeln!(
                out,
                "   Score: {:.2} (Base: {:.2})",
                v.score, v.base_score
            )?;
            writeln!(out, "   Cluster: {}", cluster_label(v.cluster))?;
            writeln!(
                out,
                "   Features: Keywords={:.2}, Phrases={:.2}, Entities={:.2}",
                v.keyword_score, v.phrase_score, v.entity_score
            )?;
        }

        writeln!(out, "\nNot related ({} files):", self.not_related.len())?;
        for doc in &self.not_related {
            writeln!(
                out,
                " - {} | Cluster: {} | Score: {:.2}",
                doc.file_name,
                cluster_label(doc.verdict.cluster),
                doc.verdict.score
            )?;
        }

        if !self.errors.is_empty() {
            writeln!(out, "\nFiles with errors ({}):", self.errors.len())?;
            for error in &self.errors {
                writeln!(out, " - {error}")?;
            }
        }

        if !self.clusters.is_empty() {
            writeln!(out, "\n=== Cluster Distribution ===")?;
            for (cluster, count) in self.cluster_sizes() {
                writeln!(out, "Cluster {cluster}: {count} documents")?;
            }

            writeln!(out, "\n=== Relation by Cluster ===")?;
            for (cluster, stats) in &self.cluster_stats {
                let pct = if stats.total > 0 {
                    stats.related as f64 / stats.total as f64 * 100.0
                } else {
                    0.0
                };
                writeln!(
                    out,
                    "Cluster {cluster}: {}/{} related ({pct:.1}%)",
                    stats.related, stats.total
                )?;
            }
        }
        Ok(())
    }

    pub fn write_json<W: Write>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)?;
        Ok(())
    }
}

fn cluster_label(cluster: Option<usize>) -> String {
    cluster.map_or_else(|| "N/A".to_string(), |c| c.to_string())
}

struct LoadedDocument {
    file_name: String,
    text: String,
    features: FeatureVector,
}

/// Runs feature extraction, clustering, weighting and classification over
/// a directory.
#[derive(Debug, Clone, Default)]
pub struct CorpusAnalyzer {
    extractor: FeatureExtractor,
    clusterer: DocumentClusterer,
    classifier: RelevanceClassifier,
    clustering: ClusteringConfig,
}

impl CorpusAnalyzer {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            extractor: FeatureExtractor::new(config.topic.clone()),
            clusterer: DocumentClusterer::new(&config.clustering),
            classifier: RelevanceClassifier::new(config.relevance),
            clustering: config.clustering,
        }
    }

    /// Replace the feature extractor, e.g. to plug in another entity
    /// recognizer.
    pub fn with_extractor(mut self, extractor: FeatureExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Analyze every `.txt` file directly inside `dir`.
    ///
    /// Fails only if `dir` is not a directory. An empty directory gives an
    /// empty report.
    pub fn analyze(&self, dir: &Path) -> Result<CorpusReport> {
        let files = discover_text_files(dir)?;
        info!(files = files.len(), dir = %dir.display(), "analyzing corpus");

        let loaded: Vec<_> = files
            .par_iter()
            .map(|file| -> std::result::Result<LoadedDocument, FileError> {
                let text = std::fs::read_to_string(&file.path).map_err(|e| {
                    FileError {
                        file_name: file.file_name.clone(),
                        message: e.to_string(),
                    }
                })?;
                let features = self.extractor.extract(&text);
                Ok(LoadedDocument {
                    file_name: file.file_name.clone(),
                    text,
                    features,
                })
            })
            .collect();

        let mut report = CorpusReport::default();
        let mut documents = Vec::with_capacity(loaded.len());
        for result in loaded {
            match result {
                Ok(doc) => documents.push(doc),
                Err(error) => {
                    warn!(file = %error.file_name, "{}", error.message);
                    report.errors.push(error);
                }
            }
        }

        if documents.is_empty() {
            warn!(dir = %dir.display(), "no readable documents");
            return Ok(report);
        }

        let k = effective_cluster_count(
            self.clustering.n_clusters,
            documents.len(),
        );
        let texts: Vec<&str> =
            documents.iter().map(|d| d.text.as_str()).collect();
        let clustered = self.clusterer.cluster(&texts, k)?;
        let weights = cluster_weights(
            &clustered.assignments,
            self.clustering.decay_rate,
            self.clustering.min_weight,
        );
        debug!(?weights, "cluster weights");

        for ((doc, &cluster), point) in documents
            .into_iter()
            .zip(&clustered.assignments)
            .zip(&clustered.projection)
        {
            let verdict = self.classifier.classify(
                &doc.features,
                Some(ClusterContext {
                    cluster,
                    weights: &weights,
                }),
            );
            debug!(
                file = %doc.file_name,
                cluster,
                score = verdict.score,
                related = verdict.related,
                "classified"
            );

            let stats = report.cluster_stats.entry(cluster).or_default();
            stats.total += 1;
            if verdict.related {
                stats.related += 1;
            }

            report.clusters.push(ClusterAssignment {
                file_name: doc.file_name.clone(),
                cluster,
            });
            report.projection.push(ProjectedPoint {
                file_name: doc.file_name.clone(),
                x: point[0],
                y: point[1],
            });

            let entry = DocumentVerdict {
                file_name: doc.file_name,
                verdict,
                features: doc.features,
            };
            if verdict.related {
                report.related.push(entry);
            } else {
                report.not_related.push(entry);
            }
        }

        info!(
            related = report.related.len(),
            not_related = report.not_related.len(),
            errors = report.errors.len(),
            clusters = clustered.n_clusters,
            "corpus analysis finished"
        );
        Ok(report)
    }
}
