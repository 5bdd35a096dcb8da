//! reportscope - topic relevance and reporting-sentence extraction for news
//! text.
//!
//! Two pipelines run over a directory of `.txt` files:
//!
//! - [`CorpusAnalyzer`] scores each document against a weighted topic
//!   vocabulary, clusters the corpus by TF-IDF similarity and nudges each
//!   verdict toward the corpus's dominant cluster.
//! - [`ReportingExtractor`] finds sentences built around a verb of
//!   attribution ("said", "claimed", ...) and emits them with surrounding
//!   context as CSV rows.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use reportscope::{AppConfig, CorpusAnalyzer};
//!
//! let config = AppConfig::default();
//! let report = CorpusAnalyzer::new(&config)
//!     .analyze(Path::new("articles"))
//!     .unwrap();
//! for doc in &report.related {
//!     println!("{} (score: {:.3})", doc.file_name, doc.verdict.score);
//! }
//! ```

pub mod cluster_weights;
pub mod clustering;
pub mod config;
pub mod config_path;
pub mod corpus;
pub mod entities;
pub mod error;
pub mod extractor;
pub mod features;
pub mod parser;
pub mod relevance;
pub mod reporting;
pub mod segmenter;
pub mod tfidf;
pub mod walker;

pub use cluster_weights::{ClusterWeightTable, cluster_weights};
pub use clustering::{ClusterResult, DocumentClusterer};
pub use config::AppConfig;
pub use corpus::{CorpusAnalyzer, CorpusReport};
pub use entities::{EntityRecognizer, GazetteerRecognizer};
pub use error::{Error, FileError, Result};
pub use extractor::{ReportingExtractor, ReportingRow};
pub use features::{FeatureExtractor, FeatureVector};
pub use parser::{DependencyParser, HeuristicParser, ParsedSentence};
pub use relevance::{RelevanceClassifier, RelevanceVerdict};
pub use reporting::ReportingVerbDetector;
pub use segmenter::{SentenceSegmenter, SentenceSplitter};
