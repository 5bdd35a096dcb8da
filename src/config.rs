//! Runtime configuration for both pipelines.
//!
//! Every table and constant the analysis depends on lives here so tests
//! and callers can substitute their own. [`AppConfig::default`] carries
//! the documented defaults; a JSON file may override any subset of them.
//!
//! # Examples
//!
//! ```
//! use reportscope::config::AppConfig;
//!
//! let config: AppConfig =
//!     serde_json::from_str(r#"{"clustering": {"n_clusters": 4}}"#).unwrap();
//! assert_eq!(config.clustering.n_clusters, 4);
//! assert_eq!(config.clustering.seed, 42);
//! assert!(config.topic.keywords.contains_key("beijing"));
//! ```

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const DEFAULT_KEYWORDS: &[(&str, f64)] = &[
    ("china", 4.0),
    ("beijing", 3.0),
    ("chinese", 3.0),
    ("xi jinping", 3.0),
    ("belt and road", 4.0),
    ("cpc", 2.0),
    ("taiwan", 2.0),
    ("macao", 3.0),
    ("prc", 2.0),
    ("pla", 3.0),
    ("bri", 3.0),
    ("hong kong", 3.0),
    ("tibet", 3.0),
    ("wuhan", 2.0),
    ("hangzhou", 3.0),
    ("deepseek", 2.0),
    ("panda", 1.0),
    ("shanghai", 3.0),
    ("shenzhen", 3.0),
    ("guangzhou", 3.0),
    ("tiananmen", 3.0),
    ("huawei", 3.0),
    ("tiktok", 3.0),
    ("alibaba", 3.0),
    ("jd.com", 2.0),
    ("one china policy", 4.0),
    ("south china sea", 4.0),
    ("censorship", 2.0),
    ("great firewall", 3.0),
    ("xi\u{2019}s policies", 3.0),
    ("economic corridor", 2.0),
    ("chinese military", 3.0),
    ("made in china 2025", 3.0),
    ("chip war", 3.0),
    ("evergrande", 2.0),
    ("property crisis", 2.0),
    ("real estate bubble", 2.0),
];

const DEFAULT_PHRASES: &[&str] = &[
    "chinese foreign policy",
    "chinese government",
    "chinese investment",
    "beijing's response",
    "xi jinping's leadership",
    "china-us relations",
    "china's economic growth",
    "china's military expansion",
    "chinese trade policies",
    "belt and road initiative",
    "taiwan strait tensions",
    "hong kong protests",
    "tibet autonomy",
    "xinjiang policies",
    "china's tech industry",
    "chinese surveillance",
    "beijing's stance",
    "china's influence in africa",
    "chinese soft power",
    "chinese digital currency",
    "china's global ambitions",
    "shanghai stock exchange",
    "china's zero-covid policy",
    "chinese semiconductor industry",
];

/// The topic being screened for: weighted keywords and contextual phrases.
///
/// Keys and phrases are matched against lower-cased text, so they are
/// stored lower-cased.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    pub keywords: BTreeMap<String, f64>,
    pub phrases: Vec<String>,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS
                .iter()
                .map(|(k, w)| ((*k).to_string(), *w))
                .collect(),
            phrases: DEFAULT_PHRASES.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl TopicConfig {
    /// Build a topic from explicit tables, lower-casing every entry.
    pub fn new<K, P>(keywords: K, phrases: P) -> Self
    where
        K: IntoIterator<Item = (String, f64)>,
        P: IntoIterator<Item = String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|(k, w)| (k.to_lowercase(), w))
                .collect(),
            phrases: phrases.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.keywords.is_empty() {
            return Err(Error::Config("keyword table is empty".into()));
        }
        if let Some((k, w)) = self
            .keywords
            .iter()
            .find(|(k, w)| k.is_empty() || !w.is_finite() || **w < 0.0)
        {
            return Err(Error::Config(format!(
                "keyword '{k}' has invalid weight {w}"
            )));
        }
        Ok(())
    }
}

/// Normalisation divisors, score weights and the decision threshold.
///
/// The three feature weights sum to 0.9; the remaining share is what the
/// cluster weight contributes when one is available.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceConfig {
    pub threshold: f64,
    pub keyword_divisor: f64,
    pub phrase_divisor: f64,
    pub entity_divisor: f64,
    pub keyword_weight: f64,
    pub phrase_weight: f64,
    pub entity_weight: f64,
    pub cluster_share: f64,
    /// Weight assumed for a cluster id absent from the weight table.
    pub missing_cluster_weight: f64,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            keyword_divisor: 10.0,
            phrase_divisor: 2.0,
            entity_divisor: 3.0,
            keyword_weight: 0.4,
            phrase_weight: 0.2,
            entity_weight: 0.3,
            cluster_share: 0.1,
            missing_cluster_weight: 0.2,
        }
    }
}

impl RelevanceConfig {
    fn validate(&self) -> Result<()> {
        for (name, divisor) in [
            ("keyword_divisor", self.keyword_divisor),
            ("phrase_divisor", self.phrase_divisor),
            ("entity_divisor", self.entity_divisor),
        ] {
            if divisor.is_nan() || divisor <= 0.0 {
                return Err(Error::Config(format!(
                    "{name} must be positive, got {divisor}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.cluster_share) {
            return Err(Error::Config(format!(
                "cluster_share must be within [0, 1], got {}",
                self.cluster_share
            )));
        }
        Ok(())
    }
}

/// Clustering and cluster-weighting parameters for a corpus run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Requested cluster count; the effective count may be lower.
    pub n_clusters: usize,
    pub seed: u64,
    /// Vocabulary cap for the TF-IDF vectorizer.
    pub max_features: usize,
    pub max_iterations: usize,
    pub decay_rate: f64,
    pub min_weight: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            n_clusters: 3,
            seed: 42,
            max_features: 1000,
            max_iterations: 300,
            decay_rate: 0.6,
            min_weight: 0.1,
        }
    }
}

impl ClusteringConfig {
    fn validate(&self) -> Result<()> {
        if self.n_clusters < 2 {
            return Err(Error::Config(format!(
                "n_clusters must be at least 2, got {}",
                self.n_clusters
            )));
        }
        if self.max_features == 0 {
            return Err(Error::Config("max_features must be positive".into()));
        }
        if self.decay_rate.is_nan()
            || self.decay_rate <= 0.0
            || self.decay_rate >= 1.0
        {
            return Err(Error::Config(format!(
                "decay_rate must be within (0, 1), got {}",
                self.decay_rate
            )));
        }
        if self.min_weight.is_nan() || self.min_weight <= 0.0 {
            return Err(Error::Config(format!(
                "min_weight must be positive, got {}",
                self.min_weight
            )));
        }
        Ok(())
    }
}

/// Reporting-sentence extraction parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Sentences of context taken on each side of a reporting sentence.
    pub context_range: usize,
    /// Maximum raw sentences absorbed into an open quotation.
    pub max_merge: usize,
    /// Wrap detected reporting verbs as `[verb]` in the output sentence.
    pub mark_verbs: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            context_range: 3,
            max_merge: 3,
            mark_verbs: false,
        }
    }
}

/// Top-level configuration, as read from a config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub topic: TopicConfig,
    pub relevance: RelevanceConfig,
    pub clustering: ClusteringConfig,
    pub extraction: ExtractionConfig,
}

impl AppConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut config: Self = serde_json::from_str(&contents)?;
        config.topic = TopicConfig::new(
            std::mem::take(&mut config.topic.keywords),
            std::mem::take(&mut config.topic.phrases),
        );
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.topic.validate()?;
        self.relevance.validate()?;
        self.clustering.validate()
    }
}
