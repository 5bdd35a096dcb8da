//! Per-document topic features.
//!
//! Four raw signals are computed for each document:
//!
//! - `keyword_score`: weighted substring counts over the keyword table
//! - `keyword_mentions`: whole-token keyword occurrences
//! - `entity_matches`: GPE/NORP entities whose text contains a keyword
//! - `phrase_score`: how many contextual phrases appear at least once
//!
//! Raw values are unbounded; [`crate::relevance`] normalises them.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, LazyLock},
};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    config::TopicConfig,
    entities::{EntityLabel, EntityRecognizer, GazetteerRecognizer},
    error::{Error, Result},
};

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w+\b").expect("word pattern is valid"));

pub const KEYWORD_SCORE: &str = "keyword_score";
pub const KEYWORD_MENTIONS: &str = "keyword_mentions";
pub const ENTITY_MATCHES: &str = "entity_matches";
pub const PHRASE_SCORE: &str = "phrase_score";

/// Raw feature values for one document. All values are non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub keyword_score: f64,
    pub keyword_mentions: f64,
    pub entity_matches: f64,
    pub phrase_score: f64,
}

impl FeatureVector {
    /// Build a vector from named scores, as produced by an external
    /// feature source.
    ///
    /// Fails with [`Error::MissingFeature`] if any of the four keys is
    /// absent. Extra keys are ignored.
    pub fn from_map(map: &HashMap<String, f64>) -> Result<Self> {
        let get = |key: &'static str| {
            map.get(key).copied().ok_or(Error::MissingFeature(key))
        };
        Ok(Self {
            keyword_score: get(KEYWORD_SCORE)?,
            keyword_mentions: get(KEYWORD_MENTIONS)?,
            entity_matches: get(ENTITY_MATCHES)?,
            phrase_score: get(PHRASE_SCORE)?,
        })
    }

    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            (KEYWORD_SCORE, self.keyword_score),
            (KEYWORD_MENTIONS, self.keyword_mentions),
            (ENTITY_MATCHES, self.entity_matches),
            (PHRASE_SCORE, self.phrase_score),
        ])
    }
}

/// Computes [`FeatureVector`]s against a fixed topic.
///
/// Extraction is deterministic for a given text, topic and recognizer.
#[derive(Clone)]
pub struct FeatureExtractor {
    topic: TopicConfig,
    recognizer: Arc<dyn EntityRecognizer>,
}

impl std::fmt::Debug for FeatureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureExtractor")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(TopicConfig::default())
    }
}

impl FeatureExtractor {
    /// Create an extractor with the built-in gazetteer recognizer. Place
    /// names containing a topic keyword are recognized in any case.
    pub fn new(topic: TopicConfig) -> Self {
        let recognizer = GazetteerRecognizer::default()
            .with_caseless_terms(topic.keywords.keys());
        Self::with_recognizer(topic, Arc::new(recognizer))
    }

    pub fn with_recognizer(
        topic: TopicConfig,
        recognizer: Arc<dyn EntityRecognizer>,
    ) -> Self {
        Self { topic, recognizer }
    }

    pub fn topic(&self) -> &TopicConfig {
        &self.topic
    }

    pub fn extract(&self, text: &str) -> FeatureVector {
        let lower = text.to_lowercase();
        FeatureVector {
            keyword_score: self.keyword_score(&lower),
            keyword_mentions: self.keyword_mentions(&lower),
            entity_matches: self.entity_matches(text),
            phrase_score: self.phrase_score(&lower),
        }
    }

    /// Sum of non-overlapping substring counts times keyword weight.
    fn keyword_score(&self, lower: &str) -> f64 {
        self.topic
            .keywords
            .iter()
            .map(|(keyword, weight)| {
                lower.matches(keyword.as_str()).count() as f64 * weight
            })
            .sum()
    }

    /// Occurrences of keywords as whole word tokens. Multi-word keywords
    /// never match a single token and so never count here.
    fn keyword_mentions(&self, lower: &str) -> f64 {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for token in WORD_RE.find_iter(lower) {
            *counts.entry(token.as_str()).or_default() += 1;
        }
        self.topic
            .keywords
            .keys()
            .map(|keyword| counts.get(keyword.as_str()).copied().unwrap_or(0))
            .sum::<usize>() as f64
    }

    fn entity_matches(&self, text: &str) -> f64 {
        self.recognizer
            .recognize(text)
            .iter()
            .filter(|e| {
                matches!(e.label, EntityLabel::Gpe | EntityLabel::Norp)
            })
            .filter(|e| {
                let entity = e.text.to_lowercase();
                self.topic
                    .keywords
                    .keys()
                    .any(|keyword| entity.contains(keyword.as_str()))
            })
            .count() as f64
    }

    /// Number of distinct phrases present; repeats do not add.
    fn phrase_score(&self, lower: &str) -> f64 {
        self.topic
            .phrases
            .iter()
            .filter(|phrase| lower.contains(phrase.as_str()))
            .count() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Entity;

    fn topic(keywords: &[(&str, f64)], phrases: &[&str]) -> TopicConfig {
        TopicConfig::new(
            keywords.iter().map(|(k, w)| (k.to_string(), *w)),
            phrases.iter().map(|p| p.to_string()),
        )
    }

    #[test]
    fn keyword_score_counts_substrings() {
        let extractor = FeatureExtractor::new(topic(&[("china", 4.0)], &[]));
        // "Indochina" contains the keyword as a substring.
        let f = extractor.extract("China and Indochina; CHINA again.");
        assert_eq!(f.keyword_score, 12.0);
        assert_eq!(f.keyword_mentions, 2.0);
    }

    #[test]
    fn substring_counting_does_not_overlap() {
        let extractor = FeatureExtractor::new(topic(&[("aa", 1.0)], &[]));
        assert_eq!(extractor.extract("aaaa").keyword_score, 2.0);
        assert_eq!(extractor.extract("aaa").keyword_score, 1.0);
    }

    #[test]
    fn multi_word_keywords_only_score_as_substrings() {
        let extractor =
            FeatureExtractor::new(topic(&[("hong kong", 3.0)], &[]));
        let f = extractor.extract("Hong Kong markets rose.");
        assert_eq!(f.keyword_score, 3.0);
        assert_eq!(f.keyword_mentions, 0.0);
    }

    #[test]
    fn phrase_counts_once_per_phrase() {
        let extractor = FeatureExtractor::new(topic(
            &[("china", 4.0)],
            &["chinese government", "hong kong protests"],
        ));
        let f = extractor.extract(
            "The Chinese government said... the Chinese government added.",
        );
        assert_eq!(f.phrase_score, 1.0);
    }

    #[test]
    fn entity_matches_require_keyword_in_entity() {
        let extractor = FeatureExtractor::default();
        let f = extractor
            .extract("Officials in Beijing and Paris met Chinese diplomats.");
        // Beijing (GPE) and Chinese (NORP) contain keywords; Paris does not.
        assert_eq!(f.entity_matches, 2.0);
    }

    struct FixedRecognizer(Vec<Entity>);

    impl EntityRecognizer for FixedRecognizer {
        fn recognize(&self, _text: &str) -> Vec<Entity> {
            self.0.clone()
        }
    }

    #[test]
    fn only_gpe_and_norp_entities_count() {
        let entity = |text: &str, label| Entity {
            text: text.to_string(),
            label,
            start: 0,
            end: text.len(),
        };
        let recognizer = FixedRecognizer(vec![
            entity("Greater China", EntityLabel::Gpe),
            entity("Chinese", EntityLabel::Norp),
            entity("China Daily", EntityLabel::Other),
        ]);
        let extractor = FeatureExtractor::with_recognizer(
            TopicConfig::default(),
            Arc::new(recognizer),
        );
        assert_eq!(extractor.extract("irrelevant").entity_matches, 2.0);
    }

    #[test]
    fn text_without_keywords_scores_zero() {
        let extractor = FeatureExtractor::default();
        let f = extractor.extract("The weather in the valley was mild today.");
        assert_eq!(f.keyword_score, 0.0);
        assert_eq!(f.keyword_mentions, 0.0);
        assert_eq!(f.entity_matches, 0.0);
        assert_eq!(f.phrase_score, 0.0);
    }

    #[test]
    fn from_map_requires_every_key() {
        let mut map: HashMap<String, f64> = FeatureVector::default()
            .to_map()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        assert!(FeatureVector::from_map(&map).is_ok());

        map.remove(ENTITY_MATCHES);
        assert!(matches!(
            FeatureVector::from_map(&map),
            Err(Error::MissingFeature(ENTITY_MATCHES))
        ));
    }
}
