//! Named-entity recognition used by the feature extractor.
//!
//! Only two categories matter downstream: geo-political entities and
//! nationality/religious/political groups. [`EntityRecognizer`] is the seam
//! for plugging in a statistical model; [`GazetteerRecognizer`] is the
//! built-in lexicon-driven implementation.

use std::collections::HashMap;

use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

/// Entity categories distinguished by the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntityLabel {
    /// Geo-political entity: countries, cities, regions.
    Gpe,
    /// Nationality, religious or political group.
    Norp,
    Other,
}

/// A recognized entity with byte offsets into the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
    pub start: usize,
    pub end: usize,
}

/// Anything that can tag entities in raw text.
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, text: &str) -> Vec<Entity>;
}

const GPE_ENTRIES: &[&str] = &[
    // Greater China
    "china",
    "people's republic of china",
    "prc",
    "beijing",
    "shanghai",
    "shenzhen",
    "guangzhou",
    "hangzhou",
    "wuhan",
    "chongqing",
    "tianjin",
    "nanjing",
    "chengdu",
    "xi'an",
    "hong kong",
    "macao",
    "macau",
    "taiwan",
    "taipei",
    "tibet",
    "lhasa",
    "xinjiang",
    "inner mongolia",
    "south china sea",
    // Countries and capitals
    "united states",
    "u.s.",
    "usa",
    "america",
    "washington",
    "united kingdom",
    "uk",
    "britain",
    "london",
    "russia",
    "moscow",
    "japan",
    "tokyo",
    "south korea",
    "north korea",
    "korea",
    "seoul",
    "pyongyang",
    "india",
    "new delhi",
    "pakistan",
    "vietnam",
    "philippines",
    "manila",
    "indonesia",
    "malaysia",
    "singapore",
    "thailand",
    "australia",
    "canberra",
    "canada",
    "ottawa",
    "mexico",
    "brazil",
    "germany",
    "berlin",
    "france",
    "paris",
    "italy",
    "rome",
    "spain",
    "madrid",
    "ukraine",
    "kyiv",
    "iran",
    "tehran",
    "israel",
    "saudi arabia",
    "turkey",
    "egypt",
    "nigeria",
    "kenya",
    "south africa",
    "ethiopia",
    "europe",
    "european union",
    "africa",
    "asia",
    "new york",
    "brussels",
    "geneva",
];

const NORP_ENTRIES: &[&str] = &[
    "chinese",
    "taiwanese",
    "tibetan",
    "tibetans",
    "uyghur",
    "uyghurs",
    "uighur",
    "uighurs",
    "han",
    "cantonese",
    "american",
    "americans",
    "british",
    "russian",
    "russians",
    "japanese",
    "korean",
    "koreans",
    "indian",
    "indians",
    "vietnamese",
    "filipino",
    "australian",
    "canadian",
    "german",
    "french",
    "italian",
    "spanish",
    "ukrainian",
    "iranian",
    "israeli",
    "african",
    "africans",
    "asian",
    "european",
    "europeans",
    "western",
    "muslim",
    "muslims",
    "christian",
    "christians",
    "buddhist",
    "buddhists",
    "communist",
    "communists",
    "democrat",
    "democrats",
    "republican",
    "republicans",
    "chinese communist party",
];

/// Lexicon-driven recognizer.
///
/// Scans capitalised word runs and takes the longest gazetteer entry that
/// starts at each one. Matching is case-insensitive once the first word is
/// known to be capitalised, and a trailing possessive `'s` is ignored.
///
/// Entries containing one of the [caseless
/// terms](Self::with_caseless_terms) also match in lower case, so
/// "talks in beijing" still yields an entity for a Beijing topic.
#[derive(Debug, Clone)]
pub struct GazetteerRecognizer {
    entries: HashMap<String, EntityLabel>,
    max_words: usize,
    caseless: Vec<String>,
}

impl Default for GazetteerRecognizer {
    fn default() -> Self {
        let entries = GPE_ENTRIES
            .iter()
            .map(|e| (*e, EntityLabel::Gpe))
            .chain(NORP_ENTRIES.iter().map(|e| (*e, EntityLabel::Norp)));
        Self::new(entries)
    }
}

impl GazetteerRecognizer {
    pub fn new<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, EntityLabel)>,
    {
        let mut map = HashMap::new();
        let mut max_words = 1;
        for (entry, label) in entries {
            let words: Vec<String> = word_spans(entry)
                .into_iter()
                .map(|(w, _, _)| w.to_lowercase())
                .collect();
            if words.is_empty() {
                continue;
            }
            max_words = max_words.max(words.len());
            map.insert(words.join(" "), label);
        }
        Self {
            entries: map,
            max_words,
            caseless: Vec::new(),
        }
    }

    /// Let entries containing any of `terms` match without capitalisation.
    pub fn with_caseless_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.caseless.extend(
            terms
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty()),
        );
        self
    }

    fn is_caseless(&self, entry: &str) -> bool {
        self.caseless.iter().any(|t| entry.contains(t.as_str()))
    }
}

impl EntityRecognizer for GazetteerRecognizer {
    fn recognize(&self, text: &str) -> Vec<Entity> {
        let words = word_spans(text);
        let mut entities = Vec::new();

        let mut i = 0;
        while i < words.len() {
            let (first, start, _) = words[i];
            let capitalised =
                first.chars().next().is_some_and(char::is_uppercase);
            if !capitalised && self.caseless.is_empty() {
                i += 1;
                continue;
            }

            let longest = self.max_words.min(words.len() - i);
            let matched = (1..=longest).rev().find_map(|len| {
                let key = words[i..i + len]
                    .iter()
                    .map(|(w, _, _)| w.to_lowercase())
                    .collect::<Vec<_>>()
                    .join(" ");
                self.entries
                    .get(&key)
                    .filter(|_| capitalised || self.is_caseless(&key))
                    .map(|label| (len, *label))
            });

            match matched {
                Some((len, label)) => {
                    let end = words[i + len - 1].2;
                    entities.push(Entity {
                        text: text[start..end].to_string(),
                        label,
                        start,
                        end,
                    });
                    i += len;
                }
                None => i += 1,
            }
        }

        entities
    }
}

/// Split into UAX #29 words as `(word, start, end)` byte spans, with any
/// possessive suffix cut off.
fn word_spans(text: &str) -> Vec<(&str, usize, usize)> {
    text.unicode_word_indices()
        .map(|(start, word)| {
            let word = word
                .strip_suffix("'s")
                .or_else(|| word.strip_suffix("\u{2019}s"))
                .filter(|w| !w.is_empty())
                .unwrap_or(word);
            (word, start, start + word.len())
        })
        .collect()
}
