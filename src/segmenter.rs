//! Sentence segmentation with quotation repair.
//!
//! A boundary detector cuts text into raw candidates, which often split a
//! quotation in two. [`merge_quoted`] glues such pieces back together by
//! tracking the parity of `"` characters, and [`normalize_sentence`] tidies
//! the spacing around punctuation afterwards.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// The only quote character left after [`clean_text`].
pub const QUOTE: char = '"';

static CURLY_QUOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[\u{201C}\u{201D}]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.,!?])").expect("valid regex"));
static GLUED_AFTER_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.,])(\w)").expect("valid regex"));

/// Replace curly double quotes with `"` and collapse whitespace runs.
///
/// ```
/// use reportscope::segmenter::clean_text;
///
/// let cleaned = clean_text("  \u{201C}Yes,\u{201D}\n\n she said. ");
/// assert_eq!(cleaned, "\"Yes,\" she said.");
/// ```
pub fn clean_text(text: &str) -> String {
    let text = CURLY_QUOTES.replace_all(text, "\"");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Drop whitespace before `. , ! ?` and add a space between `.` or `,` and
/// a word character that directly follows it.
///
/// The second rule also splits decimals (`3.5` becomes `3. 5`).
pub fn normalize_sentence(sentence: &str) -> String {
    let sentence = SPACE_BEFORE_PUNCT.replace_all(sentence, "$1");
    GLUED_AFTER_PUNCT.replace_all(&sentence, "$1 $2").into_owned()
}

/// Sentence boundary detection.
pub trait SentenceSplitter: Send + Sync {
    /// Ordered, trimmed, non-empty sentence candidates.
    fn split(&self, text: &str) -> Vec<String>;
}

/// UAX #29 sentence boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSentenceSplitter;

impl SentenceSplitter for UnicodeSentenceSplitter {
    fn split(&self, text: &str) -> Vec<String> {
        text.unicode_sentences()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    Scanning,
    InsideQuote,
}

impl QuoteState {
    fn from_count(quotes: usize) -> Self {
        if quotes % 2 == 0 {
            Self::Scanning
        } else {
            Self::InsideQuote
        }
    }
}

fn count_quotes(s: &str) -> usize {
    s.chars().filter(|&c| c == QUOTE).count()
}

/// Merge raw candidates that end inside an open quotation.
///
/// A group starts at the next unconsumed candidate. While the group's
/// cumulative quote count is odd, the following candidate is absorbed, up
/// to `max_merge` absorptions. The group then closes, balanced or not, and
/// its members are joined with single spaces. The output is never longer
/// than the input.
///
/// ```
/// use reportscope::segmenter::merge_quoted;
///
/// let raw = ["He said, \"Hello", "world.\"", "Then left."].map(String::from);
/// assert_eq!(
///     merge_quoted(&raw, 3),
///     vec!["He said, \"Hello world.\"", "Then left."]
/// );
/// ```
pub fn merge_quoted(raw: &[String], max_merge: usize) -> Vec<String> {
    let mut merged = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        let mut group = vec![raw[i].as_str()];
        let mut quotes = count_quotes(&raw[i]);
        let mut absorbed = 0;
        let mut state = QuoteState::from_count(quotes);

        while state == QuoteState::InsideQuote
            && absorbed < max_merge
            && i + 1 < raw.len()
        {
            i += 1;
            absorbed += 1;
            group.push(&raw[i]);
            quotes += count_quotes(&raw[i]);
            state = QuoteState::from_count(quotes);
        }

        merged.push(group.join(" "));
        i += 1;
    }

    merged
}

/// Splits cleaned text into quote-repaired, normalised sentences.
#[derive(Clone)]
pub struct SentenceSegmenter {
    splitter: Arc<dyn SentenceSplitter>,
    max_merge: usize,
}

impl std::fmt::Debug for SentenceSegmenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentenceSegmenter")
            .field("max_merge", &self.max_merge)
            .finish_non_exhaustive()
    }
}

impl SentenceSegmenter {
    pub fn new(max_merge: usize) -> Self {
        Self::with_splitter(Arc::new(UnicodeSentenceSplitter), max_merge)
    }

    pub fn with_splitter(
        splitter: Arc<dyn SentenceSplitter>,
        max_merge: usize,
    ) -> Self {
        Self {
            splitter,
            max_merge,
        }
    }

    /// Segment text that has already been through [`clean_text`].
    pub fn segment(&self, text: &str) -> Vec<String> {
        let raw = self.splitter.split(text);
        merge_quoted(&raw, self.max_merge)
            .iter()
            .map(|s| normalize_sentence(s))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn clean_text_normalizes_quotes_and_spaces() {
        assert_eq!(
            clean_text("\u{201C}We agree,\u{201D}\t\tthey  said.\n"),
            "\"We agree,\" they said."
        );
    }

    #[test]
    fn balanced_candidates_pass_through() {
        let raw = strings(&["One.", "Two \"quoted\" words.", "Three."]);
        assert_eq!(merge_quoted(&raw, 3), raw);
    }

    #[test]
    fn merged_candidates_are_never_split() {
        let raw = strings(&["He said, \"Hello", "world.\" Then left."]);
        assert_eq!(
            merge_quoted(&raw, 3),
            vec!["He said, \"Hello world.\" Then left."]
        );
    }

    #[test]
    fn merge_stops_at_cap_even_if_unbalanced() {
        let raw = strings(&["\"A.", "B.", "C.", "D."]);
        assert_eq!(merge_quoted(&raw, 2), vec!["\"A. B. C.", "D."]);
    }

    #[test]
    fn zero_cap_never_merges() {
        let raw = strings(&["\"Open.", "Close.\""]);
        assert_eq!(merge_quoted(&raw, 0), raw);
    }

    #[test]
    fn trailing_open_quote_closes_at_end() {
        let raw = strings(&["Fine.", "\"Dangling"]);
        assert_eq!(merge_quoted(&raw, 3), raw);
    }

    #[test]
    fn normalize_fixes_punctuation_spacing() {
        assert_eq!(normalize_sentence("Hello , world !"), "Hello, world!");
        assert_eq!(normalize_sentence("end.Start,next"), "end. Start, next");
    }

    #[test]
    fn unicode_splitter_trims_and_drops_empty() {
        let sentences =
            UnicodeSentenceSplitter.split("First one. Second one?  Third!");
        assert_eq!(sentences, vec!["First one.", "Second one?", "Third!"]);
        assert!(UnicodeSentenceSplitter.split("   ").is_empty());
    }

    #[test]
    fn closing_quote_then_new_sentence() {
        let segmenter = SentenceSegmenter::new(3);
        let text =
            clean_text("He said, \u{201C}Hello. world.\u{201D} Then left.");
        assert_eq!(
            segmenter.segment(&text),
            vec!["He said, \"Hello. world.\"", "Then left."]
        );
    }

    #[test]
    fn quote_spanning_sentences_is_rejoined() {
        let segmenter = SentenceSegmenter::new(3);
        let text = "\"We will win. Nobody doubts it.\" She left.";
        assert_eq!(
            segmenter.segment(text),
            vec!["\"We will win. Nobody doubts it.\"", "She left."]
        );
    }

    struct FixedSplitter(Vec<String>);

    impl SentenceSplitter for FixedSplitter {
        fn split(&self, _text: &str) -> Vec<String> {
            self.0.clone()
        }
    }

    #[test]
    fn segmenter_merges_then_normalizes() {
        let splitter = FixedSplitter(strings(&[
            "She said , \"We will",
            "win.\"",
            "Crowds cheered .",
        ]));
        let segmenter = SentenceSegmenter::with_splitter(Arc::new(splitter), 3);
        assert_eq!(
            segmenter.segment("ignored"),
            vec!["She said, \"We will win.\"", "Crowds cheered."]
        );
    }
}
