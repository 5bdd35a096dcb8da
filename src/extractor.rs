//! Reporting-sentence extraction over a directory of text files.
//!
//! Each file is cleaned, segmented and parsed sentence by sentence. Every
//! sentence with at least one reporting verb becomes a [`ReportingRow`]
//! carrying up to `context_range` neighbouring sentences from the same
//! file on each side. Rows are numbered from 1 across the whole run.

use std::{
    collections::HashSet,
    io::Write,
    path::Path,
    sync::Arc,
};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::{
    config::ExtractionConfig,
    error::{FileError, Result},
    parser::{DependencyParser, HeuristicParser},
    reporting::{ReportingVerbDetector, load_lexicon},
    segmenter::{SentenceSegmenter, clean_text},
    walker::discover_text_files,
};

/// Column headers of the output table.
pub const CSV_HEADER: [&str; 4] =
    ["No.", "TextID", "Context", "ReportingSentence"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportingRow {
    /// 1-based position in the run's output.
    pub number: usize,
    pub file_name: String,
    pub context: String,
    /// Sentence rebuilt from its tokens, verbs marked if requested.
    pub sentence: String,
}

/// Rows plus the files that could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionOutcome {
    pub rows: Vec<ReportingRow>,
    pub errors: Vec<FileError>,
}

#[derive(Clone)]
pub struct ReportingExtractor {
    segmenter: SentenceSegmenter,
    parser: Arc<dyn DependencyParser>,
    detector: ReportingVerbDetector,
    context_range: usize,
    mark_verbs: bool,
}

impl std::fmt::Debug for ReportingExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportingExtractor")
            .field("segmenter", &self.segmenter)
            .field("detector", &self.detector)
            .field("context_range", &self.context_range)
            .field("mark_verbs", &self.mark_verbs)
            .finish_non_exhaustive()
    }
}

impl ReportingExtractor {
    /// Extractor with the built-in segmenter and parser. The parser also
    /// learns the lexicon entries as verbs.
    pub fn new(lexicon: HashSet<String>, config: &ExtractionConfig) -> Self {
        let parser = HeuristicParser::default().with_verbs(&lexicon);
        Self {
            segmenter: SentenceSegmenter::new(config.max_merge),
            parser: Arc::new(parser),
            detector: ReportingVerbDetector::new(lexicon),
            context_range: config.context_range,
            mark_verbs: config.mark_verbs,
        }
    }

    /// Load the lexicon from `path` first.
    ///
    /// A missing lexicon is fatal: no extraction happens without one.
    pub fn from_lexicon_file(
        path: &Path,
        config: &ExtractionConfig,
    ) -> Result<Self> {
        let lexicon = load_lexicon(path)?;
        info!(entries = lexicon.len(), "loaded reporting-verb lexicon");
        Ok(Self::new(lexicon, config))
    }

    pub fn with_parser(mut self, parser: Arc<dyn DependencyParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_segmenter(mut self, segmenter: SentenceSegmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Rows for one document, numbered from 1.
    pub fn extract_text(
        &self,
        file_name: &str,
        text: &str,
    ) -> Vec<ReportingRow> {
        let sentences = self.segmenter.segment(&clean_text(text));
        let mut rows = Vec::new();

        for (idx, sentence) in sentences.iter().enumerate() {
            let parsed = self.parser.parse(sentence);
            let verbs = self.detector.detect(&parsed);
            if verbs.is_empty() {
                continue;
            }
            debug!(file = file_name, sentence = idx, ?verbs, "match");

            let start = idx.saturating_sub(self.context_range);
            let end = (idx + self.context_range + 1).min(sentences.len());
            let context = sentences[start..end].join(" ");

            let sentence = if self.mark_verbs {
                parsed.render(|i| {
                    let text = &parsed.tokens[i].text;
                    if verbs.contains(&i) {
                        format!("[{text}]")
                    } else {
                        text.clone()
                    }
                })
            } else {
                parsed.text()
            };

            rows.push(ReportingRow {
                number: rows.len() + 1,
                file_name: file_name.to_string(),
                context: context.trim().to_string(),
                sentence,
            });
        }
        rows
    }

    /// Process every `.txt` file directly inside `dir`.
    ///
    /// Files are handled in file-name order; unreadable ones are recorded
    /// and skipped.
    pub fn extract_dir(&self, dir: &Path) -> Result<ExtractionOutcome> {
        let files = discover_text_files(dir)?;
        info!(files = files.len(), dir = %dir.display(), "extracting");

        let per_file: Vec<_> = files
            .par_iter()
            .map(|file| -> std::result::Result<Vec<ReportingRow>, FileError> {
                let text = std::fs::read_to_string(&file.path).map_err(|e| {
                    FileError {
                        file_name: file.file_name.clone(),
                        message: e.to_string(),
                    }
                })?;
                Ok(self.extract_text(&file.file_name, &text))
            })
            .collect();

        let mut outcome = ExtractionOutcome::default();
        for result in per_file {
            match result {
                Ok(rows) => {
                    for mut row in rows {
                        row.number = outcome.rows.len() + 1;
                        outcome.rows.push(row);
                    }
                }
                Err(e) => {
                    error!(file = %e.file_name, "read failed: {}", e.message);
                    outcome.errors.push(e);
                }
            }
        }

        if outcome.rows.is_empty() {
            warn!(dir = %dir.display(), "no reporting sentences found");
        } else {
            info!(rows = outcome.rows.len(), "extraction finished");
        }
        Ok(outcome)
    }
}

fn write_csv_field<W: Write>(out: &mut W, field: &str) -> std::io::Result<()> {
    if field.contains([',', '"', '\n', '\r']) {
        write!(out, "\"{}\"", field.replace('"', "\"\""))
    } else {
        write!(out, "{field}")
    }
}

fn write_csv_record<W: Write>(
    out: &mut W,
    fields: &[&str],
) -> std::io::Result<()> {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            write!(out, ",")?;
        }
        write_csv_field(out, field)?;
    }
    writeln!(out)
}

/// Write rows as a four-column CSV table with a header line.
pub fn write_csv<W: Write>(
    rows: &[ReportingRow],
    out: &mut W,
) -> std::io::Result<()> {
    write_csv_record(out, &CSV_HEADER)?;
    for row in rows {
        let number = row.number.to_string();
        write_csv_record(
            out,
            &[
                number.as_str(),
                row.file_name.as_str(),
                row.context.as_str(),
                row.sentence.as_str(),
            ],
        )?;
    }
    Ok(())
}

/// Write the CSV to `path`, creating missing parent directories.
pub fn write_csv_file(rows: &[ReportingRow], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut out = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_csv(rows, &mut out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::Error,
        parser::{DepLabel, ParsedSentence, Pos, Token},
    };

    fn extractor(context_range: usize) -> ReportingExtractor {
        let config = ExtractionConfig {
            context_range,
            ..ExtractionConfig::default()
        };
        ReportingExtractor::new(
            ["say", "claim"].iter().map(|v| v.to_string()).collect(),
            &config,
        )
    }

    #[test]
    fn finds_reporting_sentence_with_context() {
        let text = "Rain fell. The minister said the policy would change. \
                    Markets rose. Trade slowed.";
        let rows = extractor(1).extract_text("a.txt", text);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].number, 1);
        assert_eq!(rows[0].file_name, "a.txt");
        assert_eq!(
            rows[0].context,
            "Rain fell. The minister said the policy would change. \
             Markets rose."
        );
        assert_eq!(
            rows[0].sentence,
            "The minister said the policy would change ."
        );
    }

    #[test]
    fn context_is_clipped_at_file_edges() {
        let text = "She said it was over. Nothing else happened.";
        let rows = extractor(3).extract_text("b.txt", text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].context, text);
    }

    #[test]
    fn contractions_are_rejoined() {
        let rows = extractor(0)
            .extract_text("c.txt", "He said they didn't know the answer.");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sentence, "He said they didn't know the answer .");
        assert_eq!(rows[0].context, "He said they didn't know the answer.");
    }

    #[test]
    fn mark_verbs_wraps_detected_verbs() {
        let config = ExtractionConfig {
            mark_verbs: true,
            ..ExtractionConfig::default()
        };
        let extractor =
            ReportingExtractor::new(["say".to_string()].into(), &config);
        let rows = extractor.extract_text("d.txt", "Officials said so.");
        assert_eq!(rows[0].sentence, "Officials [said] so .");
    }

    struct FixedParser;

    impl DependencyParser for FixedParser {
        fn parse(&self, sentence: &str) -> ParsedSentence {
            let mut parsed = ParsedSentence::new(
                sentence
                    .split_whitespace()
                    .map(|w| Token::new(w, w.to_lowercase(), Pos::Verb))
                    .collect(),
            );
            if parsed.len() > 1 {
                parsed.attach(1, 0, DepLabel::Dobj);
            }
            parsed
        }
    }

    #[test]
    fn custom_parser_is_used() {
        let extractor = extractor(0).with_parser(Arc::new(FixedParser));
        let rows = extractor.extract_text("e.txt", "Say hello. Claim.");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sentence, "Say hello.");
    }

    #[test]
    fn directory_rows_are_numbered_across_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("a.txt"),
            "He said it was late. They said nothing more.",
        )
        .unwrap();
        std::fs::write(tmp.path().join("b.txt"), "She said it again.").unwrap();
        std::fs::write(tmp.path().join("c.txt"), "No reports here.").unwrap();

        let outcome = extractor(1).extract_dir(tmp.path()).unwrap();
        let summary: Vec<(usize, &str)> = outcome
            .rows
            .iter()
            .map(|r| (r.number, r.file_name.as_str()))
            .collect();
        assert_eq!(summary, vec![(1, "a.txt"), (2, "a.txt"), (3, "b.txt")]);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn non_latin_words_do_not_abort_the_batch() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("a.txt"),
            "The minister said \u{4E38}ed words. Officials \u{4E38}ing it.",
        )
        .unwrap();
        std::fs::write(tmp.path().join("b.txt"), "She said it again.").unwrap();

        let outcome = extractor(1).extract_dir(tmp.path()).unwrap();
        assert!(outcome.errors.is_empty());
        let files: Vec<&str> =
            outcome.rows.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(files, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn unreadable_file_is_recorded() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("bad.txt"), [0xff, 0xfe, 0xfd]).unwrap();
        std::fs::write(tmp.path().join("good.txt"), "He said so.").unwrap();

        let outcome = extractor(1).extract_dir(tmp.path()).unwrap();
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].file_name, "bad.txt");
    }

    #[test]
    fn missing_directory_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let err = extractor(1)
            .extract_dir(&tmp.path().join("absent"))
            .unwrap_err();
        assert!(matches!(err, Error::DirectoryNotFound(_)));
    }

    #[test]
    fn csv_quotes_only_when_needed() {
        let rows = vec![ReportingRow {
            number: 1,
            file_name: "a.txt".into(),
            context: "One, two.".into(),
            sentence: "He said \"yes\" .".into(),
        }];
        let mut out = Vec::new();
        write_csv(&rows, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "No.,TextID,Context,ReportingSentence\n\
             1,a.txt,\"One, two.\",\"He said \"\"yes\"\" .\"\n"
        );
    }

    #[test]
    fn csv_file_creates_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("output").join("output.csv");
        write_csv_file(&[], &path).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "No.,TextID,Context,ReportingSentence\n"
        );
    }
}
