use std::path::Path;

use reportscope::{
    Error,
    ReportingExtractor,
    config::ExtractionConfig,
    extractor::write_csv_file,
};

fn write_lexicon(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("verbs.txt");
    std::fs::write(&path, "say\nsaid\nclaim\n\nwarn\n").unwrap();
    path
}

#[test]
fn extracts_rows_across_files_and_writes_csv() {
    let tmp = tempfile::tempdir().unwrap();
    let texts = tmp.path().join("texts");
    std::fs::create_dir(&texts).unwrap();
    std::fs::write(
        texts.join("01.txt"),
        "The weather was calm. The minister said the policy would change. \
         Nobody objected.",
    )
    .unwrap();
    std::fs::write(texts.join("02.txt"), "Prices rose again.").unwrap();
    std::fs::write(
        texts.join("03.txt"),
        "Critics claimed that the vote was rigged.",
    )
    .unwrap();

    let config = ExtractionConfig {
        context_range: 1,
        ..ExtractionConfig::default()
    };
    let lexicon = write_lexicon(tmp.path());
    let extractor =
        ReportingExtractor::from_lexicon_file(&lexicon, &config).unwrap();
    let outcome = extractor.extract_dir(&texts).unwrap();

    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.rows.len(), 2);
    assert_eq!(outcome.rows[0].number, 1);
    assert_eq!(outcome.rows[0].file_name, "01.txt");
    assert_eq!(
        outcome.rows[0].context,
        "The weather was calm. The minister said the policy would change. \
         Nobody objected."
    );
    assert_eq!(outcome.rows[1].number, 2);
    assert_eq!(outcome.rows[1].file_name, "03.txt");
    assert_eq!(
        outcome.rows[1].sentence,
        "Critics claimed that the vote was rigged ."
    );

    let csv = tmp.path().join("out").join("rows.csv");
    write_csv_file(&outcome.rows, &csv).unwrap();
    let written = std::fs::read_to_string(&csv).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "No.,TextID,Context,ReportingSentence");
    assert!(lines[2].starts_with("2,03.txt,"));
}

#[test]
fn quoted_speech_split_by_the_splitter_is_rejoined() {
    let tmp = tempfile::tempdir().unwrap();
    let texts = tmp.path().join("texts");
    std::fs::create_dir(&texts).unwrap();
    std::fs::write(
        texts.join("quote.txt"),
        "\u{201C}We will not back down. Never.\u{201D} she said.",
    )
    .unwrap();

    let extractor = ReportingExtractor::from_lexicon_file(
        &write_lexicon(tmp.path()),
        &ExtractionConfig::default(),
    )
    .unwrap();
    let outcome = extractor.extract_dir(&texts).unwrap();

    assert_eq!(outcome.rows.len(), 1);
    assert!(outcome.rows[0].context.contains("Never."));
    assert!(outcome.rows[0].context.ends_with("she said."));
}

#[test]
fn missing_lexicon_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let err = ReportingExtractor::from_lexicon_file(
        &tmp.path().join("absent.txt"),
        &ExtractionConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::LexiconNotFound(_)));
}
