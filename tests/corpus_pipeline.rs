use std::path::Path;

use reportscope::{AppConfig, CorpusAnalyzer, CorpusReport, Error};

const BEIJING_A: &str = "Beijing announced new tariffs on Monday. \
    Officials in Beijing said the measures were temporary. \
    Markets outside Beijing fell sharply. \
    Analysts in Beijing expect talks to resume. \
    Beijing has not commented further.";

const BEIJING_B: &str = "Diplomats gathered in Beijing for the summit. \
    Beijing hosted delegations from twelve countries. \
    Security in Beijing was tight. \
    Hotels across Beijing were full. \
    The summit in Beijing ends on Friday.";

const GARDEN: &str = "Tomatoes need plenty of sun and regular water. \
    Mulch keeps the soil moist through the summer. \
    Prune the lower leaves once the plants are established.";

fn write_corpus(dir: &Path) {
    std::fs::write(dir.join("beijing_a.txt"), BEIJING_A).unwrap();
    std::fs::write(dir.join("beijing_b.txt"), BEIJING_B).unwrap();
    std::fs::write(dir.join("garden.txt"), GARDEN).unwrap();
    std::fs::write(dir.join("notes.md"), "Beijing Beijing Beijing").unwrap();
}

fn analyze(dir: &Path) -> CorpusReport {
    CorpusAnalyzer::new(&AppConfig::default())
        .analyze(dir)
        .unwrap()
}

fn names(docs: &[reportscope::corpus::DocumentVerdict]) -> Vec<&str> {
    docs.iter().map(|d| d.file_name.as_str()).collect()
}

#[test]
fn classifies_small_corpus() {
    let tmp = tempfile::tempdir().unwrap();
    write_corpus(tmp.path());

    let report = analyze(tmp.path());

    assert_eq!(report.document_count(), 3);
    assert_eq!(names(&report.related), vec!["beijing_a.txt", "beijing_b.txt"]);
    assert_eq!(names(&report.not_related), vec!["garden.txt"]);
    assert!(report.errors.is_empty());

    let total: usize = report.cluster_stats.values().map(|s| s.total).sum();
    let related: usize =
        report.cluster_stats.values().map(|s| s.related).sum();
    assert_eq!(total, 3);
    assert_eq!(related, 2);

    assert_eq!(report.clusters.len(), 3);
    assert_eq!(report.projection.len(), 3);
    for doc in report.related.iter().chain(&report.not_related) {
        assert!(doc.verdict.cluster.is_some());
        assert!(doc.verdict.cluster_weight.is_some());
        assert!((0.0..=1.0).contains(&doc.verdict.score));
    }
}

#[test]
fn lowercase_keyword_mentions_are_enough() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join("a.txt"),
        "beijing beijing beijing beijing beijing trade talks",
    )
    .unwrap();
    std::fs::write(
        tmp.path().join("b.txt"),
        "talks in beijing beijing beijing beijing beijing resumed",
    )
    .unwrap();
    std::fs::write(tmp.path().join("c.txt"), "The garden needs water.")
        .unwrap();

    let report = analyze(tmp.path());

    assert_eq!(names(&report.related), vec!["a.txt", "b.txt"]);
    assert_eq!(names(&report.not_related), vec!["c.txt"]);
    let total: usize = report.cluster_stats.values().map(|s| s.total).sum();
    assert_eq!(total, 3);
}

#[test]
fn repeated_runs_are_identical() {
    let tmp = tempfile::tempdir().unwrap();
    write_corpus(tmp.path());

    let first = analyze(tmp.path());
    let second = analyze(tmp.path());
    assert_eq!(first, second);
}

#[test]
fn json_report_lists_every_section() {
    let tmp = tempfile::tempdir().unwrap();
    write_corpus(tmp.path());

    let mut out = Vec::new();
    analyze(tmp.path()).write_json(&mut out).unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

    for key in [
        "related",
        "not_related",
        "errors",
        "clusters",
        "projection",
        "cluster_stats",
    ] {
        assert!(value.get(key).is_some(), "missing {key}");
    }
    assert_eq!(value["related"].as_array().unwrap().len(), 2);
}

#[test]
fn missing_directory_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let err = CorpusAnalyzer::new(&AppConfig::default())
        .analyze(&tmp.path().join("nope"))
        .unwrap_err();
    assert!(matches!(err, Error::DirectoryNotFound(_)));
}
