use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A discovered input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Bare file name; this is the document's identity in every result.
    pub file_name: String,
    /// Full path used for reading.
    pub path: PathBuf,
}

/// Extension accepted for input documents, matched case-insensitively.
const TEXT_EXTENSION: &str = "txt";

/// List the `.txt` files directly inside `root`.
///
/// Subdirectories are not descended into. Results are sorted by file name
/// so every run visits documents in the same order.
pub fn discover_text_files(root: &Path) -> Result<Vec<DiscoveredFile>> {
    if !root.is_dir() {
        return Err(Error::DirectoryNotFound(root.to_path_buf()));
    }

    let mut results = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let path = entry.path();

        // Follows symlinks; broken links are not files.
        if !path.is_file() || !is_text_file(&path) {
            continue;
        }

        results.push(DiscoveredFile {
            file_name: entry.file_name().to_string_lossy().into_owned(),
            path,
        });
    }

    results.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(results)
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TEXT_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(files: &[DiscoveredFile]) -> Vec<&str> {
        files.iter().map(|f| f.file_name.as_str()).collect()
    }

    #[test]
    fn discovers_txt_only() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "a").unwrap();
        std::fs::write(tmp.path().join("b.md"), "b").unwrap();
        std::fs::write(tmp.path().join("c.png"), "c").unwrap();

        let files = discover_text_files(tmp.path()).unwrap();
        assert_eq!(names(&files), vec!["a.txt"]);
        assert_eq!(files[0].path, tmp.path().join("a.txt"));
    }

    #[test]
    fn extension_match_ignores_case() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("UPPER.TXT"), "a").unwrap();
        std::fs::write(tmp.path().join("mixed.Txt"), "b").unwrap();

        let files = discover_text_files(tmp.path()).unwrap();
        assert_eq!(names(&files), vec!["UPPER.TXT", "mixed.Txt"]);
    }

    #[test]
    fn does_not_recurse() {
        let tmp = tempfile::tempdir().unwrap();
        let sub = tmp.path().join("nested");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("deep.txt"), "deep").unwrap();
        std::fs::write(tmp.path().join("top.txt"), "top").unwrap();

        let files = discover_text_files(tmp.path()).unwrap();
        assert_eq!(names(&files), vec!["top.txt"]);
    }

    #[test]
    fn directory_named_like_a_text_file_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("folder.txt")).unwrap();

        let files = discover_text_files(tmp.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn results_are_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("z.txt"), "z").unwrap();
        std::fs::write(tmp.path().join("a.txt"), "a").unwrap();
        std::fs::write(tmp.path().join("m.txt"), "m").unwrap();

        let files = discover_text_files(tmp.path()).unwrap();
        assert_eq!(names(&files), vec!["a.txt", "m.txt", "z.txt"]);
    }

    #[test]
    fn empty_directory() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(discover_text_files(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("absent");
        let err = discover_text_files(&missing).unwrap_err();
        assert!(matches!(err, Error::DirectoryNotFound(p) if p == missing));
    }
}
