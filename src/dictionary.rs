//! Dictionary management module
//!
//! Handles loading and querying word lists used by the dictionary finders.

use std::collections::BTreeSet;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extension of word-list files picked up by [`load_word_lists`].
pub const WORD_LIST_EXTENSION: &str = "words";

#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("Dictionary file not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Failed to read dictionary file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Dictionary file is empty")]
    EmptyFile,
}

/// An immutable, named set of lowercase words.
///
/// Cloning is not needed to share one between finders: wrap it in an `Arc`.
#[derive(Debug, Clone)]
pub struct Dictionary {
    name: String,
    words: BTreeSet<String>,
    max_word_len: usize,
}

impl Dictionary {
    /// Builds a dictionary from an in-memory word list.
    ///
    /// Words are trimmed and lowercased; blank lines and `#` comments are dropped.
    pub fn from_word_list<I, S>(name: impl Into<String>, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: BTreeSet<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty() && !w.starts_with('#'))
            .collect();
        let max_word_len = words.iter().map(|w| w.chars().count()).max().unwrap_or(0);

        Self {
            name: name.into(),
            words,
            max_word_len,
        }
    }

    /// Loads a dictionary from a newline separated word file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File does not exist
    /// - File cannot be read
    /// - File contains no words
    pub fn from_file<P: AsRef<Path>>(
        path: P,
        name: impl Into<String>,
    ) -> Result<Self, DictionaryError> {
        let path = path.as_ref();

        if !path.exists() {
            #[cfg(feature = "tracing")]
            tracing::error!("Dictionary load FAILED: FileNotFound {:?}", path);
            return Err(DictionaryError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let dictionary = Self::from_word_list(name, content.lines());

        if dictionary.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::error!("Dictionary load FAILED: Empty file {:?}", path);
            return Err(DictionaryError::EmptyFile);
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Dictionary '{}' loaded: {} words from {:?}",
            dictionary.name,
            dictionary.len(),
            path
        );

        Ok(dictionary)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Length in chars of the longest word.
    pub fn max_word_len(&self) -> usize {
        self.max_word_len
    }

    /// Returns `true` if `word` (already lowercase) is in the dictionary.
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    /// Returns `true` if at least one word starts with `prefix`.
    pub fn is_prefix(&self, prefix: &str) -> bool {
        self.words
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .next()
            .is_some_and(|w| w.starts_with(prefix))
    }

    /// log2 of the dictionary size: the bits needed to pick one word.
    pub fn word_count_bits(&self) -> f64 {
        (self.len().max(1) as f64).log2()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

/// Loads every `*.words` file in `dir`, naming each dictionary after its file stem.
///
/// Files that fail to load are returned alongside their path; they never stop
/// the remaining files from loading. Results are sorted by dictionary name.
pub fn load_word_lists<P: AsRef<Path>>(
    dir: P,
) -> Result<(Vec<Dictionary>, Vec<(PathBuf, DictionaryError)>), DictionaryError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(DictionaryError::FileNotFound(dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == WORD_LIST_EXTENSION))
        .collect();
    paths.sort();

    let mut loaded = Vec::new();
    let mut failed = Vec::new();
    for path in paths {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        match Dictionary::from_file(&path, name) {
            Ok(dict) => loaded.push(dict),
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Skipping word list {:?}: {}", path, e);
                failed.push((path, e));
            }
        }
    }

    loaded.sort_by(|a, b| a.name.cmp(&b.name));
    Ok((loaded, failed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn setup_with_tempfile(words: &[&str]) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        for word in words {
            writeln!(temp_file, "{}", word).expect("Failed to write");
        }
        temp_file
    }

    #[test]
    fn test_from_word_list_normalizes() {
        let dict = Dictionary::from_word_list("test", ["  Password ", "", "# comment", "qwerty"]);
        assert_eq!(dict.len(), 2);
        assert!(dict.contains("password"));
        assert!(!dict.contains("Password"));
        assert_eq!(dict.max_word_len(), 8);
        assert_eq!(dict.name(), "test");
    }

    #[test]
    fn test_is_prefix() {
        let dict = Dictionary::from_word_list("test", ["password", "pastry"]);
        assert!(dict.is_prefix("pas"));
        assert!(dict.is_prefix("password"));
        assert!(!dict.is_prefix("passwords"));
        assert!(!dict.is_prefix("q"));
        assert!(!dict.is_prefix("zzz"));
        assert!(dict.is_prefix(""));
    }

    #[test]
    fn test_word_count_bits() {
        let words: Vec<String> = (0..1024).map(|i| format!("w{i}")).collect();
        let dict = Dictionary::from_word_list("big", &words);
        assert!((dict.word_count_bits() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_from_file_not_found() {
        let result = Dictionary::from_file("/nonexistent/path/english.words", "english");
        assert!(matches!(result, Err(DictionaryError::FileNotFound(_))));
    }

    #[test]
    fn test_from_file_empty() {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        write!(temp_file, "\n\n").expect("Failed to write empty content");

        let result = Dictionary::from_file(temp_file.path(), "empty");
        assert!(matches!(result, Err(DictionaryError::EmptyFile)));
    }

    #[test]
    fn test_from_file_success() {
        let temp_file = setup_with_tempfile(&["password123", "qwerty"]);

        let dict = Dictionary::from_file(temp_file.path(), "custom").unwrap();
        assert_eq!(dict.len(), 2);
        assert!(dict.contains("qwerty"));
    }

    #[test]
    fn test_load_word_lists_skips_bad_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("names.words"), "alice\nbob\n").unwrap();
        std::fs::write(dir.path().join("english.words"), "horse\nbattery\n").unwrap();
        std::fs::write(dir.path().join("empty.words"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored\n").unwrap();

        let (loaded, failed) = load_word_lists(dir.path()).unwrap();
        let names: Vec<&str> = loaded.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["english", "names"]);
        assert_eq!(failed.len(), 1);
        assert!(matches!(failed[0].1, DictionaryError::EmptyFile));
    }

    #[test]
    fn test_load_word_lists_missing_dir() {
        let result = load_word_lists("/nonexistent/wordlists");
        assert!(matches!(result, Err(DictionaryError::FileNotFound(_))));
    }
}
