//! Finder set assembly
//!
//! Turns a [`FinderConfig`] into a [`ParallelFinder`]: built-in structural
//! finders, every word list found on disk, and an optional custom dictionary.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::dictionary::{Dictionary, DictionaryError, load_word_lists};
use crate::finders::{DictionaryPatternsFinder, PatternFinder, structural_finders};
use crate::parallel::ParallelFinder;
use crate::strategy::{CaseInsensitive, ExactWord, Leet, Reversed};

/// Environment variable holding the directory of `*.words` files.
pub const WORDLIST_DIR_ENV: &str = "PASSFAULT_WORDLIST_DIR";
/// Environment variable holding the path of a custom dictionary.
pub const CUSTOM_DICTIONARY_ENV: &str = "PASSFAULT_CUSTOM_DICTIONARY";
/// Name given to a dictionary loaded from the custom dictionary path.
pub const CUSTOM_DICTIONARY_NAME: &str = "customDict";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("A custom dictionary is required by the selected policy but none was given")]
    MissingCustomDictionary,
}

/// Which dictionary finders end up in the finder set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DictionarySelection {
    /// Built-in finders and default word lists only.
    #[default]
    Defaults,
    /// Defaults plus an exact-match finder over the custom dictionary.
    DefaultsPlusCustom,
    /// Only the exact-match finder over the custom dictionary.
    CustomOnly,
}

#[derive(Debug, Clone, Default)]
pub struct FinderConfig {
    pub word_list_dir: Option<PathBuf>,
    pub custom_dictionary: Option<PathBuf>,
    pub selection: DictionarySelection,
}

/// Returns the word-list directory.
///
/// Priority:
/// 1. Environment variable `PASSFAULT_WORDLIST_DIR`
/// 2. Default path `./wordlists`
pub fn get_word_list_dir() -> PathBuf {
    std::env::var(WORDLIST_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./wordlists"))
}

impl FinderConfig {
    /// Reads the configuration from the environment.
    ///
    /// A custom dictionary path switches the selection to `DefaultsPlusCustom`.
    pub fn from_env() -> Self {
        let custom_dictionary = std::env::var(CUSTOM_DICTIONARY_ENV).ok().map(PathBuf::from);
        let selection = if custom_dictionary.is_some() {
            DictionarySelection::DefaultsPlusCustom
        } else {
            DictionarySelection::Defaults
        };
        Self {
            word_list_dir: Some(get_word_list_dir()),
            custom_dictionary,
            selection,
        }
    }
}

/// One finder per matching strategy over a shared dictionary.
pub fn dictionary_finders(dictionary: Arc<Dictionary>) -> Vec<Arc<dyn PatternFinder>> {
    vec![
        Arc::new(DictionaryPatternsFinder::new(Arc::clone(&dictionary), ExactWord)),
        Arc::new(DictionaryPatternsFinder::new(Arc::clone(&dictionary), CaseInsensitive)),
        Arc::new(DictionaryPatternsFinder::new(Arc::clone(&dictionary), Leet)),
        Arc::new(DictionaryPatternsFinder::new(dictionary, Reversed)),
    ]
}

pub struct FinderSetBuilder {
    config: FinderConfig,
    finders: Vec<Arc<dyn PatternFinder>>,
    custom: Option<Arc<dyn PatternFinder>>,
    load_errors: Vec<(PathBuf, DictionaryError)>,
}

impl FinderSetBuilder {
    pub fn new(config: FinderConfig) -> Self {
        Self {
            config,
            finders: Vec::new(),
            custom: None,
            load_errors: Vec::new(),
        }
    }

    pub fn with_structural_finders(mut self) -> Self {
        self.finders.extend(structural_finders());
        self
    }

    /// Adds every strategy over each word list in the configured directory.
    ///
    /// Failures are kept in [`load_errors`](Self::load_errors); they never
    /// stop the other word lists from loading.
    pub fn load_default_word_lists(mut self) -> Self {
        let Some(dir) = self.config.word_list_dir.clone() else {
            return self;
        };

        match load_word_lists(&dir) {
            Ok((dictionaries, failed)) => {
                for dictionary in dictionaries {
                    self.finders.extend(dictionary_finders(Arc::new(dictionary)));
                }
                self.load_errors.extend(failed);
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("Default word lists unavailable in {:?}: {}", dir, e);
                self.load_errors.push((dir, e));
            }
        }
        self
    }

    pub fn with_dictionary(mut self, dictionary: Dictionary) -> Self {
        self.finders.extend(dictionary_finders(Arc::new(dictionary)));
        self
    }

    pub fn with_finder(mut self, finder: Arc<dyn PatternFinder>) -> Self {
        self.finders.push(finder);
        self
    }

    /// Uses `dictionary` as the custom dictionary, matched exactly.
    pub fn with_custom_dictionary(mut self, dictionary: Dictionary) -> Self {
        self.custom = Some(Arc::new(DictionaryPatternsFinder::new(
            Arc::new(dictionary),
            ExactWord,
        )));
        self
    }

    /// Loads the custom dictionary from the configured path, if any.
    pub fn load_custom_dictionary(mut self) -> Self {
        let Some(path) = self.config.custom_dictionary.clone() else {
            return self;
        };
        match Dictionary::from_file(&path, CUSTOM_DICTIONARY_NAME) {
            Ok(dictionary) => self.with_custom_dictionary(dictionary),
            Err(e) => {
                self.load_errors.push((path, e));
                self
            }
        }
    }

    /// Dictionary files that failed to load so far.
    pub fn load_errors(&self) -> &[(PathBuf, DictionaryError)] {
        &self.load_errors
    }

    /// Applies the selection policy and returns the finder set.
    ///
    /// # Errors
    ///
    /// `MissingCustomDictionary` when the policy needs a custom dictionary
    /// that was never provided or failed to load.
    pub fn build(self) -> Result<ParallelFinder, ConfigError> {
        let finders = match (self.config.selection, self.custom) {
            (DictionarySelection::Defaults, _) => self.finders,
            (DictionarySelection::DefaultsPlusCustom, Some(custom)) => {
                let mut finders = self.finders;
                finders.push(custom);
                finders
            }
            (DictionarySelection::CustomOnly, Some(custom)) => vec![custom],
            (_, None) => return Err(ConfigError::MissingCustomDictionary),
        };

        #[cfg(feature = "tracing")]
        tracing::info!("Finder set built with {} finders", finders.len());

        Ok(ParallelFinder::new(finders))
    }
}
