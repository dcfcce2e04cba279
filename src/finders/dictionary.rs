//! Dictionary finder - reports every slice a matching strategy accepts as a word.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{FinderResult, PatternFinder, check_cancelled};
use crate::dictionary::Dictionary;
use crate::pattern::PasswordPattern;
use crate::strategy::MatchStrategy;

pub struct DictionaryPatternsFinder {
    dictionary: Arc<Dictionary>,
    strategy: Box<dyn MatchStrategy>,
    name: String,
}

impl DictionaryPatternsFinder {
    pub fn new(dictionary: Arc<Dictionary>, strategy: impl MatchStrategy + 'static) -> Self {
        let name = format!("{} / {}", dictionary.name(), strategy.name());
        Self {
            dictionary,
            strategy: Box::new(strategy),
            name,
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    fn classification(&self) -> String {
        format!("Dictionary Word ({})", self.dictionary.name())
    }
}

impl PatternFinder for DictionaryPatternsFinder {
    fn name(&self) -> &str {
        &self.name
    }

    /// Tries every slice up to the longest word at every start position.
    ///
    /// Cost is `log2(dictionary size)` plus the strategy's extra bits.
    fn find(&self, password: &[char], cancel: &CancellationToken) -> FinderResult {
        let base_bits = self.dictionary.word_count_bits();
        let max_len = self.dictionary.max_word_len();
        let min_len = self.strategy.min_len();
        let mut found = Vec::new();

        for start in 0..password.len() {
            check_cancelled(cancel, &self.name)?;

            let last = password.len().min(start + max_len);
            for end in (start + 1)..=last {
                let candidate = &password[start..end];
                if candidate.len() >= min_len
                    && let Some(extra) = self.strategy.extra_bits(candidate, &self.dictionary)
                {
                    found.push(PasswordPattern::new(
                        start,
                        end,
                        candidate.iter().collect::<String>(),
                        base_bits + extra,
                        self.classification(),
                        self.strategy.name(),
                    ));
                }
                if !self.strategy.may_extend(candidate, &self.dictionary) {
                    break;
                }
            }
        }

        Ok(found)
    }
}
