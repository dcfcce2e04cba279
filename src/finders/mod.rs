//! Pattern finders
//!
//! Each finder scans a password for one family of recognisable structure and
//! reports every occurrence as a [`PasswordPattern`] with its guessing cost.

mod date;
mod dictionary;
mod keyboard;
mod repeat;
mod sequence;

pub use date::DateFinder;
pub use dictionary::DictionaryPatternsFinder;
pub use keyboard::KeyboardFinder;
pub use repeat::RepeatFinder;
pub use sequence::SequenceFinder;

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::pattern::PasswordPattern;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FinderError {
    #[error("Finder '{finder}' failed: {message}")]
    Execution { finder: String, message: String },
    #[error("Finder '{finder}' was cancelled")]
    Cancelled { finder: String },
}

/// Result type for finder runs: every match found, or why the run stopped.
pub type FinderResult = Result<Vec<PasswordPattern>, FinderError>;

/// A deterministic scanner for one family of password patterns.
///
/// Finders hold no per-password state, so one instance can serve any number
/// of passwords from any number of threads. Long-running finders should poll
/// `cancel` and bail out with [`FinderError::Cancelled`].
pub trait PatternFinder: Send + Sync {
    fn name(&self) -> &str;

    fn find(&self, password: &[char], cancel: &CancellationToken) -> FinderResult;
}

/// Returns `Cancelled` for `finder` once the token has fired.
pub(crate) fn check_cancelled(cancel: &CancellationToken, finder: &str) -> Result<(), FinderError> {
    if cancel.is_cancelled() {
        return Err(FinderError::Cancelled {
            finder: finder.to_string(),
        });
    }
    Ok(())
}

/// Built-in structural finders, in a fixed order.
pub fn structural_finders() -> Vec<Arc<dyn PatternFinder>> {
    vec![
        Arc::new(RepeatFinder::default()),
        Arc::new(SequenceFinder::default()),
        Arc::new(KeyboardFinder::default()),
        Arc::new(DateFinder::default()),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn run(finder: &dyn PatternFinder, password: &str) -> Vec<PasswordPattern> {
        let chars: Vec<char> = password.chars().collect();
        finder
            .find(&chars, &CancellationToken::new())
            .expect("finder should not fail")
    }

    pub fn spans(patterns: &[PasswordPattern]) -> Vec<(usize, usize)> {
        let mut spans: Vec<_> = patterns.iter().map(|p| (p.start, p.end)).collect();
        spans.sort();
        spans
    }
}
