//! Password crackability analysis library
//!
//! Decomposes a password into recognisable patterns (dictionary words,
//! keyboard walks, sequences, repeats, dates), each annotated with the bits
//! an attacker needs to guess it, and finds the decomposition that is
//! cheapest for the attacker. That minimum cost is the password's effective
//! strength and can be turned into a time-to-crack estimate.
//!
//! # Features
//!
//! - `async` (default): Enables timed analysis and channel-based evaluation
//! - `tracing`: Enables logging via tracing crate
//!
//! # Environment Variables
//!
//! - `PASSFAULT_WORDLIST_DIR`: Directory of `*.words` files
//!   (default: `./wordlists`)
//! - `PASSFAULT_CUSTOM_DICTIONARY`: Path to a custom dictionary
//!
//! # Example
//!
//! ```rust,no_run
//! use passfault::{FinderConfig, FinderSetBuilder, ThroughputConfig, crack_time};
//!
//! let finders = FinderSetBuilder::new(FinderConfig::from_env())
//!     .with_structural_finders()
//!     .load_default_word_lists()
//!     .load_custom_dictionary()
//!     .build()
//!     .expect("Invalid finder configuration");
//!
//! let (analysis, failed) = finders.analyze_password("Tr0ub4dor&3");
//! if let Some(failed) = failed {
//!     eprintln!("warning: {failed}");
//! }
//!
//! let path = analysis.minimum_cost_decomposition().expect("analysis completed");
//! for pattern in path.patterns() {
//!     println!("{pattern}");
//! }
//! println!("Total complexity: {}", path.guesses());
//!
//! let throughput = ThroughputConfig::cluster(8, "bcrypt").expect("valid throughput");
//! let estimate = crack_time(path.total_cost(), &throughput);
//! println!("Estimated time to crack: {}", estimate.duration_display());
//! ```

// Re-export types from pwd-types for convenience
pub use pwd_types::{PasswordEvaluation, PasswordScore, PasswordStrength};

// Internal modules
mod analysis;
mod builder;
mod crack_time;
mod dictionary;
mod evaluator;
mod finders;
mod parallel;
mod path_cost;
mod pattern;
mod strategy;

// Public API
pub use analysis::{AnalysisError, AnalysisState, PasswordAnalysis};
pub use builder::{
    CUSTOM_DICTIONARY_ENV, ConfigError, DictionarySelection, FinderConfig, FinderSetBuilder,
    WORDLIST_DIR_ENV, dictionary_finders, get_word_list_dir,
};
pub use crack_time::{
    CrackTimeEstimate, HashFunction, ThroughputConfig, ThroughputError, crack_time,
    format_duration, format_size,
};
pub use dictionary::{Dictionary, DictionaryError, WORD_LIST_EXTENSION, load_word_lists};
pub use evaluator::evaluate_password_strength;
pub use finders::{
    DateFinder, DictionaryPatternsFinder, FinderError, FinderResult, KeyboardFinder,
    PatternFinder, RepeatFinder, SequenceFinder, structural_finders,
};
pub use parallel::{FinderFailure, FindersFailed, ParallelFinder};
pub use path_cost::PathCost;
pub use pattern::{BRUTE_FORCE_CLASSIFICATION, CharClass, PasswordPattern, brute_force_bits};
pub use strategy::{CaseInsensitive, ExactWord, Leet, MatchStrategy, Reversed};

// Re-exported so finder implementations can name the cancellation token type
pub use tokio_util::sync::CancellationToken;

#[cfg(feature = "async")]
pub use evaluator::evaluate_password_strength_tx;
