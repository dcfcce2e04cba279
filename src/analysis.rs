//! Password analysis - the shared, append-only match store for one password.

use std::fmt;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::path_cost::{PathCost, minimum_cost_path};
use crate::pattern::PasswordPattern;

/// Lifecycle of an analysis: matches can only be added before it is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    Created,
    Finding,
    Complete,
    Abandoned,
}

impl AnalysisState {
    fn is_frozen(self) -> bool {
        matches!(self, AnalysisState::Complete | AnalysisState::Abandoned)
    }
}

impl fmt::Display for AnalysisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnalysisState::Created => "created",
            AnalysisState::Finding => "finding",
            AnalysisState::Complete => "complete",
            AnalysisState::Abandoned => "abandoned",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Analysis has not finished finding patterns (state: {0})")]
    NotFinished(AnalysisState),
    #[error("Analysis is frozen, no more matches can be added")]
    Frozen,
    #[error("Pattern '{matched}' spans [{start}, {end}) outside a password of length {length}")]
    InconsistentSpan {
        start: usize,
        end: usize,
        length: usize,
        matched: String,
    },
    #[error("Pattern '{matched}' has invalid cost {cost}, costs must be non-negative bits")]
    InvalidCost { matched: String, cost: f64 },
}

/// Rejects a batch holding a negative or NaN cost.
fn validate_costs(patterns: &[PasswordPattern]) -> Result<(), AnalysisError> {
    match patterns.iter().find(|p| p.cost.is_nan() || p.cost < 0.0) {
        Some(bad) => Err(AnalysisError::InvalidCost {
            matched: bad.matched.clone(),
            cost: bad.cost,
        }),
        None => Ok(()),
    }
}

#[derive(Debug)]
struct MatchStore {
    state: AnalysisState,
    matches: Vec<PasswordPattern>,
    contributors: Vec<Contributor>,
}

/// A finder whose batch was committed, identified by its slot in the run.
#[derive(Debug)]
struct Contributor {
    slot: usize,
    name: String,
}

/// All matches found for one password.
///
/// Any number of finder threads may add matches concurrently. Once the
/// owning [`ParallelFinder`](crate::ParallelFinder) marks it complete the
/// store is frozen and the minimum-cost decomposition can be computed.
pub struct PasswordAnalysis {
    password: SecretString,
    length: usize,
    store: Mutex<MatchStore>,
    decomposition: OnceLock<PathCost>,
}

impl fmt::Debug for PasswordAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordAnalysis")
            .field("length", &self.length)
            .field("state", &self.state())
            .field("matches", &self.match_count())
            .finish()
    }
}

impl PasswordAnalysis {
    pub fn new(password: &str) -> Self {
        Self::from_secret(SecretString::new(password.into()))
    }

    pub fn from_secret(password: SecretString) -> Self {
        let length = password.expose_secret().chars().count();
        Self {
            password,
            length,
            store: Mutex::new(MatchStore {
                state: AnalysisState::Created,
                matches: Vec::new(),
                contributors: Vec::new(),
            }),
            decomposition: OnceLock::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MatchStore> {
        // the store is append-only, a panicked writer cannot leave it half-updated
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Password length in characters.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    pub(crate) fn chars(&self) -> Vec<char> {
        self.password.expose_secret().chars().collect()
    }

    pub fn state(&self) -> AnalysisState {
        self.lock().state
    }

    pub fn add_match(&self, pattern: PasswordPattern) -> Result<(), AnalysisError> {
        self.add_matches(vec![pattern])
    }

    /// Adds a batch of matches atomically: either all are stored or none.
    pub fn add_matches(&self, patterns: Vec<PasswordPattern>) -> Result<(), AnalysisError> {
        validate_costs(&patterns)?;
        let mut store = self.lock();
        if store.state.is_frozen() {
            return Err(AnalysisError::Frozen);
        }
        store.matches.extend(patterns);
        Ok(())
    }

    /// Commits one finder's complete output, recording the finder as a contributor.
    ///
    /// `slot` is the finder's position in the running set; names need not be unique.
    pub(crate) fn commit(
        &self,
        slot: usize,
        finder: &str,
        patterns: Vec<PasswordPattern>,
    ) -> Result<usize, AnalysisError> {
        validate_costs(&patterns)?;
        let mut store = self.lock();
        if store.state.is_frozen() {
            return Err(AnalysisError::Frozen);
        }
        let count = patterns.len();
        store.matches.extend(patterns);
        store.contributors.push(Contributor {
            slot,
            name: finder.to_string(),
        });
        Ok(count)
    }

    pub(crate) fn begin_finding(&self) {
        let mut store = self.lock();
        if store.state == AnalysisState::Created {
            store.state = AnalysisState::Finding;
        }
    }

    pub(crate) fn complete(&self) {
        let mut store = self.lock();
        if !store.state.is_frozen() {
            store.state = AnalysisState::Complete;
        }
    }

    /// Freezes the analysis as invalid and drops every partial result.
    pub(crate) fn abandon(&self) {
        let mut store = self.lock();
        store.state = AnalysisState::Abandoned;
        store.matches.clear();
        store.contributors.clear();
    }

    pub fn match_count(&self) -> usize {
        self.lock().matches.len()
    }

    /// Snapshot of the matches found so far, in no particular order.
    pub fn matches(&self) -> Vec<PasswordPattern> {
        self.lock().matches.clone()
    }

    /// Names of the finders whose results were committed.
    pub fn contributors(&self) -> Vec<String> {
        self.lock()
            .contributors
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    /// Slots of the finders whose results were committed.
    #[cfg_attr(not(feature = "async"), allow(dead_code))]
    pub(crate) fn committed_slots(&self) -> Vec<usize> {
        self.lock().contributors.iter().map(|c| c.slot).collect()
    }

    /// Computes the decomposition that is cheapest for an attacker.
    ///
    /// The result is computed once and cached.
    ///
    /// # Errors
    ///
    /// - `NotFinished` if finding never completed
    /// - `InconsistentSpan` if a match lies outside the password
    pub fn minimum_cost_decomposition(&self) -> Result<PathCost, AnalysisError> {
        if let Some(path) = self.decomposition.get() {
            return Ok(path.clone());
        }

        let matches = {
            let store = self.lock();
            if store.state != AnalysisState::Complete {
                return Err(AnalysisError::NotFinished(store.state));
            }
            store.matches.clone()
        };

        if let Some(bad) = matches
            .iter()
            .find(|p| p.start >= p.end || p.end > self.length)
        {
            return Err(AnalysisError::InconsistentSpan {
                start: bad.start,
                end: bad.end,
                length: self.length,
                matched: bad.matched.clone(),
            });
        }

        let path = minimum_cost_path(&self.chars(), &matches);
        Ok(self.decomposition.get_or_init(|| path).clone())
    }
}
