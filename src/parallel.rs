//! Parallel finder - runs every pattern finder concurrently against one password.
//!
//! Each finder works on its own buffer and commits its complete output to the
//! shared [`PasswordAnalysis`] in one atomic batch, so a finder's results are
//! either all visible or not at all. The caller is released only after every
//! finder has reported back.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crossbeam::channel::unbounded;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::analysis::PasswordAnalysis;
use crate::finders::{FinderError, PatternFinder, structural_finders};

/// One finder that did not contribute to an analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct FinderFailure {
    pub finder: String,
    pub error: FinderError,
}

/// Consolidated error for a run in which at least one finder failed.
///
/// Matches committed by the other finders are kept in the analysis.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} of {} finders failed: {}", .failures.len(), .total, summarize(.failures))]
pub struct FindersFailed {
    pub failures: Vec<FinderFailure>,
    pub total: usize,
}

impl FindersFailed {
    /// Returns `true` if every failure is a cancellation.
    pub fn is_cancellation(&self) -> bool {
        self.failures
            .iter()
            .all(|f| matches!(f.error, FinderError::Cancelled { .. }))
    }
}

fn summarize(failures: &[FinderFailure]) -> String {
    if failures.is_empty() {
        return "analysis cancelled before any finder ran".to_string();
    }
    failures
        .iter()
        .map(|f| f.error.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "finder panicked".to_string())
}

/// Runs one finder and commits its output, turning panics into errors.
fn run_and_commit(
    slot: usize,
    finder: &dyn PatternFinder,
    password: &[char],
    analysis: &PasswordAnalysis,
    cancel: &CancellationToken,
) -> Result<usize, FinderError> {
    let batch = catch_unwind(AssertUnwindSafe(|| finder.find(password, cancel))).map_err(
        |payload| FinderError::Execution {
            finder: finder.name().to_string(),
            message: panic_message(payload.as_ref()),
        },
    )??;

    analysis
        .commit(slot, finder.name(), batch)
        .map_err(|e| FinderError::Execution {
            finder: finder.name().to_string(),
            message: e.to_string(),
        })
}

/// An ordered collection of finders run concurrently over one password.
#[derive(Clone, Default)]
pub struct ParallelFinder {
    finders: Vec<Arc<dyn PatternFinder>>,
}

impl ParallelFinder {
    pub fn new(finders: Vec<Arc<dyn PatternFinder>>) -> Self {
        Self { finders }
    }

    /// The built-in structural finders; no word lists are bundled.
    pub fn default_finders() -> Self {
        Self::new(structural_finders())
    }

    pub fn push(&mut self, finder: Arc<dyn PatternFinder>) {
        self.finders.push(finder);
    }

    pub fn len(&self) -> usize {
        self.finders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finders.is_empty()
    }

    pub fn finder_names(&self) -> Vec<&str> {
        self.finders.iter().map(|f| f.name()).collect()
    }

    /// Runs every finder and blocks until all of them have finished.
    ///
    /// The analysis is complete afterwards even if some finders failed.
    pub fn analyze(&self, analysis: &PasswordAnalysis) -> Result<(), FindersFailed> {
        self.analyze_with_cancel(analysis, &CancellationToken::new())
    }

    /// Like [`analyze`](Self::analyze), with cooperative cancellation.
    ///
    /// If `cancel` fires before the run finishes, partial results are
    /// discarded, the analysis is left abandoned and every finder is
    /// reported as [`FinderError::Cancelled`].
    pub fn analyze_with_cancel(
        &self,
        analysis: &PasswordAnalysis,
        cancel: &CancellationToken,
    ) -> Result<(), FindersFailed> {
        analysis.begin_finding();
        let password = analysis.chars();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Analyzing password of {} chars with {} finders",
            password.len(),
            self.finders.len()
        );

        let (tx, rx) = unbounded();
        let mut outcomes: Vec<Option<Result<usize, FinderError>>> = vec![None; self.finders.len()];

        // Use crossbeam::thread::scope for safe borrowing of the analysis
        let joined = crossbeam::thread::scope(|s| {
            for (index, finder) in self.finders.iter().enumerate() {
                let tx = tx.clone();
                let password = &password;
                s.spawn(move |_| {
                    let result = run_and_commit(index, finder.as_ref(), password, analysis, cancel);
                    let _ = tx.send((index, result));
                });
            }
            drop(tx);

            for (index, result) in rx.iter() {
                outcomes[index] = Some(result);
            }
        });

        if joined.is_err() {
            #[cfg(feature = "tracing")]
            tracing::error!("A finder worker thread panicked outside its finder");
        }

        if cancel.is_cancelled() {
            analysis.abandon();
            return Err(self.all_cancelled());
        }
        analysis.complete();

        self.consolidate(outcomes, |name| FinderError::Execution {
            finder: name.to_string(),
            message: "worker thread did not report back".to_string(),
        })
    }

    /// Creates an analysis for `password`, runs every finder and returns both.
    pub fn analyze_password(&self, password: &str) -> (PasswordAnalysis, Option<FindersFailed>) {
        let analysis = PasswordAnalysis::new(password);
        let failed = self.analyze(&analysis).err();
        (analysis, failed)
    }

    /// Runs every finder on the blocking pool, waiting at most `timeout`.
    ///
    /// Finders still running at the deadline are cancelled and their results
    /// omitted; they are reported as [`FinderError::Cancelled`]. The analysis
    /// is complete afterwards with whatever finished in time.
    #[cfg(feature = "async")]
    pub async fn analyze_with_timeout(
        &self,
        analysis: Arc<PasswordAnalysis>,
        timeout: std::time::Duration,
    ) -> Result<(), FindersFailed> {
        use tokio::task::JoinSet;
        use tokio::time::{Instant, timeout_at};

        analysis.begin_finding();
        let password: Arc<[char]> = analysis.chars().into();
        let cancel = CancellationToken::new();
        let deadline = Instant::now() + timeout;

        let mut tasks = JoinSet::new();
        for (index, finder) in self.finders.iter().enumerate() {
            let finder = Arc::clone(finder);
            let password = Arc::clone(&password);
            let analysis = Arc::clone(&analysis);
            let cancel = cancel.clone();
            tasks.spawn_blocking(move || {
                (index, run_and_commit(index, finder.as_ref(), &password, &analysis, &cancel))
            });
        }

        let mut outcomes: Vec<Option<Result<usize, FinderError>>> = vec![None; self.finders.len()];
        loop {
            match timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((index, result)))) => outcomes[index] = Some(result),
                Ok(Some(Err(_join_error))) => {
                    #[cfg(feature = "tracing")]
                    tracing::error!("Finder task failed to join: {}", _join_error);
                }
                Ok(None) => break,
                Err(_elapsed) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!("Analysis timed out after {:?}", timeout);
                    break;
                }
            }
        }

        // freeze first: anything not committed by now is omitted
        analysis.complete();
        cancel.cancel();
        tasks.detach_all();

        // a finder may have committed after the deadline fired but before the freeze
        for slot in analysis.committed_slots() {
            if outcomes[slot].is_none() {
                outcomes[slot] = Some(Ok(0));
            }
        }

        self.consolidate(outcomes, |name| FinderError::Cancelled {
            finder: name.to_string(),
        })
    }

    /// Every finder reported as cancelled, used when a whole run is abandoned.
    fn all_cancelled(&self) -> FindersFailed {
        #[cfg(feature = "tracing")]
        tracing::warn!("Analysis cancelled, discarding results of {} finders", self.finders.len());

        FindersFailed {
            failures: self
                .finders
                .iter()
                .map(|f| FinderFailure {
                    finder: f.name().to_string(),
                    error: FinderError::Cancelled {
                        finder: f.name().to_string(),
                    },
                })
                .collect(),
            total: self.finders.len(),
        }
    }

    fn consolidate(
        &self,
        outcomes: Vec<Option<Result<usize, FinderError>>>,
        missing: impl Fn(&str) -> FinderError,
    ) -> Result<(), FindersFailed> {
        let failures: Vec<FinderFailure> = self
            .finders
            .iter()
            .zip(outcomes)
            .filter_map(|(finder, outcome)| {
                let error = match outcome {
                    Some(Ok(_)) => return None,
                    Some(Err(e)) => e,
                    None => missing(finder.name()),
                };
                Some(FinderFailure {
                    finder: finder.name().to_string(),
                    error,
                })
            })
            .collect();

        if failures.is_empty() {
            return Ok(());
        }

        #[cfg(feature = "tracing")]
        for failure in &failures {
            tracing::warn!("Finder '{}' failed: {}", failure.finder, failure.error);
        }

        Err(FindersFailed {
            failures,
            total: self.finders.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisError, AnalysisState};
    use crate::dictionary::Dictionary;
    use crate::finders::{DictionaryPatternsFinder, FinderResult};
    use crate::pattern::PasswordPattern;
    use crate::strategy::ExactWord;
    use std::time::Duration;

    struct FailingFinder;

    impl PatternFinder for FailingFinder {
        fn name(&self) -> &str {
            "failing"
        }

        fn find(&self, _password: &[char], _cancel: &CancellationToken) -> FinderResult {
            Err(FinderError::Execution {
                finder: "failing".to_string(),
                message: "boom".to_string(),
            })
        }
    }

    struct PanickingFinder;

    impl PatternFinder for PanickingFinder {
        fn name(&self) -> &str {
            "panicking"
        }

        fn find(&self, _password: &[char], _cancel: &CancellationToken) -> FinderResult {
            panic!("finder exploded");
        }
    }

    /// Emits one match per position, polling the token until told to stop.
    struct SlowFinder {
        delay: Duration,
    }

    impl PatternFinder for SlowFinder {
        fn name(&self) -> &str {
            "slow"
        }

        fn find(&self, password: &[char], cancel: &CancellationToken) -> FinderResult {
            let started = std::time::Instant::now();
            while started.elapsed() < self.delay {
                crate::finders::check_cancelled(cancel, self.name())?;
                std::thread::sleep(Duration::from_millis(5));
            }
            Ok((0..password.len())
                .map(|i| PasswordPattern::new(i, i + 1, "?", 0.5, "slow", "slow"))
                .collect())
        }
    }

    /// Finishes its work but fires the shared token on the way out.
    struct CancellingFinder;

    impl PatternFinder for CancellingFinder {
        fn name(&self) -> &str {
            "cancelling"
        }

        fn find(&self, password: &[char], cancel: &CancellationToken) -> FinderResult {
            cancel.cancel();
            Ok(vec![PasswordPattern::new(0, password.len(), "all", 1.0, "all", "all")])
        }
    }

    /// Runs `inner` under another name.
    struct Renamed {
        name: &'static str,
        inner: Arc<dyn PatternFinder>,
    }

    impl PatternFinder for Renamed {
        fn name(&self) -> &str {
            self.name
        }

        fn find(&self, password: &[char], cancel: &CancellationToken) -> FinderResult {
            self.inner.find(password, cancel)
        }
    }

    fn word_finder() -> Arc<dyn PatternFinder> {
        let dict = Dictionary::from_word_list("english", ["password", "pass", "word"]);
        Arc::new(DictionaryPatternsFinder::new(Arc::new(dict), ExactWord))
    }

    #[test]
    fn test_analyze_completes_analysis() {
        let finder = ParallelFinder::new(vec![word_finder()]);
        let analysis = PasswordAnalysis::new("password");
        assert!(finder.analyze(&analysis).is_ok());
        assert_eq!(analysis.state(), AnalysisState::Complete);
        assert_eq!(analysis.match_count(), 3);
    }

    #[test]
    fn test_parallel_count_equals_serial_sum() {
        let mut finders = structural_finders();
        finders.push(word_finder());
        let password = "password1234qwerty1987aaaa";
        let chars: Vec<char> = password.chars().collect();

        let serial: usize = finders
            .iter()
            .map(|f| f.find(&chars, &CancellationToken::new()).unwrap().len())
            .sum();

        let (analysis, failed) = ParallelFinder::new(finders).analyze_password(password);
        assert!(failed.is_none());
        assert_eq!(analysis.match_count(), serial);
    }

    #[test]
    fn test_failure_keeps_other_results() {
        let finder = ParallelFinder::new(vec![word_finder(), Arc::new(FailingFinder)]);
        let analysis = PasswordAnalysis::new("password");
        let failed = finder.analyze(&analysis).unwrap_err();

        assert_eq!(failed.total, 2);
        assert_eq!(failed.failures.len(), 1);
        assert_eq!(failed.failures[0].finder, "failing");
        assert!(!failed.is_cancellation());
        assert_eq!(analysis.state(), AnalysisState::Complete);
        assert_eq!(analysis.match_count(), 3);
        assert!(analysis.minimum_cost_decomposition().is_ok());
    }

    #[test]
    fn test_panic_is_recorded_as_failure() {
        let finder = ParallelFinder::new(vec![Arc::new(PanickingFinder), word_finder()]);
        let analysis = PasswordAnalysis::new("password");
        let failed = finder.analyze(&analysis).unwrap_err();

        assert_eq!(
            failed.failures[0].error,
            FinderError::Execution {
                finder: "panicking".to_string(),
                message: "finder exploded".to_string(),
            }
        );
        assert_eq!(analysis.match_count(), 3);
    }

    #[test]
    fn test_cancelled_analysis_is_abandoned() {
        let finder = ParallelFinder::new(vec![word_finder()]);
        let analysis = PasswordAnalysis::new("password");
        let token = CancellationToken::new();
        token.cancel();

        let failed = finder.analyze_with_cancel(&analysis, &token).unwrap_err();
        assert!(failed.is_cancellation());
        assert_eq!(analysis.state(), AnalysisState::Abandoned);
        assert_eq!(
            analysis.minimum_cost_decomposition(),
            Err(AnalysisError::NotFinished(AnalysisState::Abandoned))
        );
    }

    #[test]
    fn test_cancelled_empty_finder_set_is_an_error() {
        let analysis = PasswordAnalysis::new("abc");
        let token = CancellationToken::new();
        token.cancel();

        let failed = ParallelFinder::default()
            .analyze_with_cancel(&analysis, &token)
            .unwrap_err();
        assert!(failed.is_cancellation());
        assert_eq!(failed.total, 0);
        assert_eq!(
            failed.to_string(),
            "0 of 0 finders failed: analysis cancelled before any finder ran"
        );
        assert_eq!(analysis.state(), AnalysisState::Abandoned);
    }

    #[test]
    fn test_cancel_after_finders_finished_is_an_error() {
        let finder = ParallelFinder::new(vec![Arc::new(CancellingFinder)]);
        let analysis = PasswordAnalysis::new("abc");
        let token = CancellationToken::new();

        let failed = finder.analyze_with_cancel(&analysis, &token).unwrap_err();
        assert!(failed.is_cancellation());
        assert_eq!(
            failed.failures,
            vec![FinderFailure {
                finder: "cancelling".to_string(),
                error: FinderError::Cancelled {
                    finder: "cancelling".to_string()
                },
            }]
        );
        assert_eq!(analysis.state(), AnalysisState::Abandoned);
        assert_eq!(analysis.match_count(), 0);
    }

    #[test]
    fn test_empty_finder_set() {
        let (analysis, failed) = ParallelFinder::default().analyze_password("abc");
        assert!(failed.is_none());
        assert_eq!(analysis.state(), AnalysisState::Complete);
        let path = analysis.minimum_cost_decomposition().unwrap();
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_error_message_lists_failures() {
        let finder = ParallelFinder::new(vec![Arc::new(FailingFinder)]);
        let analysis = PasswordAnalysis::new("abc");
        let failed = finder.analyze(&analysis).unwrap_err();
        assert_eq!(
            failed.to_string(),
            "1 of 1 finders failed: Finder 'failing' failed: boom"
        );
    }

    fn full_finder_set(words: &[&str]) -> ParallelFinder {
        let mut finders = structural_finders();
        finders.extend(crate::builder::dictionary_finders(Arc::new(
            Dictionary::from_word_list("english", words),
        )));
        ParallelFinder::new(finders)
    }

    #[test]
    fn test_decomposition_tiles_password() {
        let finders = full_finder_set(&["password", "monkey", "dragon"]);
        for password in ["", "a", "P@ssw0rd1987", "qwertyMonkey!!!!", "abcabcabc12/25/2001", "nogard"] {
            let (analysis, failed) = finders.analyze_password(password);
            assert!(failed.is_none());
            let path = analysis.minimum_cost_decomposition().unwrap();
            assert!(path.covers(password.chars().count()), "bad tiling for '{}'", password);
        }
    }

    #[test]
    fn test_single_dictionary_word() {
        let words: Vec<String> = (0..9999)
            .map(|i| format!("w{i}"))
            .chain(std::iter::once("password".to_string()))
            .collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        let (analysis, _) = full_finder_set(&words).analyze_password("password");

        let path = analysis.minimum_cost_decomposition().unwrap();
        assert_eq!(path.len(), 1);
        assert!((path.total_cost() - 10000f64.log2()).abs() < 1e-9);
    }

    #[test]
    fn test_random_password_is_brute_force() {
        let password = "xK9mQ2vB";
        let (analysis, _) = full_finder_set(&["password"]).analyze_password(password);

        let path = analysis.minimum_cost_decomposition().unwrap();
        let chars: Vec<char> = password.chars().collect();
        assert_eq!(path.len(), 8);
        assert!((path.total_cost() - crate::pattern::brute_force_bits(&chars)).abs() < 1e-9);
    }

    #[test]
    fn test_random_suffix_never_weakens() {
        let finders = full_finder_set(&["password"]);
        let cost = |pw: &str| {
            let (analysis, _) = finders.analyze_password(pw);
            analysis.minimum_cost_decomposition().unwrap().total_cost()
        };
        let prefix = cost("password");
        assert!(cost("passwordK") >= prefix);
        assert!(cost("passwordK#") >= prefix);
        assert!(cost("passwordK#q") >= prefix);
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let finders = full_finder_set(&["password", "word", "pass"]);
        let run = || {
            let (analysis, _) = finders.analyze_password("Pa55wordpassword1234");
            analysis.minimum_cost_decomposition().unwrap()
        };
        let first = run();
        for _ in 0..5 {
            assert_eq!(run(), first);
        }
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_timeout_omits_late_finder() {
        let finder = ParallelFinder::new(vec![
            word_finder(),
            Arc::new(SlowFinder {
                delay: Duration::from_secs(30),
            }),
        ]);
        let analysis = Arc::new(PasswordAnalysis::new("password"));

        let failed = finder
            .analyze_with_timeout(Arc::clone(&analysis), Duration::from_millis(200))
            .await
            .unwrap_err();

        assert!(failed.is_cancellation());
        assert_eq!(failed.failures[0].finder, "slow");
        assert_eq!(analysis.state(), AnalysisState::Complete);
        assert_eq!(analysis.match_count(), 3);
        assert_eq!(analysis.contributors(), vec!["english / Exact dictionary word".to_string()]);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_timeout_with_duplicate_finder_names() {
        let name = "english / Exact dictionary word";
        let finder = ParallelFinder::new(vec![
            word_finder(),
            Arc::new(Renamed {
                name,
                inner: Arc::new(SlowFinder {
                    delay: Duration::from_secs(30),
                }),
            }),
        ]);
        let analysis = Arc::new(PasswordAnalysis::new("password"));

        let failed = finder
            .analyze_with_timeout(Arc::clone(&analysis), Duration::from_millis(200))
            .await
            .unwrap_err();

        assert_eq!(
            failed.failures,
            vec![FinderFailure {
                finder: name.to_string(),
                error: FinderError::Cancelled {
                    finder: name.to_string()
                },
            }]
        );
        assert_eq!(analysis.match_count(), 3);
        assert_eq!(analysis.state(), AnalysisState::Complete);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_timeout_not_reached() {
        let finder = ParallelFinder::new(vec![
            word_finder(),
            Arc::new(SlowFinder {
                delay: Duration::from_millis(10),
            }),
        ]);
        let analysis = Arc::new(PasswordAnalysis::new("password"));

        let result = finder
            .analyze_with_timeout(Arc::clone(&analysis), Duration::from_secs(10))
            .await;

        assert!(result.is_ok());
        assert_eq!(analysis.match_count(), 3 + 8);
    }
}
