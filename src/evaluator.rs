//! Password strength evaluator - runs the whole pipeline for one password.

use pwd_types::{PasswordEvaluation, PasswordScore};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "async")]
use std::sync::Arc;

#[cfg(feature = "async")]
use tokio::sync::mpsc;

use crate::analysis::PasswordAnalysis;
use crate::parallel::ParallelFinder;

/// Bits at or above which a password gets the maximum score.
const MAX_SCORE_BITS: f64 = 100.0;

/// Evaluates password strength and returns a detailed evaluation.
///
/// The score is the minimum-cost decomposition's total in bits, clamped to
/// `0..=100`. Reasons list every recognised pattern on that path.
///
/// # Arguments
/// * `password` - The password to evaluate
/// * `finders` - The finder set to run
/// * `token` - Optional cancellation token
///
/// # Returns
/// A `PasswordEvaluation` with no score when cancelled or on failure.
pub fn evaluate_password_strength(
    password: &SecretString,
    finders: &ParallelFinder,
    token: Option<CancellationToken>,
) -> PasswordEvaluation {
    let mut reasons = Vec::new();
    let token = token.unwrap_or_default();

    if token.is_cancelled() {
        reasons.push("Evaluation cancelled".to_string());
        return PasswordEvaluation {
            score: None,
            reasons,
        };
    }

    let analysis = PasswordAnalysis::from_secret(password.clone());
    if let Err(failed) = finders.analyze_with_cancel(&analysis, &token) {
        if token.is_cancelled() {
            reasons.push("Evaluation cancelled".to_string());
            return PasswordEvaluation {
                score: None,
                reasons,
            };
        }
        // partial analysis is still usable, just less thorough
        reasons.push(format!("Analysis incomplete: {}", failed));
    }

    let path = match analysis.minimum_cost_decomposition() {
        Ok(path) => path,
        Err(_e) => {
            #[cfg(feature = "tracing")]
            tracing::error!("Fatal error in password decomposition: {}", _e);
            reasons.push("Error".to_string());
            return PasswordEvaluation {
                score: None,
                reasons,
            };
        }
    };

    if analysis.is_empty() {
        reasons.push("Password is empty".to_string());
    }
    for pattern in path.patterns().iter().filter(|p| !p.is_brute_force()) {
        reasons.push(pattern.to_string());
    }

    let score = path.total_cost().clamp(0.0, MAX_SCORE_BITS).round() as i64;

    PasswordEvaluation {
        score: Some(PasswordScore::new(score)),
        reasons,
    }
}

/// Async version that sends evaluation result via channel.
///
/// The finders run on the blocking pool so the runtime is never stalled.
#[cfg(feature = "async")]
pub async fn evaluate_password_strength_tx(
    password: &SecretString,
    finders: Arc<ParallelFinder>,
    token: CancellationToken,
    tx: mpsc::Sender<PasswordEvaluation>,
) {
    #[cfg(feature = "tracing")]
    tracing::info!("evaluation is about to start...");

    let password = password.clone();
    let evaluation = match tokio::task::spawn_blocking(move || {
        evaluate_password_strength(&password, &finders, Some(token))
    })
    .await
    {
        Ok(evaluation) => evaluation,
        Err(_e) => {
            #[cfg(feature = "tracing")]
            tracing::error!("Password evaluation task failed: {}", _e);
            PasswordEvaluation {
                score: None,
                reasons: vec!["Error".to_string()],
            }
        }
    };

    if let Err(_e) = tx.send(evaluation).await {
        #[cfg(feature = "tracing")]
        tracing::error!("Failed to send password evaluation result: {}", _e);
    }
}
