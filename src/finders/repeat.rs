//! Repeat finder - detects runs of one character and back-to-back repeated chunks.

use tokio_util::sync::CancellationToken;

use super::{FinderResult, PatternFinder, check_cancelled};
use crate::pattern::{PasswordPattern, brute_force_bits, char_bits};

const CLASSIFICATION: &str = "Repeated Pattern";
const MIN_RUN: usize = 3;
const MIN_CHUNK: usize = 2;

#[derive(Debug, Default, Clone, Copy)]
pub struct RepeatFinder;

impl RepeatFinder {
    /// Maximal runs of a single character, e.g. `aaaa`.
    ///
    /// Cost: pick the character, then the run length.
    fn char_runs(password: &[char], found: &mut Vec<PasswordPattern>) {
        let mut start = 0;
        while start < password.len() {
            let c = password[start];
            let end = start + password[start..].iter().take_while(|&&x| x == c).count();
            let len = end - start;
            if len >= MIN_RUN {
                found.push(PasswordPattern::new(
                    start,
                    end,
                    password[start..end].iter().collect::<String>(),
                    char_bits(c) + (len as f64).log2(),
                    CLASSIFICATION,
                    "Repeated character",
                ));
            }
            start = end;
        }
    }

    /// Back-to-back repetitions of a chunk, e.g. `abcabc`.
    ///
    /// Every start position reports its longest repetition, so a periodic run
    /// is also available from an offset when a neighbouring pattern claims
    /// its first characters. Cost: brute force the chunk once, then pick the
    /// repetition count.
    fn chunk_repeats(password: &[char], found: &mut Vec<PasswordPattern>) {
        let n = password.len();
        for start in 0..n {
            for k in MIN_CHUNK..=(n - start) / 2 {
                let chunk = &password[start..start + k];
                if chunk.iter().all(|&c| c == chunk[0]) {
                    continue;
                }
                let mut reps = 1;
                while start + (reps + 1) * k <= n
                    && password[start + reps * k..start + (reps + 1) * k] == *chunk
                {
                    reps += 1;
                }
                if reps < 2 {
                    continue;
                }

                let end = start + reps * k;
                found.push(PasswordPattern::new(
                    start,
                    end,
                    password[start..end].iter().collect::<String>(),
                    brute_force_bits(chunk) + (reps as f64).log2(),
                    CLASSIFICATION,
                    format!("Chunk of {k} characters repeated {reps} times"),
                ));
            }
        }
    }
}

impl PatternFinder for RepeatFinder {
    fn name(&self) -> &str {
        "repeat"
    }

    fn find(&self, password: &[char], cancel: &CancellationToken) -> FinderResult {
        check_cancelled(cancel, self.name())?;
        let mut found = Vec::new();
        Self::char_runs(password, &mut found);
        check_cancelled(cancel, self.name())?;
        Self::chunk_repeats(password, &mut found);
        Ok(found)
    }
}
