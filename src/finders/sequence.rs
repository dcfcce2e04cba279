//! Sequence finder - detects arithmetic runs like `abcd`, `9876` or `aceg`.

use tokio_util::sync::CancellationToken;

use super::{FinderResult, PatternFinder, check_cancelled};
use crate::pattern::{CharClass, PasswordPattern};

const CLASSIFICATION: &str = "Character Sequence";
const MIN_LEN: usize = 3;
const STEPS: [i64; 4] = [1, -1, 2, -2];

#[derive(Debug, Default, Clone, Copy)]
pub struct SequenceFinder;

fn describe(step: i64, class: CharClass) -> String {
    let direction = if step > 0 { "Ascending" } else { "Descending" };
    if step.abs() == 1 {
        format!("{direction} {} sequence", class.name())
    } else {
        format!("{direction} {} sequence with step {}", class.name(), step.abs())
    }
}

impl PatternFinder for SequenceFinder {
    fn name(&self) -> &str {
        "sequence"
    }

    /// Reports maximal runs with a constant step inside one character class.
    ///
    /// Cost: the starting character, the length, one bit for direction and
    /// one more bit when the step is not 1.
    fn find(&self, password: &[char], cancel: &CancellationToken) -> FinderResult {
        let mut found = Vec::new();

        for step in STEPS {
            check_cancelled(cancel, self.name())?;

            let mut start = 0;
            while start < password.len() {
                let class = CharClass::of(password[start]);
                let mut end = start + 1;
                while end < password.len()
                    && CharClass::of(password[end]) == class
                    && password[end] as i64 - password[end - 1] as i64 == step
                {
                    end += 1;
                }

                let len = end - start;
                if len >= MIN_LEN {
                    let step_bits = if step.abs() == 1 { 0.0 } else { 1.0 };
                    found.push(PasswordPattern::new(
                        start,
                        end,
                        password[start..end].iter().collect::<String>(),
                        class.bits() + (len as f64).log2() + 1.0 + step_bits,
                        CLASSIFICATION,
                        describe(step, class),
                    ));
                }
                // the last char of a run may start the next one
                start = if len > 1 { end - 1 } else { end };
            }
        }

        Ok(found)
    }
}
