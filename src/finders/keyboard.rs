//! Keyboard finder - detects walks across adjacent keys such as `qwerty` or `zxcvb`.

use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use super::{FinderResult, PatternFinder, check_cancelled};
use crate::pattern::PasswordPattern;

const CLASSIFICATION: &str = "Keyboard Pattern";
const MIN_LEN: usize = 3;

/// US QWERTY rows as (first column, unshifted keys, shifted keys).
///
/// Rows are staggered so that the key at `(row, col)` touches
/// `(row - 1, col)`, `(row - 1, col + 1)`, `(row + 1, col - 1)` and `(row + 1, col)`.
const QWERTY: [(i32, &str, &str); 4] = [
    (0, "`1234567890-=", "~!@#$%^&*()_+"),
    (1, "qwertyuiop[]\\", "QWERTYUIOP{}|"),
    (1, "asdfghjkl;'", "ASDFGHJKL:\""),
    (1, "zxcvbnm,./", "ZXCVBNM<>?"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Key {
    row: i32,
    col: i32,
    shifted: bool,
}

impl Key {
    fn is_adjacent(self, other: Key) -> bool {
        let (dr, dc) = (other.row - self.row, other.col - self.col);
        matches!((dr, dc), (0, -1) | (0, 1) | (-1, 0) | (-1, 1) | (1, -1) | (1, 0))
    }
}

#[derive(Debug, Clone)]
pub struct KeyboardFinder {
    keys: HashMap<char, Key>,
    key_count: usize,
    average_degree: f64,
}

impl Default for KeyboardFinder {
    fn default() -> Self {
        let mut keys = HashMap::new();
        let mut positions = Vec::new();
        for (row, (offset, plain, shifted)) in QWERTY.iter().enumerate() {
            for (i, (p, s)) in plain.chars().zip(shifted.chars()).enumerate() {
                let col = offset + i as i32;
                let row = row as i32;
                keys.insert(p, Key { row, col, shifted: false });
                keys.insert(s, Key { row, col, shifted: true });
                positions.push(Key { row, col, shifted: false });
            }
        }

        let edges: usize = positions
            .iter()
            .map(|a| positions.iter().filter(|b| a.is_adjacent(**b)).count())
            .sum();
        let key_count = positions.len();

        Self {
            keys,
            key_count,
            average_degree: edges as f64 / key_count as f64,
        }
    }
}

impl KeyboardFinder {
    fn walk_cost(&self, walk: &[char]) -> f64 {
        let shifted = walk
            .iter()
            .filter(|c| self.keys.get(*c).is_some_and(|k| k.shifted))
            .count();
        let shift_bits = match shifted {
            0 => 0.0,
            n if n == walk.len() => 1.0,
            n => n as f64,
        };
        (self.key_count as f64).log2()
            + (walk.len() - 1) as f64 * self.average_degree.log2()
            + shift_bits
    }
}

impl PatternFinder for KeyboardFinder {
    fn name(&self) -> &str {
        "keyboard"
    }

    fn find(&self, password: &[char], cancel: &CancellationToken) -> FinderResult {
        check_cancelled(cancel, self.name())?;
        let mut found = Vec::new();

        let mut start = 0;
        while start < password.len() {
            let mut end = start + 1;
            while end < password.len() {
                match (self.keys.get(&password[end - 1]), self.keys.get(&password[end])) {
                    (Some(a), Some(b)) if a.is_adjacent(*b) => end += 1,
                    _ => break,
                }
            }

            let walk = &password[start..end];
            if walk.len() >= MIN_LEN {
                found.push(PasswordPattern::new(
                    start,
                    end,
                    walk.iter().collect::<String>(),
                    self.walk_cost(walk),
                    CLASSIFICATION,
                    "US QWERTY keyboard walk",
                ));
            }
            start = if end - start > 1 { end - 1 } else { end };
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finders::test_support::{run, spans};
    use crate::pattern::brute_force_bits;

    #[test]
    fn test_layout() {
        let finder = KeyboardFinder::default();
        assert_eq!(finder.key_count, 47);
        assert!(finder.average_degree > 3.0 && finder.average_degree < 6.0);
        let q = finder.keys[&'q'];
        assert!(q.is_adjacent(finder.keys[&'1']));
        assert!(q.is_adjacent(finder.keys[&'a']));
        assert!(!q.is_adjacent(finder.keys[&'s']));
    }

    #[test]
    fn test_qwerty_walk() {
        let found = run(&KeyboardFinder::default(), "qwerty");
        assert_eq!(spans(&found), vec![(0, 6)]);
        let chars: Vec<char> = "qwerty".chars().collect();
        assert!(found[0].cost < brute_force_bits(&chars));
    }

    #[test]
    fn test_vertical_walk() {
        let found = run(&KeyboardFinder::default(), "1qaz");
        assert_eq!(spans(&found), vec![(0, 4)]);
    }

    #[test]
    fn test_shifted_walk_costs_one_bit() {
        let finder = KeyboardFinder::default();
        let plain = run(&finder, "asdf");
        let shifted = run(&finder, "ASDF");
        assert!((shifted[0].cost - plain[0].cost - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_walk() {
        assert!(run(&KeyboardFinder::default(), "qpzm").is_empty());
    }
}
