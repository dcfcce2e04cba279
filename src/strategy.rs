//! Word matching strategies for dictionary finders.
//!
//! A strategy decides whether a slice of the password is a (possibly mangled)
//! dictionary word, and how many bits the mangling adds on top of picking
//! the word itself.

use std::fmt;

use crate::dictionary::Dictionary;

pub trait MatchStrategy: Send + Sync + fmt::Debug {
    /// Rule name reported in the match description.
    fn name(&self) -> &'static str;

    /// Shortest slice this strategy will consider.
    fn min_len(&self) -> usize {
        3
    }

    /// Whether a longer slice starting with `prefix` can still match.
    fn may_extend(&self, _prefix: &[char], _dictionary: &Dictionary) -> bool {
        true
    }

    /// Returns the extra bits when `candidate` matches a word, `None` otherwise.
    fn extra_bits(&self, candidate: &[char], dictionary: &Dictionary) -> Option<f64>;
}

/// Slice equals a dictionary word exactly.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExactWord;

impl MatchStrategy for ExactWord {
    fn name(&self) -> &'static str {
        "Exact dictionary word"
    }

    fn min_len(&self) -> usize {
        2
    }

    fn may_extend(&self, prefix: &[char], dictionary: &Dictionary) -> bool {
        dictionary.is_prefix(&prefix.iter().collect::<String>())
    }

    fn extra_bits(&self, candidate: &[char], dictionary: &Dictionary) -> Option<f64> {
        let word: String = candidate.iter().collect();
        dictionary.contains(&word).then_some(0.0)
    }
}

/// Slice is a dictionary word with some letters uppercased.
#[derive(Debug, Default, Clone, Copy)]
pub struct CaseInsensitive;

impl MatchStrategy for CaseInsensitive {
    fn name(&self) -> &'static str {
        "Mixed case dictionary word"
    }

    fn may_extend(&self, prefix: &[char], dictionary: &Dictionary) -> bool {
        dictionary.is_prefix(&lowercase(prefix))
    }

    fn extra_bits(&self, candidate: &[char], dictionary: &Dictionary) -> Option<f64> {
        if !candidate.iter().any(|c| c.is_uppercase()) {
            return None;
        }
        dictionary
            .contains(&lowercase(candidate))
            .then(|| case_bits(candidate))
    }
}

/// Slice is a dictionary word with one or more leet substitutions.
#[derive(Debug, Default, Clone, Copy)]
pub struct Leet;

impl MatchStrategy for Leet {
    fn name(&self) -> &'static str {
        "L33t substituted dictionary word"
    }

    fn extra_bits(&self, candidate: &[char], dictionary: &Dictionary) -> Option<f64> {
        let substituted = candidate
            .iter()
            .filter(|c| !c.is_alphabetic() && !leet_readings(**c).is_empty())
            .count();
        if substituted == 0 {
            return None;
        }

        let mut word = String::with_capacity(candidate.len());
        if !find_reading(candidate, dictionary, &mut word) {
            return None;
        }

        let leetable = word.chars().filter(|c| has_leet_form(*c)).count();
        Some(combinations_bits(leetable, substituted) + case_bits(candidate))
    }
}

/// Slice is a dictionary word spelled backwards.
#[derive(Debug, Default, Clone, Copy)]
pub struct Reversed;

impl MatchStrategy for Reversed {
    fn name(&self) -> &'static str {
        "Backwards dictionary word"
    }

    fn extra_bits(&self, candidate: &[char], dictionary: &Dictionary) -> Option<f64> {
        let reversed: String = candidate.iter().rev().collect();
        let forward: String = candidate.iter().collect();
        if reversed == forward {
            return None;
        }
        dictionary.contains(&reversed).then_some(1.0)
    }
}

fn lowercase(chars: &[char]) -> String {
    chars.iter().flat_map(|c| c.to_lowercase()).collect()
}

/// Bits added by uppercase letters in an otherwise lowercase word.
///
/// Capitalised and all-caps words cost a flat bit; any other mix costs the
/// log2 of the number of ways to place that many uppercase letters.
pub fn case_bits(chars: &[char]) -> f64 {
    let letters: Vec<char> = chars.iter().copied().filter(|c| c.is_alphabetic()).collect();
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    let lower = letters.len() - upper;
    if upper == 0 {
        return 0.0;
    }

    let capitalised = letters.first().is_some_and(|c| c.is_uppercase()) && upper == 1;
    if capitalised || lower == 0 {
        return 1.0;
    }

    let variations: f64 = (1..=upper.min(lower))
        .map(|k| binomial(upper + lower, k))
        .sum();
    variations.log2()
}

/// log2 of `sum_{k=1..=picked} C(n, k)`.
fn combinations_bits(n: usize, picked: usize) -> f64 {
    let total: f64 = (1..=picked.min(n)).map(|k| binomial(n, k)).sum();
    total.max(1.0).log2()
}

fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}

/// Letters a leet symbol may stand for.
fn leet_readings(c: char) -> &'static [char] {
    match c {
        '4' | '@' => &['a'],
        '8' => &['b'],
        '(' => &['c'],
        '3' => &['e'],
        '6' | '9' => &['g'],
        '1' | '!' | '|' => &['i', 'l'],
        '0' => &['o'],
        '5' | '$' => &['s'],
        '7' | '+' => &['t'],
        '2' => &['z'],
        _ => &[],
    }
}

fn has_leet_form(c: char) -> bool {
    matches!(c, 'a' | 'b' | 'c' | 'e' | 'g' | 'i' | 'l' | 'o' | 's' | 't' | 'z')
}

/// Depth-first search over every reading of `rest`, pruning on dictionary prefixes.
fn find_reading(rest: &[char], dictionary: &Dictionary, word: &mut String) -> bool {
    let Some((&c, tail)) = rest.split_first() else {
        return dictionary.contains(word);
    };

    let lowered: Vec<char> = c.to_lowercase().collect();
    let readings: &[char] = if c.is_alphabetic() {
        &lowered
    } else {
        leet_readings(c)
    };

    for &reading in readings {
        word.push(reading);
        if dictionary.is_prefix(word) && find_reading(tail, dictionary, word) {
            return true;
        }
        word.pop();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> Dictionary {
        Dictionary::from_word_list("test", ["password", "dragon", "lion", "elite"])
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_exact_word() {
        assert_eq!(ExactWord.extra_bits(&chars("password"), &dict()), Some(0.0));
        assert_eq!(ExactWord.extra_bits(&chars("Password"), &dict()), None);
        assert!(ExactWord.may_extend(&chars("pass"), &dict()));
        assert!(!ExactWord.may_extend(&chars("pax"), &dict()));
    }

    #[test]
    fn test_case_insensitive_requires_uppercase() {
        assert_eq!(CaseInsensitive.extra_bits(&chars("password"), &dict()), None);
        assert_eq!(CaseInsensitive.extra_bits(&chars("Password"), &dict()), Some(1.0));
        assert_eq!(CaseInsensitive.extra_bits(&chars("PASSWORD"), &dict()), Some(1.0));
        let mixed = CaseInsensitive.extra_bits(&chars("pAssWord"), &dict()).unwrap();
        // two uppercase among eight letters: C(8,1) + C(8,2) = 36
        assert!((mixed - 36f64.log2()).abs() < 1e-9);
    }

    #[test]
    fn test_leet_substitution() {
        let bits = Leet.extra_bits(&chars("p@ssw0rd"), &dict()).unwrap();
        // leetable letters in "password": a, s, s, o -> m = 4, two substituted
        assert!((bits - (4.0f64 + 6.0).log2()).abs() < 1e-9);
        assert_eq!(Leet.extra_bits(&chars("password"), &dict()), None);
    }

    #[test]
    fn test_leet_ambiguous_reading() {
        assert!(Leet.extra_bits(&chars("1ion"), &dict()).is_some());
        assert!(Leet.extra_bits(&chars("e1ite"), &dict()).is_some());
        assert!(Leet.extra_bits(&chars("dr4g0n"), &dict()).is_some());
    }

    #[test]
    fn test_reversed() {
        assert_eq!(Reversed.extra_bits(&chars("nogard"), &dict()), Some(1.0));
        assert_eq!(Reversed.extra_bits(&chars("dragon"), &dict()), None);
    }

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(5, 2), 10.0);
        assert_eq!(binomial(4, 0), 1.0);
        assert_eq!(binomial(3, 4), 0.0);
    }
}
