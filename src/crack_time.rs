//! Time-to-crack model
//!
//! Converts a search-space size in bits plus an assumed guessing throughput
//! into an estimated number of guesses and a crack duration. Everything is
//! computed in log2 space so astronomically large search spaces never
//! overflow; values are only materialised when they fit in an `f64`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThroughputError {
    #[error("Provide either a guess rate alone, or both a unit count and a hash function")]
    InvalidCombination,
    #[error("Guess rate must be a positive number, got {0}")]
    InvalidRate(f64),
    #[error("At least one cracking unit is required, got {0}")]
    InvalidUnitCount(i64),
    #[error("Unknown hash function: {0}")]
    UnknownHashFunction(String),
}

/// Hash functions with a known per-unit cracking speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashFunction {
    Md5,
    Sha1,
    Sha256,
    Sha512,
    Ntlm,
    Md5Crypt,
    Sha512Crypt,
    Bcrypt,
    Scrypt,
    Wpa2,
}

impl HashFunction {
    pub const ALL: [HashFunction; 10] = [
        HashFunction::Md5,
        HashFunction::Sha1,
        HashFunction::Sha256,
        HashFunction::Sha512,
        HashFunction::Ntlm,
        HashFunction::Md5Crypt,
        HashFunction::Sha512Crypt,
        HashFunction::Bcrypt,
        HashFunction::Scrypt,
        HashFunction::Wpa2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HashFunction::Md5 => "md5",
            HashFunction::Sha1 => "sha1",
            HashFunction::Sha256 => "sha256",
            HashFunction::Sha512 => "sha512",
            HashFunction::Ntlm => "ntlm",
            HashFunction::Md5Crypt => "md5crypt",
            HashFunction::Sha512Crypt => "sha512crypt",
            HashFunction::Bcrypt => "bcrypt",
            HashFunction::Scrypt => "scrypt",
            HashFunction::Wpa2 => "wpa2",
        }
    }

    /// Approximate hashes per second of one high-end GPU.
    pub fn hashes_per_second(self) -> f64 {
        match self {
            HashFunction::Md5 => 164.1e9,
            HashFunction::Sha1 => 50.6e9,
            HashFunction::Sha256 => 21.9e9,
            HashFunction::Sha512 => 7.5e9,
            HashFunction::Ntlm => 288.5e9,
            HashFunction::Md5Crypt => 68.7e6,
            HashFunction::Sha512Crypt => 3.0e6,
            HashFunction::Bcrypt => 184.0e3,
            HashFunction::Scrypt => 7.1e3,
            HashFunction::Wpa2 => 2.5e6,
        }
    }
}

impl FromStr for HashFunction {
    type Err = ThroughputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        HashFunction::ALL
            .into_iter()
            .find(|h| h.name() == wanted)
            .ok_or_else(|| ThroughputError::UnknownHashFunction(s.to_string()))
    }
}

impl fmt::Display for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Assumed attacker throughput.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThroughputConfig {
    /// An explicit number of guesses per second.
    Rate { guesses_per_second: f64 },
    /// `units` parallel crackers, each hashing at the speed of `hash`.
    Cluster { units: u32, hash: HashFunction },
}

impl ThroughputConfig {
    pub fn rate(guesses_per_second: f64) -> Result<Self, ThroughputError> {
        if !guesses_per_second.is_finite() || guesses_per_second <= 0.0 {
            return Err(ThroughputError::InvalidRate(guesses_per_second));
        }
        Ok(ThroughputConfig::Rate { guesses_per_second })
    }

    pub fn cluster(units: i64, hash: &str) -> Result<Self, ThroughputError> {
        let units = u32::try_from(units)
            .ok()
            .filter(|&u| u > 0)
            .ok_or(ThroughputError::InvalidUnitCount(units))?;
        Ok(ThroughputConfig::Cluster {
            units,
            hash: hash.parse()?,
        })
    }

    /// Validates raw options: a rate alone, or units together with a hash function.
    pub fn from_options(
        rate: Option<f64>,
        units: Option<i64>,
        hash: Option<&str>,
    ) -> Result<Self, ThroughputError> {
        match (rate, units, hash) {
            (Some(rate), None, None) => Self::rate(rate),
            (None, Some(units), Some(hash)) => Self::cluster(units, hash),
            _ => Err(ThroughputError::InvalidCombination),
        }
    }

    pub fn guesses_per_second(&self) -> f64 {
        match *self {
            ThroughputConfig::Rate { guesses_per_second } => guesses_per_second,
            ThroughputConfig::Cluster { units, hash } => f64::from(units) * hash.hashes_per_second(),
        }
    }
}

impl fmt::Display for ThroughputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThroughputConfig::Rate { .. } => {
                write!(f, "{} H/s", format_count(self.guesses_per_second()))
            }
            ThroughputConfig::Cluster { units, hash } => write!(
                f,
                "{} with {} unit(s) at {} H/s",
                hash,
                units,
                format_count(self.guesses_per_second())
            ),
        }
    }
}

/// Estimated guesses and time to exhaust a search space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrackTimeEstimate {
    /// log2 of the number of guesses.
    pub guesses_bits: f64,
    /// log2 of the crack duration in seconds.
    pub log2_seconds: f64,
}

/// Largest exponent whose power of two is materialised as an `f64`.
const MAX_MATERIALISED_BITS: f64 = 1000.0;

impl CrackTimeEstimate {
    pub fn guesses(&self) -> Option<f64> {
        materialise(self.guesses_bits)
    }

    pub fn seconds(&self) -> Option<f64> {
        materialise(self.log2_seconds)
    }

    pub fn guesses_display(&self) -> String {
        format_size(self.guesses_bits)
    }

    pub fn duration_display(&self) -> String {
        format_duration(self.log2_seconds)
    }
}

fn materialise(bits: f64) -> Option<f64> {
    (bits <= MAX_MATERIALISED_BITS).then(|| bits.exp2())
}

/// Converts a total cost (log2 of the search space) into a crack-time estimate.
pub fn crack_time(total_cost: f64, throughput: &ThroughputConfig) -> CrackTimeEstimate {
    let guesses_bits = total_cost.max(0.0);
    CrackTimeEstimate {
        guesses_bits,
        log2_seconds: guesses_bits - throughput.guesses_per_second().log2(),
    }
}

const SCALES: [(f64, &str); 11] = [
    (1e33, "decillion"),
    (1e30, "nonillion"),
    (1e27, "octillion"),
    (1e24, "septillion"),
    (1e21, "sextillion"),
    (1e18, "quintillion"),
    (1e15, "quadrillion"),
    (1e12, "trillion"),
    (1e9, "billion"),
    (1e6, "million"),
    (1e3, "thousand"),
];

fn one_decimal(value: f64) -> String {
    let s = format!("{value:.1}");
    if s.ends_with(".0") {
        s[..s.len() - 2].to_string()
    } else {
        s
    }
}

/// Scientific notation from a base-10 exponent, e.g. `1.2e45`.
fn scientific(log10: f64) -> String {
    let mut exponent = log10.floor();
    let mut mantissa = 10f64.powf(log10 - exponent);
    if mantissa >= 9.95 {
        mantissa = 1.0;
        exponent += 1.0;
    }
    format!("{mantissa:.1}e{exponent:.0}")
}

fn format_count(value: f64) -> String {
    let value = value.round();
    for (i, (scale, name)) in SCALES.into_iter().enumerate() {
        if value >= scale {
            let scaled = (value / scale * 10.0).round() / 10.0;
            // 999_999 reads "1 million", not "1000 thousand"
            if scaled >= 1000.0 && i > 0 {
                let (larger, larger_name) = SCALES[i - 1];
                return format!("{} {}", one_decimal(value / larger), larger_name);
            }
            return format!("{} {}", one_decimal(scaled), name);
        }
    }
    format!("{value:.0}")
}

/// Rounded size of a search space of `bits` bits, e.g. `"3.4 billion"`.
///
/// Falls back to scientific notation once past the named scales.
pub fn format_size(bits: f64) -> String {
    let bits = bits.max(0.0);
    let log10 = bits * std::f64::consts::LOG10_2;
    if log10 >= 36.0 {
        return scientific(log10);
    }
    format_count(bits.exp2())
}

const MINUTE: f64 = 60.0;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;
const YEAR: f64 = 365.2425 * DAY;
const MONTH: f64 = YEAR / 12.0;
const CENTURY: f64 = 100.0 * YEAR;

const DURATION_UNITS: [(f64, &str); 7] = [
    (CENTURY, "century"),
    (YEAR, "year"),
    (MONTH, "month"),
    (DAY, "day"),
    (HOUR, "hour"),
    (MINUTE, "minute"),
    (1.0, "second"),
];

fn pluralise(count: f64, unit: &str) -> String {
    if count == 1.0 {
        format!("1 {unit}")
    } else if unit == "century" {
        format!("{count:.0} centuries")
    } else {
        format!("{count:.0} {unit}s")
    }
}

/// Human-readable duration for `2^log2_seconds` seconds.
pub fn format_duration(log2_seconds: f64) -> String {
    if log2_seconds < 0.0 {
        return "less than a second".to_string();
    }

    let log10_years = log2_seconds * std::f64::consts::LOG10_2 - YEAR.log10();
    // past a million centuries only the order of magnitude matters
    if log10_years >= 8.0 {
        return format!("{} years", scientific(log10_years));
    }

    // absorb the rounding error of going through log2
    let reaches = |amount: f64, unit: f64| amount >= unit * (1.0 - 1e-9);
    let seconds = log2_seconds.exp2();
    for (i, (unit, name)) in DURATION_UNITS.into_iter().enumerate() {
        if reaches(seconds, unit) {
            let count = (seconds / unit).round();
            if i > 0 {
                let (larger, larger_name) = DURATION_UNITS[i - 1];
                if reaches(count * unit, larger) {
                    return pluralise((seconds / larger).round(), larger_name);
                }
            }
            return pluralise(count, name);
        }
    }
    "less than a second".to_string()
}
