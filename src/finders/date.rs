//! Date finder - detects years and calendar dates written as digits.

use tokio_util::sync::CancellationToken;

use super::{FinderResult, PatternFinder, check_cancelled};
use crate::pattern::PasswordPattern;

const CLASSIFICATION: &str = "Date";
const MIN_YEAR: u32 = 1900;
const MAX_YEAR: u32 = 2099;
const SEPARATORS: [char; 3] = ['-', '/', '.'];
const SEPARATOR_BITS: f64 = 2.0;

#[derive(Debug, Default, Clone, Copy)]
pub struct DateFinder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    YearMonthDay,
    MonthDayYear,
    DayMonthYear,
}

impl Order {
    fn label(self) -> &'static str {
        match self {
            Order::YearMonthDay => "YMD",
            Order::MonthDayYear => "MDY",
            Order::DayMonthYear => "DMY",
        }
    }
}

fn number(digits: &[char]) -> Option<u32> {
    if digits.is_empty() || !digits.iter().all(char::is_ascii_digit) {
        return None;
    }
    digits.iter().collect::<String>().parse().ok()
}

fn is_leap(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn valid_day(day: u32, month: u32, year: Option<u32>) -> bool {
    let max = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => match year {
            Some(y) if !is_leap(y) => 28,
            _ => 29,
        },
        _ => return false,
    };
    (1..=max).contains(&day)
}

/// Year as written: four digits must fall in range, two digits are any year.
fn year_of(digits: &[char]) -> Option<(Option<u32>, f64)> {
    let year = number(digits)?;
    match digits.len() {
        4 if (MIN_YEAR..=MAX_YEAR).contains(&year) => {
            Some((Some(year), f64::from(MAX_YEAR - MIN_YEAR + 1)))
        }
        2 => Some((None, 100.0)),
        _ => None,
    }
}

/// Checks `[year, month, day]` segments in the given order.
///
/// Returns the log2 of the number of dates of that shape.
fn date_bits(parts: [&[char]; 3], order: Order) -> Option<f64> {
    let (y, m, d) = match order {
        Order::YearMonthDay => (parts[0], parts[1], parts[2]),
        Order::MonthDayYear => (parts[2], parts[0], parts[1]),
        Order::DayMonthYear => (parts[2], parts[1], parts[0]),
    };
    if m.len() > 2 || d.len() > 2 {
        return None;
    }
    let (year, years) = year_of(y)?;
    let (month, day) = (number(m)?, number(d)?);
    valid_day(day, month, year).then(|| (12.0 * 31.0 * years).log2())
}

fn split_fixed(digits: &[char], lens: [usize; 3]) -> [&[char]; 3] {
    let (a, rest) = digits.split_at(lens[0]);
    let (b, c) = rest.split_at(lens[1]);
    [a, b, c]
}

/// Classifies a slice as a year or date, returning its cost and description.
fn parse(slice: &[char]) -> Option<(f64, String)> {
    if slice.iter().all(char::is_ascii_digit) {
        return match slice.len() {
            4 => year_of(slice).and_then(|(year, years)| {
                year.map(|_| (years.log2(), "Year".to_string()))
            }),
            6 => [
                (Order::MonthDayYear, [2, 2, 2]),
                (Order::DayMonthYear, [2, 2, 2]),
            ]
            .into_iter()
            .find_map(|(order, lens)| {
                date_bits(split_fixed(slice, lens), order)
                    .map(|bits| (bits, format!("Date ({})", order.label())))
            }),
            8 => [
                (Order::YearMonthDay, [4, 2, 2]),
                (Order::MonthDayYear, [2, 2, 4]),
                (Order::DayMonthYear, [2, 2, 4]),
            ]
            .into_iter()
            .find_map(|(order, lens)| {
                date_bits(split_fixed(slice, lens), order)
                    .map(|bits| (bits, format!("Date ({})", order.label())))
            }),
            _ => None,
        };
    }

    let sep = *slice.iter().find(|c| !c.is_ascii_digit())?;
    if !SEPARATORS.contains(&sep) {
        return None;
    }
    let parts: Vec<&[char]> = slice.split(|&c| c == sep).collect();
    let [a, b, c] = parts.as_slice() else {
        return None;
    };
    let parts = [*a, *b, *c];

    let orders: &[Order] = if a.len() == 4 {
        &[Order::YearMonthDay]
    } else {
        &[Order::MonthDayYear, Order::DayMonthYear]
    };
    orders.iter().find_map(|&order| {
        date_bits(parts, order).map(|bits| {
            (
                bits + SEPARATOR_BITS,
                format!("Date ({}, '{}' separated)", order.label(), sep),
            )
        })
    })
}

impl PatternFinder for DateFinder {
    fn name(&self) -> &str {
        "date"
    }

    fn find(&self, password: &[char], cancel: &CancellationToken) -> FinderResult {
        check_cancelled(cancel, self.name())?;
        let mut found = Vec::new();

        for start in 0..password.len() {
            if !password[start].is_ascii_digit() {
                continue;
            }
            for end in (start + 4)..=password.len().min(start + 10) {
                if !password[end - 1].is_ascii_digit() {
                    continue;
                }
                let slice = &password[start..end];
                if let Some((cost, description)) = parse(slice) {
                    found.push(PasswordPattern::new(
                        start,
                        end,
                        slice.iter().collect::<String>(),
                        cost,
                        CLASSIFICATION,
                        description,
                    ));
                }
            }
        }

        Ok(found)
    }
}
