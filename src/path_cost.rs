//! Minimum-cost decomposition of a password into pattern matches.
//!
//! Positions `0..=len` are nodes of a forward-only graph. Every match
//! `[start, end)` is an edge `start -> end` weighted by its cost, and every
//! position also gets a single-character brute-force edge. Because all edges
//! point forward, a single right-to-left pass finds the cheapest tiling in
//! `O(matches + len)`.

use std::cmp::Ordering;

use crate::crack_time::format_size;
use crate::pattern::PasswordPattern;

/// Costs closer than this are treated as equal when breaking ties.
const COST_EPSILON: f64 = 1e-9;

/// The cheapest gap-free, non-overlapping sequence of matches covering a password.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PathCost {
    patterns: Vec<PasswordPattern>,
    total_cost: f64,
}

impl PathCost {
    /// Matches in left-to-right order.
    pub fn patterns(&self) -> &[PasswordPattern] {
        &self.patterns
    }

    pub fn into_patterns(self) -> Vec<PasswordPattern> {
        self.patterns
    }

    /// Sum of the match costs in bits, i.e. log2 of the search-space size.
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Rounded size of the search space, e.g. `"3.4 billion"`.
    pub fn guesses(&self) -> String {
        format_size(self.total_cost)
    }

    /// Share of the total strength contributed by each pattern, in percent.
    pub fn contributions(&self) -> Vec<(&PasswordPattern, f64)> {
        self.patterns
            .iter()
            .map(|p| {
                let share = if self.total_cost > 0.0 {
                    p.cost / self.total_cost * 100.0
                } else {
                    0.0
                };
                (p, share)
            })
            .collect()
    }

    /// Returns `true` if the patterns tile `[0, length)` exactly.
    pub fn covers(&self, length: usize) -> bool {
        let mut position = 0;
        for p in &self.patterns {
            if p.start != position || p.end <= p.start {
                return false;
            }
            position = p.end;
        }
        position == length
    }
}

#[derive(Clone, Copy)]
struct Best<'a> {
    cost: f64,
    edges: usize,
    edge: Option<&'a PasswordPattern>,
}

/// Orders two candidate edges out of the same node: cheaper first, then fewer
/// edges, then the one ending earliest, then by the pattern's stable key.
fn compare(
    a: (f64, usize, &PasswordPattern),
    b: (f64, usize, &PasswordPattern),
) -> Ordering {
    let (a_cost, a_edges, a_edge) = a;
    let (b_cost, b_edges, b_edge) = b;
    if (a_cost - b_cost).abs() > COST_EPSILON {
        return a_cost.total_cmp(&b_cost);
    }
    a_edges
        .cmp(&b_edges)
        .then(a_edge.end.cmp(&b_edge.end))
        .then_with(|| a_edge.tie_key().cmp(&b_edge.tie_key()))
}

/// Computes the minimum-cost tiling of `password` from `matches`.
///
/// All spans must lie within the password; callers validate them first.
pub(crate) fn minimum_cost_path(password: &[char], matches: &[PasswordPattern]) -> PathCost {
    let n = password.len();
    if n == 0 {
        return PathCost::default();
    }

    let brute: Vec<PasswordPattern> = password
        .iter()
        .enumerate()
        .map(|(i, &c)| PasswordPattern::brute_force(i, c))
        .collect();

    let mut by_start: Vec<Vec<&PasswordPattern>> = vec![Vec::new(); n];
    for m in matches {
        by_start[m.start].push(m);
    }

    let mut best: Vec<Best<'_>> = vec![
        Best {
            cost: 0.0,
            edges: 0,
            edge: None,
        };
        n + 1
    ];

    for i in (0..n).rev() {
        let mut chosen: Option<(f64, usize, &PasswordPattern)> = None;
        for edge in std::iter::once(&brute[i]).chain(by_start[i].iter().copied()) {
            let next = best[edge.end];
            let candidate = (edge.cost + next.cost, next.edges + 1, edge);
            chosen = match chosen {
                Some(current) if compare(current, candidate) != Ordering::Greater => Some(current),
                _ => Some(candidate),
            };
        }
        if let Some((cost, edges, edge)) = chosen {
            best[i] = Best {
                cost,
                edges,
                edge: Some(edge),
            };
        }
    }

    let mut patterns = Vec::new();
    let mut position = 0;
    while let Some(edge) = best[position].edge {
        patterns.push(edge.clone());
        position = edge.end;
    }
    let total_cost = patterns.iter().map(|p| p.cost).sum();

    PathCost {
        patterns,
        total_cost,
    }
}
