//! Separator-aware subsequence matching
//!
//! The cost of matching a pattern against a declaration name is the weighted
//! number of name characters skipped between matched characters. Skips that
//! end on a namespace separator (`.` or `_`) are charged at a fraction of the
//! normal rate, so abbreviations aligned with segments (`n.m` for
//! `Namespace.Method`) rank well ahead of arbitrary fuzzy slop.

use crate::search::config::{CASE_MISMATCH_PENALTY, SEPARATOR_WEIGHT, SEPARATORS, SKIP_WEIGHT};

fn is_separator(c: char) -> bool {
    SEPARATORS.contains(&c)
}

fn eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Cost of embedding `pattern` in `name`, or `None` when `pattern` is not a
/// case-insensitive subsequence of `name`. Lower is better.
pub fn match_cost(name: &str, pattern: &str) -> Option<f64> {
    let name: Vec<char> = name.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let mut err = 0.0;
    let mut last_match = 0usize;
    let mut i = 0usize;
    let mut j = 0usize;

    while i < name.len() && j < pattern.len() {
        let (n, p) = (name[i], pattern[j]);

        if eq_ignore_case(n, p) {
            let weight = if is_separator(p) {
                SEPARATOR_WEIGHT
            } else {
                SKIP_WEIGHT
            };
            err += weight * (i - last_match) as f64;
            if n != p {
                err += CASE_MISMATCH_PENALTY;
            }
            last_match = i + 1;
            j += 1;
        } else if is_separator(n) {
            err += SEPARATOR_WEIGHT * (i + 1 - last_match) as f64;
            last_match = i + 1;
        }

        i += 1;
    }

    err += SEPARATOR_WEIGHT * (name.len() - last_match) as f64;

    (j == pattern.len()).then_some(err)
}
