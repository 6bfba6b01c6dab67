//! Heuristic entropy estimation.
//!
//! [`calculate_entropy`] measures the apparent structure of a string: the
//! alphabet implied by the classes present, times its length, scaled down by
//! a penalty for recognizable patterns. It says nothing about how the string
//! was produced, so a truly random string and a hand-typed one with the same
//! shape score the same.
use std::collections::{HashMap, VecDeque};
use std::sync::LazyLock;

use regex::Regex;

use crate::charset::CharClass;
use crate::wordlist::is_weak_password;

/// Multiplier applied once per matching structural pattern.
pub const PATTERN_PENALTY: f64 = 0.8;
/// Multiplier applied when the string is a known weak password.
pub const WEAK_PASSWORD_PENALTY: f64 = 0.1;
/// Multiplier applied when a keyboard row (or its reverse) is embedded.
pub const KEYBOARD_PENALTY: f64 = 0.7;
/// Lower bound on the combined multiplier.
pub const PENALTY_FLOOR: f64 = 0.1;

/// Shortest run of one repeated character treated as a pattern.
pub const REPEAT_RUN: usize = 3;

pub const KEYBOARD_PATTERNS: &[&str] = &[
    "qwertyuiop",
    "asdfghjkl",
    "zxcvbnm",
    "1234567890",
    "!@#$%^&*()",
    "qwerty",
    "asdf",
    "zxcv",
];

/// Common sequences, common words, year-like numbers, long digit runs.
static PENALTY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)(abc|123|qwe|asd|zxc)",
        r"(?i)(password|admin|user|login|test)",
        r"(19|20)\d{2}",
        r"\d{4,}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("penalty pattern compiles"))
    .collect()
});

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(19|20)\d{2}").expect("year pattern compiles"));

/// Alphabet size implied by the classes present in `s`.
pub fn charset_size(s: &str) -> usize {
    CharClass::ALL
        .iter()
        .filter(|c| c.present_in(s))
        .map(|c| c.entropy_size())
        .sum()
}

/// Estimated entropy in bits, after pattern penalties. Zero for the empty
/// string and for strings with no recognized character class.
pub fn calculate_entropy(s: &str) -> f64 {
    let size = charset_size(s);
    if size == 0 {
        return 0.0;
    }
    let base = s.chars().count() as f64 * (size as f64).log2();
    base * pattern_penalty(s)
}

/// Combined multiplier in `[PENALTY_FLOOR, 1.0]` for the patterns found in `s`.
pub fn pattern_penalty(s: &str) -> f64 {
    let mut penalty = 1.0;
    if has_repeated_run(s, REPEAT_RUN) {
        penalty *= PATTERN_PENALTY;
    }
    for re in PENALTY_PATTERNS.iter() {
        if re.is_match(s) {
            penalty *= PATTERN_PENALTY;
        }
    }
    if is_weak_password(s) {
        penalty *= WEAK_PASSWORD_PENALTY;
    }
    if has_keyboard_pattern(s) {
        penalty *= KEYBOARD_PENALTY;
    }
    f64::max(penalty, PENALTY_FLOOR)
}

/// Whether any character repeats `run` or more times in a row, ignoring case.
pub fn has_repeated_run(s: &str, run: usize) -> bool {
    longest_run(&s.to_lowercase()) >= run
}

/// Length of the longest run of one repeated character.
pub fn longest_run(s: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut prev = None;
    for c in s.chars() {
        if Some(c) == prev {
            current += 1;
        } else {
            current = 1;
            prev = Some(c);
        }
        longest = longest.max(current);
    }
    longest
}

/// Embedded keyboard row, forwards or backwards, ignoring case.
pub fn has_keyboard_pattern(s: &str) -> bool {
    let folded = s.to_lowercase();
    KEYBOARD_PATTERNS.iter().any(|p| {
        let reversed: String = p.chars().rev().collect();
        folded.contains(p) || folded.contains(&reversed)
    })
}

pub fn has_year_pattern(s: &str) -> bool {
    YEAR_PATTERN.is_match(s)
}

/// Memoized entropy values with FIFO eviction once `capacity` is reached.
#[derive(Debug)]
pub struct EntropyCache {
    capacity: usize,
    values: HashMap<String, f64>,
    order: VecDeque<String>,
}

impl Default for EntropyCache {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl EntropyCache {
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            values: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, s: &str) -> Option<f64> {
        self.values.get(s).copied()
    }

    /// Store `value` for `s`, evicting the oldest entry when full. An
    /// existing entry is left in place.
    pub fn insert(&mut self, s: &str, value: f64) {
        if self.values.contains_key(s) {
            return;
        }
        if self.values.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.values.remove(&oldest);
            }
        }
        self.values.insert(s.to_string(), value);
        self.order.push_back(s.to_string());
    }

    pub fn get_or_compute(&mut self, s: &str) -> f64 {
        if let Some(v) = self.get(s) {
            return v;
        }
        let v = calculate_entropy(s);
        self.insert(s, v);
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_unrecognized_strings_have_zero_entropy() {
        assert_eq!(calculate_entropy(""), 0.0);
        assert_eq!(calculate_entropy("~~/`"), 0.0);
        assert_eq!(calculate_entropy("   "), 0.0);
    }

    #[test]
    fn unpenalized_entropy_is_length_times_log2_alphabet() {
        let s = "mrkpwz";
        assert_eq!(pattern_penalty(s), 1.0);
        let expected = 6.0 * 26f64.log2();
        assert!((calculate_entropy(s) - expected).abs() < 1e-9);

        let mixed = "mR7!";
        let expected = 4.0 * 88f64.log2();
        assert!((calculate_entropy(mixed) - expected).abs() < 1e-9);
    }

    #[test]
    fn entropy_is_non_decreasing_in_length_without_patterns() {
        let base = "mrkpwzhvnfjgyq";
        let mut last = 0.0;
        for n in 1..=base.len() {
            let e = calculate_entropy(&base[..n]);
            assert!(e >= last, "entropy dropped at length {n}");
            last = e;
        }
    }

    #[test]
    fn penalties_compound_and_floor() {
        // repeated run only
        assert!((pattern_penalty("Xkkkm") - 0.8).abs() < 1e-9);
        // year-like "2023" and a 4+ digit run
        assert!((pattern_penalty("k2023") - 0.8 * 0.8).abs() < 1e-9);
        // "123" sequence and a 4+ digit run
        assert!((pattern_penalty("Qz1234") - 0.8 * 0.8).abs() < 1e-9);
        // weak password: word + sequence + weak list, floored
        assert_eq!(pattern_penalty("password123"), PENALTY_FLOOR);
    }

    #[test]
    fn repeated_run_penalty_ignores_case() {
        assert!(has_repeated_run("aAa", 3));
        assert!((pattern_penalty("XaAaZm") - 0.8).abs() < 1e-9);
        assert_eq!(longest_run("aAa"), 1);
    }

    #[test]
    fn every_penalty_pattern_compiles() {
        assert_eq!(PENALTY_PATTERNS.len(), 4);
        assert!(has_year_pattern("x1999"));
    }

    #[test]
    fn keyboard_patterns_match_reversed_and_folded() {
        assert!(has_keyboard_pattern("xxQWERTYxx"));
        assert!(has_keyboard_pattern("fdsa"));
        assert!(!has_keyboard_pattern("qwer"));
    }

    #[test]
    fn runs_are_counted_per_character() {
        assert_eq!(longest_run(""), 0);
        assert_eq!(longest_run("abbcccd"), 3);
        assert!(!has_repeated_run("aabb", 3));
    }

    #[test]
    fn cache_evicts_oldest_entry() {
        let mut cache = EntropyCache::with_capacity(2);
        let a = cache.get_or_compute("mrkp");
        cache.get_or_compute("Zq9!");
        cache.get_or_compute("wvtn");
        assert_eq!(cache.len(), 2);
        assert!(!cache.values.contains_key("mrkp"));
        assert_eq!(cache.get_or_compute("mrkp"), a);
    }

    #[test]
    fn cache_insert_keeps_first_value() {
        let mut cache = EntropyCache::with_capacity(4);
        assert_eq!(cache.get("mrkp"), None);
        cache.insert("mrkp", 1.5);
        cache.insert("mrkp", 9.0);
        assert_eq!(cache.get("mrkp"), Some(1.5));
        assert_eq!(cache.len(), 1);
    }
}
