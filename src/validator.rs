//! Policy checks. [`is_valid`] is the accept/reject gate used by the
//! generator; [`check_compliance`] reports the same checks one by one.
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::charset::{self, CharClass};
use crate::entropy::calculate_entropy;
use crate::policy::Policy;
use crate::wordlist::{embeddable_words, is_weak_password, is_word};

/// Common three-character sequences rejected regardless of case.
pub const COMMON_SEQUENCES: &[&str] = &["abc", "123", "qwe", "asd", "zxc", "wer", "ert", "rty"];

/// Identifier of one compliance rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceCheck {
    Length,
    Uppercase,
    Lowercase,
    Digits,
    Symbols,
    NoAmbiguous,
    NoSimilar,
    NoSequential,
    NoRepetitive,
    NoDictionary,
    NoCustomExclusions,
    Entropy,
}

impl ComplianceCheck {
    /// Evaluation order; cheap checks first, entropy last.
    pub const ALL: [ComplianceCheck; 12] = [
        ComplianceCheck::Length,
        ComplianceCheck::Uppercase,
        ComplianceCheck::Lowercase,
        ComplianceCheck::Digits,
        ComplianceCheck::Symbols,
        ComplianceCheck::NoAmbiguous,
        ComplianceCheck::NoSimilar,
        ComplianceCheck::NoCustomExclusions,
        ComplianceCheck::NoSequential,
        ComplianceCheck::NoRepetitive,
        ComplianceCheck::NoDictionary,
        ComplianceCheck::Entropy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ComplianceCheck::Length => "length",
            ComplianceCheck::Uppercase => "uppercase",
            ComplianceCheck::Lowercase => "lowercase",
            ComplianceCheck::Digits => "digits",
            ComplianceCheck::Symbols => "symbols",
            ComplianceCheck::NoAmbiguous => "no_ambiguous",
            ComplianceCheck::NoSimilar => "no_similar",
            ComplianceCheck::NoSequential => "no_sequential",
            ComplianceCheck::NoRepetitive => "no_repetitive",
            ComplianceCheck::NoDictionary => "no_dictionary",
            ComplianceCheck::NoCustomExclusions => "no_custom_exclusions",
            ComplianceCheck::Entropy => "entropy",
        }
    }

    /// Whether `candidate` passes this rule under `policy`. Rules tied to a
    /// disabled `exclude_*` flag always pass.
    pub fn passes(self, candidate: &str, policy: &Policy) -> bool {
        match self {
            ComplianceCheck::Length => {
                let len = candidate.chars().count();
                (policy.min_length..=policy.max_length).contains(&len)
            }
            ComplianceCheck::Uppercase => class_ok(candidate, policy, CharClass::Uppercase),
            ComplianceCheck::Lowercase => class_ok(candidate, policy, CharClass::Lowercase),
            ComplianceCheck::Digits => class_ok(candidate, policy, CharClass::Digit),
            ComplianceCheck::Symbols => class_ok(candidate, policy, CharClass::Symbol),
            ComplianceCheck::NoAmbiguous => {
                !policy.exclude_ambiguous || !charset::has_ambiguous(candidate)
            }
            ComplianceCheck::NoSimilar => {
                !policy.exclude_similar || !charset::has_similar(candidate)
            }
            ComplianceCheck::NoSequential => {
                !policy.exclude_sequential || !has_sequential_pattern(candidate)
            }
            ComplianceCheck::NoRepetitive => {
                !policy.exclude_repetitive
                    || !has_repetitive_pattern(candidate, policy.max_consecutive)
            }
            ComplianceCheck::NoDictionary => {
                !policy.exclude_dictionary || !contains_dictionary_word(candidate)
            }
            ComplianceCheck::NoCustomExclusions => policy
                .custom_exclusions
                .iter()
                .filter(|e| !e.is_empty())
                .all(|e| !candidate.contains(e.as_str())),
            ComplianceCheck::Entropy => calculate_entropy(candidate) >= policy.entropy_threshold,
        }
    }
}

impl fmt::Display for ComplianceCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn class_ok(candidate: &str, policy: &Policy, class: CharClass) -> bool {
    class.count_in(candidate) >= policy.minimum(class)
}

/// Accept/reject gate: every rule must pass.
pub fn is_valid(candidate: &str, policy: &Policy) -> bool {
    ComplianceCheck::ALL
        .iter()
        .all(|check| check.passes(candidate, policy))
}

/// Per-rule pass/fail map for display.
pub fn check_compliance(candidate: &str, policy: &Policy) -> BTreeMap<ComplianceCheck, bool> {
    ComplianceCheck::ALL
        .iter()
        .map(|&check| (check, check.passes(candidate, policy)))
        .collect()
}

/// A common sequence, or three consecutive code points running up or down.
pub fn has_sequential_pattern(s: &str) -> bool {
    let folded = s.to_lowercase();
    if COMMON_SEQUENCES.iter().any(|seq| folded.contains(seq)) {
        return true;
    }
    let points: Vec<u32> = s.chars().map(u32::from).collect();
    points.windows(3).any(|w| {
        let ascending = w[0].checked_add(1) == Some(w[1]) && w[1].checked_add(1) == Some(w[2]);
        let descending = w[0].checked_sub(1) == Some(w[1]) && w[1].checked_sub(1) == Some(w[2]);
        ascending || descending
    })
}

/// Some character repeats more than `max_consecutive` times in a row.
pub fn has_repetitive_pattern(s: &str, max_consecutive: usize) -> bool {
    crate::entropy::longest_run(s) > max_consecutive
}

/// The candidate is a word-list entry or a weak password, or embeds a
/// word-list entry of four or more letters.
pub fn contains_dictionary_word(s: &str) -> bool {
    let folded = s.to_lowercase();
    if is_weak_password(&folded) || is_word(&folded) {
        return true;
    }
    embeddable_words().iter().any(|w| folded.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lenient() -> Policy {
        Policy {
            min_length: 4,
            max_length: 64,
            entropy_threshold: 0.0,
            ..Policy::default()
        }
    }

    #[test]
    fn sequential_detection_covers_literals_and_runs() {
        assert!(has_sequential_pattern("xxQWEzz"));
        assert!(has_sequential_pattern("k7RtY"));
        assert!(has_sequential_pattern("m#lmn"));
        assert!(has_sequential_pattern("Z9876"));
        assert!(has_sequential_pattern("a()*"));
        assert!(!has_sequential_pattern("m9K#p2"));
    }

    #[test]
    fn repetition_respects_max_consecutive() {
        assert!(!has_repetitive_pattern("aabb", 2));
        assert!(has_repetitive_pattern("aaab", 2));
        assert!(has_repetitive_pattern("aab", 1));
        assert!(!has_repetitive_pattern("", 1));
    }

    #[test]
    fn dictionary_check_flags_embedded_words() {
        assert!(contains_dictionary_word("X9#major!"));
        assert!(contains_dictionary_word("ART"));
        assert!(contains_dictionary_word("Welcome123"));
        assert!(!contains_dictionary_word("Zq7#xv"));
    }

    #[test]
    fn gate_accepts_compliant_candidate() {
        assert!(is_valid("Zq7#xvK2", &lenient()));
    }

    #[test]
    fn gate_rejects_each_failure() {
        let p = lenient();
        assert!(!is_valid("Zq7#", &Policy { min_length: 5, ..p.clone() }));
        assert!(!is_valid("zq7#xvk2", &p));
        assert!(!is_valid("Zq7#xvK2!!!", &p));
        assert!(!is_valid("Zq7#bookK", &p));
        assert!(!is_valid("Zq7#xvK2", &Policy { entropy_threshold: 1000.0, ..p.clone() }));
        assert!(!is_valid(
            "Zq7#xvK2",
            &Policy {
                custom_exclusions: vec!["xv".to_string()],
                ..p
            }
        ));
    }

    #[test]
    fn disabled_rules_always_pass() {
        let p = Policy {
            exclude_sequential: false,
            exclude_repetitive: false,
            exclude_dictionary: false,
            ..lenient()
        };
        assert!(is_valid("Abc123!!!book", &p));
    }

    #[test]
    fn compliance_reports_every_check() {
        let p = Policy {
            exclude_ambiguous: true,
            ..lenient()
        };
        let report = check_compliance("Pa0ss", &p);
        assert_eq!(report.len(), ComplianceCheck::ALL.len());
        assert!(report[&ComplianceCheck::Length]);
        assert!(!report[&ComplianceCheck::Symbols]);
        assert!(!report[&ComplianceCheck::NoAmbiguous]);
        assert!(report[&ComplianceCheck::NoSequential]);
    }
}
