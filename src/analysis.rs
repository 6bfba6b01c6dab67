//! Strength analysis of arbitrary strings.
//!
//! [`analyze_password`] scores any `&str` (including the empty string) and
//! never fails. Scores, bands, crack-time estimates and findings all derive
//! from the heuristic entropy in [`crate::entropy`], not from knowledge of how
//! the string was produced.
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use md5::Md5;
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::charset::{self, CharClass};
use crate::entropy::{
    EntropyCache, calculate_entropy, has_keyboard_pattern, has_repeated_run, has_year_pattern,
    pattern_penalty, REPEAT_RUN,
};
use crate::policy::Policy;
use crate::validator::{ComplianceCheck, check_compliance};
use crate::wordlist::is_weak_password;

/// Below this many bits an extra complexity recommendation is emitted.
pub const RECOMMENDED_ENTROPY: f64 = 50.0;
/// Terms that mark a password as built around an account word.
pub const COMMON_TERMS: &[&str] = &["password", "admin", "user", "login"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrengthLevel {
    VeryWeak,
    Weak,
    Moderate,
    Good,
    Strong,
    VeryStrong,
    Excellent,
}

impl StrengthLevel {
    /// Band for a score; each lower bound is inclusive.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            StrengthLevel::Excellent
        } else if score >= 80.0 {
            StrengthLevel::VeryStrong
        } else if score >= 70.0 {
            StrengthLevel::Strong
        } else if score >= 60.0 {
            StrengthLevel::Good
        } else if score >= 40.0 {
            StrengthLevel::Moderate
        } else if score >= 20.0 {
            StrengthLevel::Weak
        } else {
            StrengthLevel::VeryWeak
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StrengthLevel::VeryWeak => "VERY_WEAK",
            StrengthLevel::Weak => "WEAK",
            StrengthLevel::Moderate => "MODERATE",
            StrengthLevel::Good => "GOOD",
            StrengthLevel::Strong => "STRONG",
            StrengthLevel::VeryStrong => "VERY_STRONG",
            StrengthLevel::Excellent => "EXCELLENT",
        }
    }
}

impl fmt::Display for StrengthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score in `[0, 100]` from length, class variety, entropy and pattern
/// penalty. The empty string scores zero.
pub fn strength_score(s: &str, entropy: f64) -> f64 {
    if s.is_empty() {
        return 0.0;
    }
    let length = s.chars().count();
    let length_points = match length {
        20.. => 25.0,
        16..=19 => 20.0,
        12..=15 => 15.0,
        8..=11 => 10.0,
        n => 2.0 * n as f64,
    };
    let varieties = CharClass::ALL.iter().filter(|c| c.present_in(s)).count();
    let variety_points = varieties as f64 * 6.25;
    let entropy_points = f64::min(40.0, entropy / 100.0 * 40.0);
    let pattern_points = pattern_penalty(s) * 10.0;
    (length_points + variety_points + entropy_points + pattern_points).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackScenario {
    Instant,
    OnlineThrottled,
    OnlineUnthrottled,
    OfflineSlow,
    OfflineFast,
    MassiveCracking,
}

impl AttackScenario {
    pub const RATED: [AttackScenario; 5] = [
        AttackScenario::OnlineThrottled,
        AttackScenario::OnlineUnthrottled,
        AttackScenario::OfflineSlow,
        AttackScenario::OfflineFast,
        AttackScenario::MassiveCracking,
    ];

    /// Guesses per second.
    pub fn rate(self) -> f64 {
        match self {
            AttackScenario::Instant => f64::INFINITY,
            AttackScenario::OnlineThrottled => 1e3,
            AttackScenario::OnlineUnthrottled => 1e6,
            AttackScenario::OfflineSlow => 1e9,
            AttackScenario::OfflineFast => 1e12,
            AttackScenario::MassiveCracking => 1e15,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttackScenario::Instant => "Instant",
            AttackScenario::OnlineThrottled => "Online (throttled)",
            AttackScenario::OnlineUnthrottled => "Online (unthrottled)",
            AttackScenario::OfflineSlow => "Offline (slow hash)",
            AttackScenario::OfflineFast => "Offline (fast hash)",
            AttackScenario::MassiveCracking => "Massive cracking",
        }
    }
}

/// Average time to guess, per attack scenario. Non-positive entropy yields a
/// single `Instant` entry.
pub fn estimate_crack_time(entropy: f64) -> BTreeMap<AttackScenario, String> {
    if entropy <= 0.0 {
        return BTreeMap::from([(AttackScenario::Instant, "0 seconds".to_string())]);
    }
    let half_space = 2f64.powf(entropy) / 2.0;
    AttackScenario::RATED
        .iter()
        .map(|&scenario| (scenario, format_duration(half_space / scenario.rate())))
        .collect()
}

pub fn format_duration(seconds: f64) -> String {
    const MINUTE: f64 = 60.0;
    const HOUR: f64 = 3_600.0;
    const DAY: f64 = 86_400.0;
    const YEAR: f64 = 31_536_000.0;
    if seconds < MINUTE {
        format!("{:.0} seconds", seconds)
    } else if seconds < HOUR {
        format!("{:.0} minutes", seconds / MINUTE)
    } else if seconds < DAY {
        format!("{:.1} hours", seconds / HOUR)
    } else if seconds < YEAR {
        format!("{:.0} days", seconds / DAY)
    } else if seconds < YEAR * 1_000.0 {
        format!("{:.0} years", seconds / YEAR)
    } else {
        "centuries".to_string()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CharacterAnalysis {
    pub has_lowercase: bool,
    pub has_uppercase: bool,
    pub has_digits: bool,
    pub has_symbols: bool,
    pub has_ambiguous: bool,
    pub has_similar: bool,
    pub only_ascii: bool,
    pub has_unicode: bool,
}

impl CharacterAnalysis {
    pub fn of(s: &str) -> Self {
        Self {
            has_lowercase: CharClass::Lowercase.present_in(s),
            has_uppercase: CharClass::Uppercase.present_in(s),
            has_digits: CharClass::Digit.present_in(s),
            has_symbols: CharClass::Symbol.present_in(s),
            has_ambiguous: charset::has_ambiguous(s),
            has_similar: charset::has_similar(s),
            only_ascii: s.is_ascii(),
            has_unicode: !s.is_ascii(),
        }
    }
}

/// A structural weakness found in an analyzed string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Vulnerability {
    TooShort,
    LowDiversity,
    CommonPassword,
    OnlyLowercase,
    OnlyUppercase,
    OnlyDigits,
    KeyboardPattern,
    YearPattern,
    RepeatedCharacters,
    CommonTerms,
}

impl Vulnerability {
    pub fn message(self) -> &'static str {
        match self {
            Vulnerability::TooShort => "Password too short (less than 8 characters)",
            Vulnerability::LowDiversity => "Low character diversity (many repeated characters)",
            Vulnerability::CommonPassword => "Password found in common password lists",
            Vulnerability::OnlyLowercase => "Only lowercase letters used",
            Vulnerability::OnlyUppercase => "Only uppercase letters used",
            Vulnerability::OnlyDigits => "Only digits used",
            Vulnerability::KeyboardPattern => "Contains keyboard patterns",
            Vulnerability::YearPattern => "Contains year pattern",
            Vulnerability::RepeatedCharacters => "Contains repeated character sequences",
            Vulnerability::CommonTerms => "Contains common password terms",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            Vulnerability::TooShort => "Increase password length to at least 12 characters",
            Vulnerability::LowDiversity => "Use more unique characters",
            Vulnerability::CommonPassword => "Never reuse a password from common password lists",
            Vulnerability::OnlyLowercase
            | Vulnerability::OnlyUppercase
            | Vulnerability::OnlyDigits => "Mix uppercase, lowercase, digits and symbols",
            Vulnerability::KeyboardPattern => "Avoid keyboard patterns (qwerty, 123456, etc.)",
            Vulnerability::YearPattern => "Avoid years and dates",
            Vulnerability::RepeatedCharacters => {
                "Avoid repeating the same character multiple times"
            }
            Vulnerability::CommonTerms => "Avoid account words such as password, admin or login",
        }
    }
}

impl fmt::Display for Vulnerability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl Serialize for Vulnerability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.message())
    }
}

/// Findings in a fixed order; each check is independent.
pub fn identify_vulnerabilities(s: &str) -> Vec<Vulnerability> {
    let mut found = Vec::new();
    let length = s.chars().count();
    if length < 8 {
        found.push(Vulnerability::TooShort);
    }
    let unique = s.chars().collect::<HashSet<_>>().len();
    if (unique as f64) < length as f64 * 0.5 {
        found.push(Vulnerability::LowDiversity);
    }
    if is_weak_password(s) {
        found.push(Vulnerability::CommonPassword);
    }
    if !s.is_empty() {
        if s.chars().all(|c| c.is_ascii_lowercase()) {
            found.push(Vulnerability::OnlyLowercase);
        } else if s.chars().all(|c| c.is_ascii_uppercase()) {
            found.push(Vulnerability::OnlyUppercase);
        } else if s.chars().all(|c| c.is_ascii_digit()) {
            found.push(Vulnerability::OnlyDigits);
        }
    }
    if has_keyboard_pattern(s) {
        found.push(Vulnerability::KeyboardPattern);
    }
    if has_year_pattern(s) {
        found.push(Vulnerability::YearPattern);
    }
    if has_repeated_run(s, REPEAT_RUN) {
        found.push(Vulnerability::RepeatedCharacters);
    }
    let folded = s.to_lowercase();
    if COMMON_TERMS.iter().any(|t| folded.contains(t)) {
        found.push(Vulnerability::CommonTerms);
    }
    found
}

fn compliance_recommendation(check: ComplianceCheck, s: &str, policy: &Policy) -> String {
    match check {
        ComplianceCheck::Length if s.chars().count() > policy.max_length => format!(
            "Shorten password to at most {} characters",
            policy.max_length
        ),
        ComplianceCheck::Length => format!(
            "Increase password length to at least {} characters",
            policy.min_length
        ),
        ComplianceCheck::Uppercase => "Add uppercase letters (A-Z)".to_string(),
        ComplianceCheck::Lowercase => "Add lowercase letters (a-z)".to_string(),
        ComplianceCheck::Digits => "Add numeric digits (0-9)".to_string(),
        ComplianceCheck::Symbols => "Add special symbols (!@#$%^&*)".to_string(),
        ComplianceCheck::NoAmbiguous => "Avoid ambiguous characters (0, O, 1, l, I)".to_string(),
        ComplianceCheck::NoSimilar => {
            "Avoid visually similar characters (i, l, 1, L, o, 0, O, I)".to_string()
        }
        ComplianceCheck::NoSequential => "Avoid sequential characters (abc, 123, etc.)".to_string(),
        ComplianceCheck::NoRepetitive => {
            "Avoid repeating the same character multiple times".to_string()
        }
        ComplianceCheck::NoDictionary => "Avoid dictionary words and common passwords".to_string(),
        ComplianceCheck::NoCustomExclusions => {
            "Remove characters excluded by the policy".to_string()
        }
        ComplianceCheck::Entropy => "Increase overall complexity for better security".to_string(),
    }
}

/// Templated suggestions: one per failed compliance check, one per
/// vulnerability, plus a complexity nudge below [`RECOMMENDED_ENTROPY`].
/// Duplicates are dropped; an empty result becomes a single pass message.
pub fn recommendations(
    s: &str,
    policy: Option<&Policy>,
    compliance: &BTreeMap<ComplianceCheck, bool>,
    vulnerabilities: &[Vulnerability],
    entropy: f64,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |r: String| {
        if !out.contains(&r) {
            out.push(r);
        }
    };
    if let Some(policy) = policy {
        for check in ComplianceCheck::ALL {
            if compliance.get(&check) == Some(&false) {
                push(compliance_recommendation(check, s, policy));
            }
        }
    }
    for v in vulnerabilities {
        push(v.recommendation().to_string());
    }
    if entropy < RECOMMENDED_ENTROPY {
        push("Increase overall complexity for better security".to_string());
    }
    if out.is_empty() {
        out.push("Password meets security requirements".to_string());
    }
    out
}

/// Fast digests of the plain string, for display only. These are unsalted
/// and fast to brute-force; use [`crate::hashing`] with PBKDF2 for storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayDigests {
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
    pub sha512: String,
}

impl DisplayDigests {
    pub fn of(s: &str) -> Self {
        let bytes = s.as_bytes();
        Self {
            md5: hex::encode(Md5::digest(bytes)),
            sha1: hex::encode(Sha1::digest(bytes)),
            sha256: hex::encode(Sha256::digest(bytes)),
            sha512: hex::encode(Sha512::digest(bytes)),
        }
    }
}

/// Full analysis of one string. Built fresh per call.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordAnalysis {
    pub password: String,
    pub strength_score: f64,
    pub strength_level: StrengthLevel,
    pub entropy: f64,
    pub time_to_crack: BTreeMap<AttackScenario, String>,
    pub character_analysis: CharacterAnalysis,
    /// Empty when no policy was supplied.
    pub policy_compliance: BTreeMap<ComplianceCheck, bool>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub recommendations: Vec<String>,
    pub display_digests: DisplayDigests,
    pub created_at: DateTime<Utc>,
}

/// Analyze `password`, checking compliance against `policy` when given.
pub fn analyze_password(password: &str, policy: Option<&Policy>) -> PasswordAnalysis {
    build_analysis(password, policy, calculate_entropy(password))
}

fn build_analysis(password: &str, policy: Option<&Policy>, entropy: f64) -> PasswordAnalysis {
    let strength_score = strength_score(password, entropy);
    let policy_compliance = policy
        .map(|p| check_compliance(password, p))
        .unwrap_or_default();
    let vulnerabilities = identify_vulnerabilities(password);
    let recommendations = recommendations(
        password,
        policy,
        &policy_compliance,
        &vulnerabilities,
        entropy,
    );
    PasswordAnalysis {
        password: password.to_string(),
        strength_score,
        strength_level: StrengthLevel::from_score(strength_score),
        entropy,
        time_to_crack: estimate_crack_time(entropy),
        character_analysis: CharacterAnalysis::of(password),
        policy_compliance,
        vulnerabilities,
        recommendations,
        display_digests: DisplayDigests::of(password),
        created_at: Utc::now(),
    }
}

/// Analyzer with a bounded entropy memo, shareable across threads.
#[derive(Debug, Default)]
pub struct Analyzer {
    cache: Mutex<EntropyCache>,
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(EntropyCache::with_capacity(capacity)),
        }
    }

    /// Cached entropy of `s`. The lock is not held while computing.
    pub fn entropy(&self, s: &str) -> f64 {
        let cached = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(s);
        if let Some(v) = cached {
            return v;
        }
        let v = calculate_entropy(s);
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(s, v);
        v
    }

    pub fn analyze(&self, password: &str, policy: Option<&Policy>) -> PasswordAnalysis {
        build_analysis(password, policy, self.entropy(password))
    }

    /// Analyze many strings in parallel, preserving input order.
    pub fn analyze_all<S>(&self, passwords: &[S], policy: Option<&Policy>) -> Vec<PasswordAnalysis>
    where
        S: AsRef<str> + Sync,
    {
        passwords
            .par_iter()
            .map(|p| self.analyze(p.as_ref(), policy))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Complexity;

    #[test]
    fn band_thresholds_are_inclusive() {
        assert_eq!(StrengthLevel::from_score(90.0), StrengthLevel::Excellent);
        assert_eq!(StrengthLevel::from_score(89.999), StrengthLevel::VeryStrong);
        assert_eq!(StrengthLevel::from_score(80.0), StrengthLevel::VeryStrong);
        assert_eq!(StrengthLevel::from_score(70.0), StrengthLevel::Strong);
        assert_eq!(StrengthLevel::from_score(60.0), StrengthLevel::Good);
        assert_eq!(StrengthLevel::from_score(40.0), StrengthLevel::Moderate);
        assert_eq!(StrengthLevel::from_score(20.0), StrengthLevel::Weak);
        assert_eq!(StrengthLevel::from_score(19.999), StrengthLevel::VeryWeak);
    }

    #[test]
    fn empty_string_scores_zero() {
        let a = analyze_password("", None);
        assert_eq!(a.entropy, 0.0);
        assert_eq!(a.strength_score, 0.0);
        assert_eq!(a.strength_level, StrengthLevel::VeryWeak);
        assert_eq!(a.time_to_crack.len(), 1);
        assert_eq!(a.time_to_crack[&AttackScenario::Instant], "0 seconds");
        assert_eq!(a.vulnerabilities, vec![Vulnerability::TooShort]);
    }

    #[test]
    fn weak_password_is_floored() {
        let a = analyze_password("password123", None);
        assert!(a.vulnerabilities.contains(&Vulnerability::CommonPassword));
        assert!(
            a.vulnerabilities
                .iter()
                .any(|v| v.message() == "Password found in common password lists")
        );
        let expected_entropy = 11.0 * 36f64.log2() * 0.1;
        assert!((a.entropy - expected_entropy).abs() < 1e-9);
        // 10 length + 12.5 variety + entropy share + 1.0 floored pattern points
        let expected_score = 10.0 + 12.5 + expected_entropy / 100.0 * 40.0 + 1.0;
        assert!((a.strength_score - expected_score).abs() < 1e-9);
        assert_eq!(a.strength_level, StrengthLevel::Weak);
    }

    #[test]
    fn strong_random_string_scores_high() {
        let s = "Zq7#xvK2!mR9@wTp4$hN";
        let a = analyze_password(s, None);
        assert!(a.entropy > 120.0);
        assert_eq!(a.strength_level, StrengthLevel::Excellent);
        assert_eq!(a.recommendations, vec!["Password meets security requirements"]);
        assert!(a.policy_compliance.is_empty());
    }

    #[test]
    fn crack_time_bands() {
        assert_eq!(format_duration(5.0), "5 seconds");
        assert_eq!(format_duration(120.0), "2 minutes");
        assert_eq!(format_duration(5_400.0), "1.5 hours");
        assert_eq!(format_duration(172_800.0), "2 days");
        assert_eq!(format_duration(63_072_000.0), "2 years");
        assert_eq!(format_duration(1e12), "centuries");
        let est = estimate_crack_time(200.0);
        assert_eq!(est.len(), 5);
        assert!(est.values().all(|t| t == "centuries"));
        // 2^21 / 2 / 1e3 seconds ~ 17.5 minutes
        assert_eq!(
            estimate_crack_time(21.0)[&AttackScenario::OnlineThrottled],
            "17 minutes"
        );
    }

    #[test]
    fn vulnerabilities_are_independent() {
        let v = identify_vulnerabilities("aaaa1999");
        assert_eq!(
            v,
            vec![
                Vulnerability::LowDiversity,
                Vulnerability::YearPattern,
                Vulnerability::RepeatedCharacters
            ]
        );
        assert_eq!(
            identify_vulnerabilities("ADMINS"),
            vec![
                Vulnerability::TooShort,
                Vulnerability::OnlyUppercase,
                Vulnerability::CommonTerms
            ]
        );
        assert!(identify_vulnerabilities("xqwertyx").contains(&Vulnerability::KeyboardPattern));
    }

    #[test]
    fn recommendations_follow_compliance_and_findings() {
        let policy = Policy::for_complexity(Complexity::Standard);
        let a = analyze_password("lowercase", Some(&policy));
        assert!(!a.policy_compliance[&ComplianceCheck::Uppercase]);
        assert!(a.recommendations.contains(&"Add uppercase letters (A-Z)".to_string()));
        assert!(a.recommendations.contains(&"Add numeric digits (0-9)".to_string()));
        assert!(
            a.recommendations
                .contains(&"Mix uppercase, lowercase, digits and symbols".to_string())
        );
        let complexity = a
            .recommendations
            .iter()
            .filter(|r| r.as_str() == "Increase overall complexity for better security")
            .count();
        assert_eq!(complexity, 1);
    }

    #[test]
    fn display_digests_are_hex() {
        let d = DisplayDigests::of("abc");
        assert_eq!(d.md5, "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(
            d.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(d.sha1.len(), 40);
        assert_eq!(d.sha512.len(), 128);
    }

    #[test]
    fn analyzer_matches_free_function_and_keeps_order() {
        let analyzer = Analyzer::with_cache_capacity(4);
        let inputs = vec!["hunter2", "Zq7#xvK2", "", "password"];
        let out = analyzer.analyze_all(&inputs, None);
        assert_eq!(out.len(), 4);
        for (a, s) in out.iter().zip(&inputs) {
            assert_eq!(a.password, *s);
            assert_eq!(a.entropy, calculate_entropy(s));
        }
    }

    #[test]
    fn analyzer_cache_stays_bounded_under_parallel_use() {
        let analyzer = Analyzer::with_cache_capacity(2);
        let inputs: Vec<String> = (0..40).map(|i| format!("mrkp{i}Zq!")).collect();
        let first = analyzer.analyze_all(&inputs, None);
        let second = analyzer.analyze_all(&inputs, None);
        assert!(analyzer.cache.lock().unwrap().len() <= 2);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.entropy, b.entropy);
            assert_eq!(a.entropy, calculate_entropy(&a.password));
        }
    }
}
