//! Password policy: the declarative rule set a generated or analyzed password
//! is held to, plus the five built-in complexity tiers.
//!
//! A policy is checked for internal consistency once, through
//! [`Policy::validate`] or [`resolve_policy`], before any random sampling.
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::charset::CharClass;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error(
        "policy requires minimum {required} characters but minimum length is only {min_length}"
    )]
    MinimumsExceedLength { required: usize, min_length: usize },
    #[error("minimum length {min_length} exceeds maximum length {max_length}")]
    LengthRange { min_length: usize, max_length: usize },
    #[error("maximum length {max_length} exceeds the supported limit of {limit}")]
    MaxLengthTooLarge { max_length: usize, limit: usize },
    #[error("max_consecutive must be at least 1")]
    MaxConsecutiveZero,
    #[error("entropy threshold must be a finite, non-negative number of bits (got {0})")]
    EntropyThreshold(f64),
    #[error("unknown complexity tier: {0}")]
    UnknownComplexity(String),
}

/// Upper bound on `max_length` accepted by [`Policy::validate`].
pub const MAX_PASSWORD_LENGTH: usize = 4096;

/// Named presets mapping to a default [`Policy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Minimum,
    Standard,
    High,
    Maximum,
    Military,
}

impl Complexity {
    pub const ALL: [Complexity; 5] = [
        Complexity::Minimum,
        Complexity::Standard,
        Complexity::High,
        Complexity::Maximum,
        Complexity::Military,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Complexity::Minimum => "minimum",
            Complexity::Standard => "standard",
            Complexity::High => "high",
            Complexity::Maximum => "maximum",
            Complexity::Military => "military",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Complexity {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Complexity::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PolicyError::UnknownComplexity(s.to_string()))
    }
}

/// Composition and exclusion rules for a password.
///
/// Per-class minimums only apply to classes whose `require_*` flag is set;
/// see [`Policy::minimum`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub min_length: usize,
    pub max_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digits: bool,
    pub require_symbols: bool,
    pub min_uppercase: usize,
    pub min_lowercase: usize,
    pub min_digits: usize,
    pub min_symbols: usize,
    pub exclude_ambiguous: bool,
    pub exclude_similar: bool,
    pub exclude_sequential: bool,
    pub exclude_repetitive: bool,
    pub max_consecutive: usize,
    pub exclude_dictionary: bool,
    pub custom_exclusions: Vec<String>,
    pub entropy_threshold: f64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            min_length: 12,
            max_length: 128,
            require_uppercase: true,
            require_lowercase: true,
            require_digits: true,
            require_symbols: true,
            min_uppercase: 1,
            min_lowercase: 1,
            min_digits: 1,
            min_symbols: 1,
            exclude_ambiguous: false,
            exclude_similar: false,
            exclude_sequential: true,
            exclude_repetitive: true,
            max_consecutive: 2,
            exclude_dictionary: true,
            custom_exclusions: Vec::new(),
            entropy_threshold: 50.0,
        }
    }
}

impl Policy {
    /// The fixed default policy for a complexity tier.
    pub fn for_complexity(tier: Complexity) -> Self {
        match tier {
            Complexity::Minimum => Self {
                min_length: 8,
                require_symbols: false,
                min_symbols: 0,
                entropy_threshold: 30.0,
                ..Self::default()
            },
            Complexity::Standard => Self::default(),
            Complexity::High => Self {
                min_length: 16,
                min_uppercase: 2,
                min_lowercase: 2,
                min_digits: 2,
                min_symbols: 2,
                exclude_ambiguous: true,
                entropy_threshold: 70.0,
                ..Self::default()
            },
            Complexity::Maximum => Self {
                min_length: 20,
                min_uppercase: 3,
                min_lowercase: 3,
                min_digits: 3,
                min_symbols: 3,
                exclude_ambiguous: true,
                exclude_similar: true,
                max_consecutive: 1,
                entropy_threshold: 90.0,
                ..Self::default()
            },
            Complexity::Military => Self {
                min_length: 24,
                min_uppercase: 4,
                min_lowercase: 4,
                min_digits: 4,
                min_symbols: 4,
                exclude_ambiguous: true,
                exclude_similar: true,
                exclude_sequential: true,
                exclude_repetitive: true,
                max_consecutive: 1,
                exclude_dictionary: true,
                entropy_threshold: 110.0,
                ..Self::default()
            },
        }
    }

    /// Override the minimum length, widening `max_length` if needed. The
    /// generator still draws a fresh length from the resulting range.
    pub fn with_length(mut self, length: usize) -> Self {
        self.min_length = length;
        self.max_length = self.max_length.max(length);
        self
    }

    pub fn requires(&self, class: CharClass) -> bool {
        match class {
            CharClass::Lowercase => self.require_lowercase,
            CharClass::Uppercase => self.require_uppercase,
            CharClass::Digit => self.require_digits,
            CharClass::Symbol => self.require_symbols,
        }
    }

    /// Effective minimum count for a class (zero when the class is not required).
    pub fn minimum(&self, class: CharClass) -> usize {
        if !self.requires(class) {
            return 0;
        }
        match class {
            CharClass::Lowercase => self.min_lowercase,
            CharClass::Uppercase => self.min_uppercase,
            CharClass::Digit => self.min_digits,
            CharClass::Symbol => self.min_symbols,
        }
    }

    /// Sum of all four `min_*` fields, whether or not the class is required.
    pub fn required_total(&self) -> usize {
        self.min_uppercase + self.min_lowercase + self.min_digits + self.min_symbols
    }

    /// Reject internally inconsistent policies.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.min_length > self.max_length {
            return Err(PolicyError::LengthRange {
                min_length: self.min_length,
                max_length: self.max_length,
            });
        }
        if self.max_length > MAX_PASSWORD_LENGTH {
            return Err(PolicyError::MaxLengthTooLarge {
                max_length: self.max_length,
                limit: MAX_PASSWORD_LENGTH,
            });
        }
        if self.max_consecutive == 0 {
            return Err(PolicyError::MaxConsecutiveZero);
        }
        if !self.entropy_threshold.is_finite() || self.entropy_threshold < 0.0 {
            return Err(PolicyError::EntropyThreshold(self.entropy_threshold));
        }
        let required = self.required_total();
        if required > self.min_length {
            return Err(PolicyError::MinimumsExceedLength {
                required,
                min_length: self.min_length,
            });
        }
        Ok(())
    }

    /// Load a policy from a JSON file. Missing fields take the standard
    /// defaults; the result is validated before it is returned.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read policy {}", path.display()))?;
        let policy: Policy = serde_json::from_str(&raw)
            .with_context(|| format!("parse policy {}", path.display()))?;
        policy
            .validate()
            .with_context(|| format!("invalid policy {}", path.display()))?;
        Ok(policy)
    }
}

/// Where a policy comes from.
#[derive(Debug, Clone)]
pub enum PolicySource {
    Tier(Complexity),
    Explicit(Policy),
}

/// Resolve a tier or an explicit field set into a checked [`Policy`].
pub fn resolve_policy(source: PolicySource) -> Result<Policy, PolicyError> {
    let policy = match source {
        PolicySource::Tier(tier) => Policy::for_complexity(tier),
        PolicySource::Explicit(policy) => policy,
    };
    policy.validate()?;
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_match_the_fixed_table() {
        let expected = [
            (Complexity::Minimum, 8, 30.0, 1),
            (Complexity::Standard, 12, 50.0, 1),
            (Complexity::High, 16, 70.0, 2),
            (Complexity::Maximum, 20, 90.0, 3),
            (Complexity::Military, 24, 110.0, 4),
        ];
        for (tier, len, entropy, per_class) in expected {
            let p = resolve_policy(PolicySource::Tier(tier)).unwrap();
            assert_eq!(p.min_length, len, "{tier}");
            assert_eq!(p.entropy_threshold, entropy, "{tier}");
            assert_eq!(p.minimum(CharClass::Uppercase), per_class, "{tier}");
        }
        let minimum = Policy::for_complexity(Complexity::Minimum);
        assert!(!minimum.require_symbols);
        assert_eq!(minimum.minimum(CharClass::Symbol), 0);

        let maximum = Policy::for_complexity(Complexity::Maximum);
        assert!(maximum.exclude_ambiguous && maximum.exclude_similar);
        assert_eq!(maximum.max_consecutive, 1);

        let military = Policy::for_complexity(Complexity::Military);
        assert!(military.exclude_sequential && military.exclude_repetitive);
        assert!(military.exclude_dictionary && military.exclude_similar);
    }

    #[test]
    fn minimums_exceeding_length_is_a_configuration_error() {
        let p = Policy {
            min_length: 3,
            max_length: 10,
            ..Policy::default()
        };
        let err = resolve_policy(PolicySource::Explicit(p)).unwrap_err();
        assert_eq!(
            err,
            PolicyError::MinimumsExceedLength {
                required: 4,
                min_length: 3
            }
        );
    }

    #[test]
    fn minimums_count_even_when_class_is_not_required() {
        let p = Policy {
            min_length: 3,
            max_length: 10,
            require_symbols: false,
            ..Policy::default()
        };
        assert_eq!(p.required_total(), 4);
        assert_eq!(
            resolve_policy(PolicySource::Explicit(p.clone())),
            Err(PolicyError::MinimumsExceedLength {
                required: 4,
                min_length: 3
            })
        );
        let zeroed = Policy { min_symbols: 0, ..p };
        assert!(zeroed.validate().is_ok());
    }

    #[test]
    fn max_length_is_bounded() {
        let p = Policy {
            max_length: usize::MAX,
            ..Policy::default()
        };
        assert_eq!(
            p.validate(),
            Err(PolicyError::MaxLengthTooLarge {
                max_length: usize::MAX,
                limit: MAX_PASSWORD_LENGTH
            })
        );
        let at_limit = Policy {
            max_length: MAX_PASSWORD_LENGTH,
            ..Policy::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_range_and_zero_consecutive() {
        let p = Policy {
            min_length: 20,
            max_length: 10,
            ..Policy::default()
        };
        assert!(matches!(p.validate(), Err(PolicyError::LengthRange { .. })));
        let p = Policy {
            max_consecutive: 0,
            ..Policy::default()
        };
        assert_eq!(p.validate(), Err(PolicyError::MaxConsecutiveZero));
    }

    #[test]
    fn length_override_widens_max() {
        let p = Policy {
            max_length: 16,
            ..Policy::default()
        }
        .with_length(32);
        assert_eq!((p.min_length, p.max_length), (32, 32));
        let p = Policy::default().with_length(14);
        assert_eq!((p.min_length, p.max_length), (14, 128));
    }

    #[test]
    fn complexity_parses_case_insensitively() {
        assert_eq!("HIGH".parse::<Complexity>().unwrap(), Complexity::High);
        assert!("extreme".parse::<Complexity>().is_err());
    }

    #[test]
    fn partial_json_policy_takes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(&path, r#"{"min_length": 16, "exclude_ambiguous": true}"#).unwrap();
        let p = Policy::from_json_file(&path).unwrap();
        assert_eq!(p.min_length, 16);
        assert!(p.exclude_ambiguous);
        assert_eq!(p.max_length, 128);
        assert_eq!(p.entropy_threshold, 50.0);
    }
}
