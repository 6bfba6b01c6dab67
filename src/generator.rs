//! Generator: builds candidates for a [`Policy`] from a cryptographically
//! secure random source and keeps the first one the validator accepts.
//!
//! Every call draws a fresh length from `[min_length, max_length]`, so two
//! calls with the same policy can return strings of different lengths.
//!
//! ```no_run
//! use genpass::{generator, policy::{Complexity, Policy}};
//! # fn main() -> Result<(), genpass::generator::GenerateError> {
//! let policy = Policy::for_complexity(Complexity::High);
//! println!("{}", generator::generate(&policy)?);
//! # Ok(())
//! # }
//! ```
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng, RngCore};

use crate::charset::{AMBIGUOUS, CharClass, SIMILAR};
use crate::policy::{Policy, PolicyError};
use crate::validator::is_valid;

/// Candidates built before giving up on a policy.
pub const MAX_ATTEMPTS: usize = 1000;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("invalid policy: {0}")]
    Configuration(#[from] PolicyError),
    #[error("no usable characters remain for {0} after applying exclusions")]
    PolicyUnsatisfiable(String),
    #[error(
        "unable to generate password meeting policy requirements after {attempts} attempts"
    )]
    GenerationExhausted { attempts: usize },
    #[error("word count must be at least 2 (got {0})")]
    InvalidWordCount(usize),
    #[error("passphrase could not reach {min_entropy} bits of entropy within {max_words} words")]
    PassphraseEntropyUnreachable { min_entropy: f64, max_words: usize },
    #[error("batch count must be positive")]
    EmptyBatch,
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Sampling alphabets for one policy, after exclusions.
#[derive(Debug, Clone, PartialEq)]
pub struct CharPool {
    /// Union of every required class.
    pub combined: Vec<char>,
    /// Per required class: its reduced alphabet and how many samples to seed.
    pub seeds: Vec<(CharClass, Vec<char>, usize)>,
}

impl CharPool {
    /// Build the pools for `policy`, failing if any required alphabet (or the
    /// union) ends up empty.
    pub fn for_policy(policy: &Policy) -> Result<Self, GenerateError> {
        let excluded = |c: char| {
            (policy.exclude_ambiguous && AMBIGUOUS.contains(c))
                || (policy.exclude_similar && SIMILAR.contains(c))
                || policy
                    .custom_exclusions
                    .iter()
                    .any(|e| e.chars().count() == 1 && e.contains(c))
        };

        let mut combined = Vec::new();
        let mut seeds = Vec::new();
        for class in CharClass::ALL {
            if !policy.requires(class) {
                continue;
            }
            let alphabet: Vec<char> = class.charset().chars().filter(|&c| !excluded(c)).collect();
            let need = policy.minimum(class);
            if need > 0 && alphabet.is_empty() {
                return Err(GenerateError::PolicyUnsatisfiable(class.to_string()));
            }
            combined.extend_from_slice(&alphabet);
            seeds.push((class, alphabet, need));
        }
        if combined.is_empty() {
            return Err(GenerateError::PolicyUnsatisfiable("the policy".to_string()));
        }
        Ok(Self { combined, seeds })
    }
}

/// Generate a password for `policy` using the operating system's CSPRNG.
pub fn generate(policy: &Policy) -> Result<String, GenerateError> {
    generate_with_rng(policy, &mut OsRng)
}

/// Generate with a caller-supplied cryptographically secure RNG.
pub fn generate_with_rng<R>(policy: &Policy, rng: &mut R) -> Result<String, GenerateError>
where
    R: RngCore + CryptoRng,
{
    policy.validate()?;
    let pool = CharPool::for_policy(policy)?;

    for attempt in 1..=MAX_ATTEMPTS {
        let candidate = build_candidate(policy, &pool, rng);
        if is_valid(&candidate, policy) {
            log::trace!("accepted candidate on attempt {}", attempt);
            return Ok(candidate);
        }
        log::trace!("rejected candidate on attempt {}", attempt);
    }
    log::warn!(
        "no candidate satisfied the policy after {} attempts",
        MAX_ATTEMPTS
    );
    Err(GenerateError::GenerationExhausted {
        attempts: MAX_ATTEMPTS,
    })
}

/// One unvalidated candidate: seeded class samples, random fill, then a
/// uniform shuffle of the whole sequence.
pub fn build_candidate<R>(policy: &Policy, pool: &CharPool, rng: &mut R) -> String
where
    R: RngCore + CryptoRng,
{
    let length = rng.gen_range(policy.min_length..=policy.max_length);
    let mut chars: Vec<char> = Vec::with_capacity(length);
    for (_, alphabet, need) in &pool.seeds {
        chars.extend((0..*need).filter_map(|_| alphabet.choose(rng).copied()));
    }
    while chars.len() < length {
        match pool.combined.choose(rng) {
            Some(&c) => chars.push(c),
            None => break,
        }
    }
    chars.shuffle(rng);
    chars.into_iter().collect()
}
