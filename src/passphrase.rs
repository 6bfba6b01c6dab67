//! Word-based passphrases sampled from [`WORDLIST`].
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::charset::{DIGITS, SYMBOLS_BASIC};
use crate::entropy::calculate_entropy;
use crate::generator::GenerateError;
use crate::wordlist::WORDLIST;

/// Word count past which entropy escalation gives up, unless the caller
/// asked for more words to begin with.
pub const MAX_WORD_COUNT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassphraseOptions {
    pub word_count: usize,
    pub separator: String,
    pub capitalize: bool,
    pub add_numbers: bool,
    pub add_symbols: bool,
    pub min_entropy: f64,
}

impl Default for PassphraseOptions {
    fn default() -> Self {
        Self {
            word_count: 6,
            separator: "-".to_string(),
            capitalize: true,
            add_numbers: true,
            add_symbols: false,
            min_entropy: 50.0,
        }
    }
}

pub fn generate_passphrase(opts: &PassphraseOptions) -> Result<String, GenerateError> {
    generate_passphrase_with_rng(opts, &mut OsRng)
}

/// Assemble a passphrase; while its entropy is below `min_entropy`, retry
/// with one more word and a forced symbol suffix.
pub fn generate_passphrase_with_rng<R>(
    opts: &PassphraseOptions,
    rng: &mut R,
) -> Result<String, GenerateError>
where
    R: RngCore + CryptoRng,
{
    if opts.word_count < 2 {
        return Err(GenerateError::InvalidWordCount(opts.word_count));
    }
    let ceiling = opts.word_count.max(MAX_WORD_COUNT);
    let mut word_count = opts.word_count;
    let mut add_symbols = opts.add_symbols;

    while word_count <= ceiling {
        let phrase = assemble(opts, word_count, add_symbols, rng);
        let entropy = calculate_entropy(&phrase);
        if entropy >= opts.min_entropy {
            return Ok(phrase);
        }
        log::debug!(
            "passphrase with {} words reached {:.1} bits, below {:.1}; adding a word",
            word_count,
            entropy,
            opts.min_entropy
        );
        word_count += 1;
        add_symbols = true;
    }
    Err(GenerateError::PassphraseEntropyUnreachable {
        min_entropy: opts.min_entropy,
        max_words: ceiling,
    })
}

fn assemble<R>(opts: &PassphraseOptions, word_count: usize, add_symbols: bool, rng: &mut R) -> String
where
    R: RngCore + CryptoRng,
{
    let words: Vec<String> = (0..word_count)
        .filter_map(|_| WORDLIST.choose(rng))
        .map(|w| if opts.capitalize { capitalize(w) } else { w.to_string() })
        .collect();
    let mut phrase = words.join(&opts.separator);

    if opts.add_numbers {
        let n = rng.gen_range(2..=4);
        phrase.push_str(&opts.separator);
        phrase.push_str(&sample(DIGITS, n, rng));
    }
    if add_symbols {
        let n = rng.gen_range(1..=2);
        phrase.push_str(&opts.separator);
        phrase.push_str(&sample(SYMBOLS_BASIC, n, rng));
    }
    phrase
}

fn sample<R: Rng + ?Sized>(alphabet: &str, n: usize, rng: &mut R) -> String {
    let chars: Vec<char> = alphabet.chars().collect();
    (0..n).filter_map(|_| chars.choose(rng).copied()).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
