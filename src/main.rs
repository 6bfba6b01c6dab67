//! CLI entrypoint for `genpass`.
//!
//! Resolves a policy from a complexity tier, CLI overrides or a JSON policy
//! file, then generates passwords or passphrases, analyzes candidate strings,
//! or hashes and verifies a secret. Results go to stdout or to `-o` in text,
//! JSON or CSV.
use std::fmt::Display;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use genpass::{
    analysis::Analyzer,
    batch::batch_generate,
    export::{OutputFormat, with_output, write_analyses, write_strings},
    generator::{GenerateError, generate},
    hashing::{HashAlgorithm, HashInfo, hash_password, verify_hash_info},
    io::{DEFAULT_MMAP_THRESHOLD_BYTES, read_candidates, read_candidates_from},
    passphrase::{PassphraseOptions, generate_passphrase},
    policy::{Complexity, Policy, PolicySource, resolve_policy},
    report::{render_analysis, render_hash_info, render_policy, render_policy_list},
};
use log::{LevelFilter, error, warn};

const EXIT_INPUT: i32 = 2;
const EXIT_GENERATION: i32 = 3;
const EXIT_OUTPUT: i32 = 4;
const EXIT_MISMATCH: i32 = 5;

#[derive(Parser, Debug)]
#[command(
    name = "genpass",
    version,
    about = "Policy-driven password and passphrase generator and analyzer"
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Control color output (auto, always, never)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto, global = true)]
    color: ColorChoice,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate passwords that satisfy a policy
    Generate {
        #[command(flatten)]
        policy: PolicyArgs,
        /// Number of passwords to generate
        #[arg(short = 'n', long = "count", default_value_t = 1)]
        count: usize,
        /// Worker threads for large batches (defaults to available cores)
        #[arg(long = "threads")]
        threads: Option<usize>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Generate word-based passphrases
    Passphrase {
        #[command(flatten)]
        passphrase: PassphraseArgs,
        /// Number of passphrases to generate
        #[arg(short = 'n', long = "count", default_value_t = 1)]
        count: usize,
        #[arg(long = "threads")]
        threads: Option<usize>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Generate a batch of passwords or passphrases in parallel
    Batch {
        /// Number of items to generate
        count: usize,
        /// What to generate
        #[arg(long = "kind", value_enum, default_value_t = BatchKind::Password)]
        kind: BatchKind,
        #[arg(long = "threads")]
        threads: Option<usize>,
        #[command(flatten)]
        policy: PolicyArgs,
        #[command(flatten)]
        passphrase: PassphraseArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Analyze the strength of existing passwords
    Analyze(AnalyzeArgs),
    /// Inspect, validate and export policies
    #[command(subcommand)]
    Policy(PolicyCommand),
    /// Hash a password for storage
    Hash {
        password: String,
        /// md5, sha1, sha256, sha512 or pbkdf2
        #[arg(short = 'a', long = "algorithm", default_value = "pbkdf2")]
        algorithm: HashAlgorithm,
        /// Salt to use; a random one is generated when omitted
        #[arg(long = "salt")]
        salt: Option<String>,
        /// Emit the hash record as JSON
        #[arg(long = "json")]
        json: bool,
        /// Write to this file instead of stdout
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
    /// Verify a password against a stored hash
    Verify {
        password: String,
        /// JSON hash record as written by `hash --json`
        #[arg(long = "info", conflicts_with_all = ["hash", "salt"])]
        info: Option<PathBuf>,
        #[arg(long = "hash", required_unless_present = "info")]
        hash: Option<String>,
        #[arg(long = "salt", required_unless_present = "info")]
        salt: Option<String>,
        #[arg(short = 'a', long = "algorithm", default_value = "pbkdf2")]
        algorithm: HashAlgorithm,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BatchKind {
    Password,
    Passphrase,
}

#[derive(Subcommand, Debug)]
enum PolicyCommand {
    /// List the built-in complexity tiers
    List,
    /// Show the full policy for a tier
    Show {
        tier: Complexity,
        #[arg(long = "json")]
        json: bool,
    },
    /// Load and check a JSON policy file
    Validate { file: PathBuf },
    /// Write a tier's policy as JSON for editing
    Export {
        tier: Complexity,
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct PolicyArgs {
    /// Complexity tier (minimum, standard, high, maximum, military)
    #[arg(short = 'c', long = "complexity", default_value = "standard")]
    complexity: Complexity,
    /// JSON policy file; replaces the tier as the base policy
    #[arg(long = "policy-file")]
    policy_file: Option<PathBuf>,
    /// Minimum length; the maximum is raised to match if needed
    #[arg(short = 'l', long = "length")]
    length: Option<usize>,
    #[arg(long = "max-length")]
    max_length: Option<usize>,
    #[arg(long = "exclude-ambiguous")]
    exclude_ambiguous: bool,
    #[arg(long = "exclude-similar")]
    exclude_similar: bool,
    /// Do not require symbols
    #[arg(long = "no-symbols")]
    no_symbols: bool,
    /// Characters or substrings the password must not contain (repeatable)
    #[arg(long = "exclude")]
    exclude: Vec<String>,
    /// Minimum entropy in bits
    #[arg(long = "entropy-threshold")]
    entropy_threshold: Option<f64>,
}

impl PolicyArgs {
    fn resolve(&self) -> Result<Policy> {
        let mut policy = match &self.policy_file {
            Some(path) => Policy::from_json_file(path)?,
            None => Policy::for_complexity(self.complexity),
        };
        if let Some(max) = self.max_length {
            policy.max_length = max;
        }
        if let Some(length) = self.length {
            policy = policy.with_length(length);
        }
        policy.exclude_ambiguous |= self.exclude_ambiguous;
        policy.exclude_similar |= self.exclude_similar;
        if self.no_symbols {
            policy.require_symbols = false;
            policy.min_symbols = 0;
        }
        policy.custom_exclusions.extend(self.exclude.iter().cloned());
        if let Some(bits) = self.entropy_threshold {
            policy.entropy_threshold = bits;
        }
        Ok(resolve_policy(PolicySource::Explicit(policy))?)
    }
}

#[derive(Args, Debug)]
struct PassphraseArgs {
    #[arg(short = 'w', long = "words", default_value_t = 6)]
    words: usize,
    #[arg(long = "separator", default_value = "-")]
    separator: String,
    #[arg(long = "no-capitalize")]
    no_capitalize: bool,
    #[arg(long = "no-numbers")]
    no_numbers: bool,
    /// Append symbols even when the entropy target is already met
    #[arg(long = "symbols")]
    symbols: bool,
    /// Passphrase entropy target in bits
    #[arg(long = "min-entropy", default_value_t = 50.0)]
    min_entropy: f64,
}

impl PassphraseArgs {
    fn options(&self) -> PassphraseOptions {
        PassphraseOptions {
            word_count: self.words,
            separator: self.separator.clone(),
            capitalize: !self.no_capitalize,
            add_numbers: !self.no_numbers,
            add_symbols: self.symbols,
            min_entropy: self.min_entropy,
        }
    }
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output format (text, json, csv)
    #[arg(long = "format", default_value = "text")]
    format: OutputFormat,
    /// Write to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Passwords to analyze
    passwords: Vec<String>,
    /// File with one password per line ("-" for stdin)
    #[arg(short = 'f', long = "file")]
    file: Option<PathBuf>,
    /// Check compliance against this tier
    #[arg(short = 'c', long = "complexity", conflicts_with = "policy_file")]
    complexity: Option<Complexity>,
    /// Check compliance against this JSON policy file
    #[arg(long = "policy-file")]
    policy_file: Option<PathBuf>,
    /// Override mmap threshold in bytes. If zero, disable mmap.
    #[arg(long = "mmap-threshold", default_value_t = DEFAULT_MMAP_THRESHOLD_BYTES)]
    mmap_threshold: u64,
    /// Suppress the terminal report (still writes -o if given)
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
    #[command(flatten)]
    output: OutputArgs,
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

fn fail(code: i32, err: impl Display) -> ! {
    error!("{:#}", err);
    std::process::exit(code)
}

fn generation_exit_code(err: &GenerateError) -> i32 {
    match err {
        GenerateError::Configuration(_)
        | GenerateError::PolicyUnsatisfiable(_)
        | GenerateError::InvalidWordCount(_)
        | GenerateError::EmptyBatch => EXIT_INPUT,
        GenerateError::GenerationExhausted { .. }
        | GenerateError::PassphraseEntropyUnreachable { .. }
        | GenerateError::WorkerPool(_) => EXIT_GENERATION,
    }
}

fn emit_strings(items: &[String], output: &OutputArgs) {
    let res = with_output(output.output.as_deref(), |w| {
        write_strings(w, items, output.format)
    });
    if let Err(e) = res {
        fail(EXIT_OUTPUT, e);
    }
}

fn run_generate(policy: &PolicyArgs, count: usize, threads: Option<usize>, output: &OutputArgs) {
    let policy = policy.resolve().unwrap_or_else(|e| fail(EXIT_INPUT, e));
    let passwords = batch_generate(count, threads, || generate(&policy))
        .unwrap_or_else(|e| fail(generation_exit_code(&e), e));
    emit_strings(&passwords, output);
}

fn run_passphrase(
    passphrase: &PassphraseArgs,
    count: usize,
    threads: Option<usize>,
    output: &OutputArgs,
) {
    let opts = passphrase.options();
    let phrases = batch_generate(count, threads, || generate_passphrase(&opts))
        .unwrap_or_else(|e| fail(generation_exit_code(&e), e));
    emit_strings(&phrases, output);
}

fn load_analysis_inputs(args: &AnalyzeArgs) -> Result<Vec<String>> {
    let mut candidates = args.passwords.clone();
    if let Some(path) = &args.file {
        let threshold = if args.mmap_threshold == 0 {
            u64::MAX
        } else {
            args.mmap_threshold
        };
        if path == Path::new("-") {
            candidates.extend(read_candidates_from(io::stdin().lock()).context("read stdin")?);
        } else {
            candidates.extend(read_candidates(path, threshold)?);
        }
    }
    if candidates.is_empty() {
        bail!("no passwords to analyze (pass them as arguments or with -f/--file)");
    }
    Ok(candidates)
}

fn run_analyze(args: &AnalyzeArgs) {
    let candidates = load_analysis_inputs(args).unwrap_or_else(|e| fail(EXIT_INPUT, e));
    let policy = match (&args.policy_file, args.complexity) {
        (Some(path), _) => {
            Some(Policy::from_json_file(path).unwrap_or_else(|e| fail(EXIT_INPUT, e)))
        }
        (None, Some(tier)) => Some(Policy::for_complexity(tier)),
        (None, None) => None,
    };

    let analyses = Analyzer::new().analyze_all(&candidates, policy.as_ref());
    log::info!("analyzed {} passwords", analyses.len());

    let to_terminal = args.output.output.is_none() && args.output.format == OutputFormat::Text;
    if to_terminal {
        if !args.quiet {
            for a in &analyses {
                println!("{}", render_analysis(a));
            }
        }
        return;
    }
    let res = with_output(args.output.output.as_deref(), |w| {
        write_analyses(w, &analyses, args.output.format)
    });
    if let Err(e) = res {
        fail(EXIT_OUTPUT, e);
    }
}

fn run_policy(command: &PolicyCommand) {
    match command {
        PolicyCommand::List => print!("{}", render_policy_list()),
        PolicyCommand::Show { tier, json } => {
            let policy = Policy::for_complexity(*tier);
            if *json {
                let res = with_output(None, |w| write_policy_json(w, &policy));
                if let Err(e) = res {
                    fail(EXIT_OUTPUT, e);
                }
            } else {
                print!("{}", render_policy(&format!("Policy: {}", tier), &policy));
            }
        }
        PolicyCommand::Validate { file } => {
            let policy = Policy::from_json_file(file).unwrap_or_else(|e| fail(EXIT_INPUT, e));
            print!(
                "{}",
                render_policy(&format!("Policy: {}", file.display()), &policy)
            );
            println!("{}", "Policy is valid".green().bold());
        }
        PolicyCommand::Export { tier, output } => {
            let policy = Policy::for_complexity(*tier);
            let res = with_output(output.as_deref(), |w| write_policy_json(w, &policy));
            if let Err(e) = res {
                fail(EXIT_OUTPUT, e);
            }
        }
    }
}

fn write_policy_json(w: &mut dyn Write, policy: &Policy) -> Result<()> {
    serde_json::to_writer_pretty(&mut *w, policy)?;
    writeln!(w)?;
    Ok(())
}

fn run_hash(
    password: &str,
    algorithm: HashAlgorithm,
    salt: Option<&str>,
    json: bool,
    output: Option<&Path>,
) {
    if algorithm != HashAlgorithm::Pbkdf2 {
        warn!(
            "{} is a fast digest and unsuitable for storing passwords; prefer pbkdf2",
            algorithm
        );
    }
    let info = hash_password(password, algorithm, salt);
    let res = with_output(output, |w| {
        if json {
            serde_json::to_writer_pretty(&mut *w, &info)?;
            writeln!(w)?;
        } else {
            write!(w, "{}", render_hash_info(&info))?;
        }
        Ok(())
    });
    if let Err(e) = res {
        fail(EXIT_OUTPUT, e);
    }
}

fn load_hash_info(path: &Path) -> Result<HashInfo> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse hash record {}", path.display()))
}

fn run_verify(
    password: &str,
    info: Option<&Path>,
    hash: Option<&str>,
    salt: Option<&str>,
    algorithm: HashAlgorithm,
) {
    let record = match info {
        Some(path) => load_hash_info(path),
        None => match (hash, salt) {
            (Some(hash), Some(salt)) => Ok(HashInfo {
                algorithm,
                salt: salt.to_string(),
                hash: hash.to_string(),
                timestamp: chrono::Utc::now(),
                iterations: None,
            }),
            _ => Err(anyhow!("--hash and --salt are required without --info")),
        },
    }
    .unwrap_or_else(|e| fail(EXIT_INPUT, e));

    if verify_hash_info(password, &record) {
        println!("{}", "Password verified".green().bold());
    } else {
        println!("{}", "Password does not match".red().bold());
        std::process::exit(EXIT_MISMATCH);
    }
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);
    // Configure color policy
    match cli.color {
        ColorChoice::Always => {
            colored::control::set_override(true);
        }
        ColorChoice::Never => {
            colored::control::set_override(false);
        }
        ColorChoice::Auto => {}
    }

    match &cli.command {
        Command::Generate {
            policy,
            count,
            threads,
            output,
        } => run_generate(policy, *count, *threads, output),
        Command::Passphrase {
            passphrase,
            count,
            threads,
            output,
        } => run_passphrase(passphrase, *count, *threads, output),
        Command::Batch {
            count,
            kind,
            threads,
            policy,
            passphrase,
            output,
        } => match kind {
            BatchKind::Password => run_generate(policy, *count, *threads, output),
            BatchKind::Passphrase => run_passphrase(passphrase, *count, *threads, output),
        },
        Command::Analyze(args) => run_analyze(args),
        Command::Policy(command) => run_policy(command),
        Command::Hash {
            password,
            algorithm,
            salt,
            json,
            output,
        } => run_hash(
            password,
            *algorithm,
            salt.as_deref(),
            *json,
            output.as_deref(),
        ),
        Command::Verify {
            password,
            info,
            hash,
            salt,
            algorithm,
        } => run_verify(
            password,
            info.as_deref(),
            hash.as_deref(),
            salt.as_deref(),
            *algorithm,
        ),
    }
}
