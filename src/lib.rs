pub mod analysis;
pub mod batch;
pub mod charset;
pub mod entropy;
pub mod export;
pub mod generator;
pub mod hashing;
pub mod io;
pub mod passphrase;
pub mod policy;
pub mod report;
pub mod validator;
pub mod wordlist;

pub mod prelude {
    pub use crate::analysis::{Analyzer, PasswordAnalysis, StrengthLevel, analyze_password};
    pub use crate::entropy::calculate_entropy;
    pub use crate::generator::{GenerateError, generate};
    pub use crate::passphrase::{PassphraseOptions, generate_passphrase};
    pub use crate::policy::{Complexity, Policy, PolicyError, PolicySource, resolve_policy};
    pub use crate::validator::{check_compliance, is_valid};
}
