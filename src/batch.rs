//! Batch generation. Small batches run inline; larger ones fan out over a
//! bounded rayon pool. Items share no state beyond the OS random source.
use rayon::prelude::*;

use crate::generator::GenerateError;

/// Batches at or below this size are generated on the calling thread.
pub const PARALLEL_THRESHOLD: usize = 10;

/// Worker count for a batch of `count` items.
pub fn pool_size(count: usize, threads: Option<usize>) -> usize {
    let available = threads.filter(|&t| t > 0).unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
    });
    available.min(count).max(1)
}

/// Run `job` `count` times and collect the results in order. The first
/// failure is returned as-is; nothing is retried here.
pub fn batch_generate<F>(
    count: usize,
    threads: Option<usize>,
    job: F,
) -> Result<Vec<String>, GenerateError>
where
    F: Fn() -> Result<String, GenerateError> + Send + Sync,
{
    if count == 0 {
        return Err(GenerateError::EmptyBatch);
    }
    if count <= PARALLEL_THRESHOLD {
        log::debug!("generating {} items inline", count);
        return (0..count).map(|_| job()).collect();
    }
    let workers = pool_size(count, threads);
    log::debug!("generating {} items on {} workers", count, workers);
    let pool = rayon::ThreadPoolBuilder::new().num_threads(workers).build()?;
    pool.install(|| (0..count).into_par_iter().map(|_| job()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::generate;
    use crate::passphrase::{PassphraseOptions, generate_passphrase};
    use crate::policy::{Complexity, Policy};
    use crate::validator::is_valid;

    #[test]
    fn pool_is_bounded_by_count_and_threads() {
        assert_eq!(pool_size(3, Some(8)), 3);
        assert_eq!(pool_size(100, Some(2)), 2);
        assert!(pool_size(100, None) >= 1);
        assert_eq!(pool_size(5, Some(0)), pool_size(5, None));
    }

    #[test]
    fn zero_count_is_rejected() {
        assert!(matches!(
            batch_generate(0, None, || Ok(String::new())),
            Err(GenerateError::EmptyBatch)
        ));
    }

    #[test]
    fn parallel_batch_yields_valid_passwords() {
        let policy = Policy::for_complexity(Complexity::High);
        let out = batch_generate(40, Some(4), || generate(&policy)).unwrap();
        assert_eq!(out.len(), 40);
        assert!(out.iter().all(|pw| is_valid(pw, &policy)));
    }

    #[test]
    fn inline_batch_of_passphrases() {
        let opts = PassphraseOptions::default();
        let out = batch_generate(5, None, || generate_passphrase(&opts)).unwrap();
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn first_error_is_surfaced() {
        let bad = Policy {
            min_length: 2,
            ..Policy::default()
        };
        let err = batch_generate(20, Some(2), || generate(&bad)).unwrap_err();
        assert!(matches!(err, GenerateError::Configuration(_)));
    }
}
