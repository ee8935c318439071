//! Rayon helpers for bump-and-revalue.
//!
//! Each bump builds its own market-data snapshot and revalues a pure
//! evaluator, so bumps are independent and can run on the rayon pool.

use rayon::prelude::*;
use serde::Deserialize;

/// Batch size for chunked processing.
pub const DEFAULT_BATCH_SIZE: usize = 16;

/// Minimum number of bumps before going parallel.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 8;

/// Configuration for parallel execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Batch size for chunked processing
    pub batch_size: usize,
    /// Minimum items before using parallelism
    pub parallel_threshold: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl ParallelConfig {
    /// Creates a new parallel configuration.
    pub fn new(batch_size: usize, parallel_threshold: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            parallel_threshold,
        }
    }

    /// Sequential execution regardless of size.
    pub fn sequential() -> Self {
        Self::new(DEFAULT_BATCH_SIZE, usize::MAX)
    }

    /// Returns whether to use parallel processing for the given item count.
    #[inline]
    pub fn should_parallelize(&self, n_items: usize) -> bool {
        n_items >= self.parallel_threshold
    }

    /// Maps `items` in order, in parallel batches above the threshold.
    pub fn map<T, R, F>(&self, items: &[T], mapper: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        if self.should_parallelize(items.len()) {
            process_in_batches(items, self.batch_size, |batch| batch.iter().map(&mapper).collect::<Vec<_>>())
                .into_iter()
                .flatten()
                .collect()
        } else {
            items.iter().map(mapper).collect()
        }
    }
}

/// Processes items in parallel batches, one result per batch, in order.
pub fn process_in_batches<T, R, F>(items: &[T], batch_size: usize, processor: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&[T]) -> R + Sync + Send,
{
    items.par_chunks(batch_size.max(1)).map(processor).collect()
}

/// Parallel map preserving order.
pub fn parallel_map<T, R, F>(items: &[T], mapper: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    items.par_iter().map(mapper).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_in_batches() {
        let items: Vec<i32> = (0..100).collect();
        let sums: Vec<i32> = process_in_batches(&items, 10, |batch| batch.iter().sum());

        assert_eq!(sums.len(), 10);
        assert_eq!(sums.iter().sum::<i32>(), (0..100).sum());
    }

    #[test]
    fn test_parallel_map() {
        let items: Vec<i32> = (0..100).collect();
        let doubled: Vec<i32> = parallel_map(&items, |&x| x * 2);

        assert_eq!(doubled.len(), 100);
        assert_eq!(doubled[50], 100);
    }

    #[test]
    fn test_config_map_preserves_order_both_ways() {
        let items: Vec<usize> = (0..37).collect();
        let parallel = ParallelConfig::new(4, 1).map(&items, |&x| x * x);
        let sequential = ParallelConfig::sequential().map(&items, |&x| x * x);
        assert_eq!(parallel, sequential);
        assert_eq!(parallel[36], 1296);
    }

    #[test]
    fn test_should_parallelize() {
        let config = ParallelConfig::default();
        assert!(!config.should_parallelize(DEFAULT_PARALLEL_THRESHOLD - 1));
        assert!(config.should_parallelize(DEFAULT_PARALLEL_THRESHOLD));
        assert!(!ParallelConfig::sequential().should_parallelize(1_000_000));
    }

    #[test]
    fn test_batch_size_floor() {
        assert_eq!(ParallelConfig::new(0, 10).batch_size, 1);
    }
}
