//! Deterministic global reductions.
//!
//! Every dot product and norm in the minimizer is a
//! local-partial-sum-then-global-combine: the domain is split into
//! partitions (one per worker tile), each partition accumulates its own
//! partial in index order, and the partials are combined in partition
//! order. The combination order is fixed regardless of how many threads
//! execute the partials, so repeated runs with the same partition layout
//! reduce to bit-identical scalars. Convergence tests depend on this.
//!
//! With the `parallel` feature the partials are evaluated on the rayon
//! thread pool; the combine stays sequential and ordered.

/// Sum partition partials `f(0) + f(1) + ... + f(n - 1)` in partition order.
///
/// `f(p)` must return the fully accumulated partial sum of partition `p`.
pub fn sum_over_partitions<F>(n_partitions: usize, f: F) -> f64
where
    F: Fn(usize) -> f64 + Send + Sync,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        let partials: Vec<f64> = (0..n_partitions).into_par_iter().map(f).collect();
        partials.iter().sum()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..n_partitions).map(f).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_over_partitions() {
        let total = sum_over_partitions(4, |p| (p + 1) as f64);
        assert!((total - 10.0).abs() < 1e-14);
    }

    #[test]
    fn test_empty_partition_set() {
        assert_eq!(sum_over_partitions(0, |_| 1.0), 0.0);
    }

    #[test]
    fn test_deterministic_repeat() {
        // Ill-conditioned partials: the combine order must be stable.
        let f = |p: usize| if p % 2 == 0 { 1.0e16 } else { -1.0e16 + 1.0 };
        let a = sum_over_partitions(64, f);
        let b = sum_over_partitions(64, f);
        assert_eq!(a.to_bits(), b.to_bits());
    }
}
