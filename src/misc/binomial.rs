use std::collections::HashMap;

use nalgebra::RealField;

/// Returns the binomial coefficient of `n` and `k`.
/// # Example
/// ```
/// use nurbs_core::prelude::binomial;
/// assert_eq!(binomial(8, 4), 70.);
/// assert_eq!(binomial(8, 0), 1.);
/// assert_eq!(binomial(3, 5), 0.);
/// ```
pub fn binomial(n: usize, k: usize) -> f64 {
    if k == 0 || k == n {
        return 1.;
    } else if n == 0 || k > n {
        return 0.;
    }

    let k = k.min(n - k);
    let mut r = 1.;
    for i in 0..k {
        r = r * (n - i) as f64 / (i + 1) as f64;
    }
    r
}

/// A memoized binomial coefficient calculator.
/// The memo lives as long as the calculator, so a derivative evaluation creates one,
/// uses it inside its loops and drops it. No state is shared between calls.
#[derive(Debug, Clone, Default)]
pub struct Binomial<T> {
    memo: HashMap<(usize, usize), T>,
}

impl<T: RealField + Copy> Binomial<T> {
    pub fn new() -> Self {
        Self {
            memo: HashMap::new(),
        }
    }

    /// Returns the binomial coefficient of `n` and `k` with memoization.
    pub fn get(&mut self, n: usize, k: usize) -> T {
        if k == 0 || k == n {
            return T::one();
        } else if n == 0 || k > n {
            return T::zero();
        }

        let k = k.min(n - k);

        if let Some(memoized) = self.memo.get(&(n, k)) {
            return *memoized;
        }

        let r = self.get(n - 1, k) + self.get(n - 1, k - 1);
        self.memo.insert((n, k), r);
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binomial() {
        assert_eq!(binomial(5, 0), 1.);
        assert_eq!(binomial(5, 1), 5.);
        assert_eq!(binomial(5, 2), 10.);
        assert_eq!(binomial(5, 3), 10.);
        assert_eq!(binomial(5, 4), 5.);
        assert_eq!(binomial(5, 5), 1.);
        assert_eq!(binomial(5, 6), 0.);
        assert_eq!(binomial(0, 0), 1.);
        assert_eq!(binomial(0, 2), 0.);
        assert_eq!(binomial(8, 4), 70.);
    }

    #[test]
    fn binomial_symmetry() {
        for n in 0..16 {
            assert_eq!(binomial(n, 0), 1.);
            for k in 0..=n {
                assert_eq!(binomial(n, k), binomial(n, n - k));
            }
        }
    }

    #[test]
    fn test_memoized_binomial() {
        let mut memoized = Binomial::<f64>::new();
        for n in 1..10 {
            for k in 0..=n + 1 {
                assert_eq!(memoized.get(n, k), binomial(n, k));
            }
        }
    }
}
