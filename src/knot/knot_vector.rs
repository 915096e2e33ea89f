use std::ops::Index;

use nalgebra::convert;
use simba::scalar::SupersetOf;

use crate::misc::{FloatingPoint, Invertible};

use super::KnotMultiplicity;

/// Knot vector representation
/// A non-decreasing sequence of parameters. The vector is a value: every operation
/// that changes the knots returns a new vector or works on an owned one.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KnotVector<T>(Vec<T>);

impl<T: FloatingPoint> KnotVector<T> {
    pub fn new(knots: Vec<T>) -> Self {
        Self(knots)
    }

    /// Generate a knot vector for `n` control points with a given degree
    /// `clamped` selects between a clamped and an unclamped uniform knot vector
    /// # Example
    /// ```
    /// use nurbs_core::prelude::KnotVector;
    /// let knots = KnotVector::<f64>::try_generate(2, 5, true).unwrap();
    /// assert_eq!(knots.len(), 5 + 2 + 1);
    /// assert!(knots.is_clamped(2));
    /// ```
    pub fn try_generate(degree: usize, n: usize, clamped: bool) -> anyhow::Result<Self> {
        if clamped {
            Self::try_clamped(degree, n)
        } else {
            Self::try_unclamped(degree, n)
        }
    }

    /// Create a clamped uniform knot vector over [0, 1]
    /// the first and last knots are repeated `degree + 1` times
    /// # Example
    /// ```
    /// use nurbs_core::prelude::KnotVector;
    /// let knots = KnotVector::<f64>::try_clamped(3, 6).unwrap();
    /// assert_eq!(
    ///     knots.to_vec(),
    ///     vec![0., 0., 0., 0., 1. / 3., 2. / 3., 1., 1., 1., 1.]
    /// );
    /// ```
    pub fn try_clamped(degree: usize, n: usize) -> anyhow::Result<Self> {
        ensure_generation_parameters(degree, n)?;
        anyhow::ensure!(
            n > degree,
            "Too few control points for a clamped knot vector: {} control points with degree {}",
            n,
            degree
        );

        let spans = n - degree;
        let inv = T::one() / T::from_usize(spans).unwrap();
        let mut knots = vec![T::zero(); degree + 1];
        knots.extend((1..spans).map(|i| T::from_usize(i).unwrap() * inv));
        knots.extend(std::iter::repeat_n(T::one(), degree + 1));
        Ok(Self(knots))
    }

    /// Create an unclamped uniform knot vector
    /// `n + degree + 1` equally spaced knots over [0, 1] without repeated ends
    pub fn try_unclamped(degree: usize, n: usize) -> anyhow::Result<Self> {
        ensure_generation_parameters(degree, n)?;

        let m = n + degree;
        let inv = T::one() / T::from_usize(m).unwrap();
        Ok((0..=m).map(|i| T::from_usize(i).unwrap() * inv).collect())
    }

    /// Create a periodic uniform knot vector
    /// the knots inside the domain run `0, d, 2d, ...` with `d = 1 / (n - degree)`
    /// and `degree` knots extend below 0 (and above 1) with the same step
    /// # Example
    /// ```
    /// use nurbs_core::prelude::KnotVector;
    /// let knots = KnotVector::<f64>::try_periodic(2, 4).unwrap();
    /// assert_eq!(knots.to_vec(), vec![-1., -0.5, 0., 0.5, 1., 1.5, 2.]);
    /// assert!(knots.is_periodic(2));
    /// ```
    pub fn try_periodic(degree: usize, n: usize) -> anyhow::Result<Self> {
        ensure_generation_parameters(degree, n)?;
        anyhow::ensure!(
            degree >= 2,
            "Degree must be at least 2 for a periodic knot vector, got {}",
            degree
        );
        anyhow::ensure!(
            n > degree,
            "Too few control points for a periodic knot vector: {} control points with degree {}",
            n,
            degree
        );

        let delta = T::one() / T::from_usize(n - degree).unwrap();
        let offset = degree as isize;
        Ok((0..(n + degree + 1))
            .map(|i| T::from_isize(i as isize - offset).unwrap() * delta)
            .collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.0.clone()
    }

    /// First knot
    /// # Panics
    /// Panics if the knot vector is empty.
    pub fn first(&self) -> T {
        self.0[0]
    }

    /// Last knot
    /// # Panics
    /// Panics if the knot vector is empty.
    pub fn last(&self) -> T {
        self.0[self.0.len() - 1]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    /// Get the domain of the knot vector by degree
    /// # Panics
    /// Panics if the knot vector has no more than `degree` knots.
    pub fn domain(&self, degree: usize) -> (T, T) {
        (self.0[degree], self.0[self.0.len() - 1 - degree])
    }

    /// Length of the whole knot range (last - first)
    /// # Panics
    /// Panics if the knot vector is empty.
    pub fn interval(&self) -> T {
        self.last() - self.first()
    }

    /// Clamp `u` to the domain
    /// # Panics
    /// Panics if the knot vector has no more than `degree` knots.
    pub fn clamp(&self, degree: usize, u: T) -> T {
        let (min, max) = self.domain(degree);
        u.clamp(min, max)
    }

    /// Check if the knot vector is valid for a curve with `n` control points
    /// # Example
    /// ```
    /// use nurbs_core::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 2., 2.]);
    /// assert!(knots.is_valid(2, 4));
    /// assert!(!knots.is_valid(2, 5));
    /// assert!(!KnotVector::new(vec![0., 0., 0., 2., 1., 2., 2.]).is_valid(2, 4));
    /// ```
    pub fn is_valid(&self, degree: usize, n: usize) -> bool {
        if self.is_empty() {
            return false;
        }
        if self.len() < (degree + 1) * 2 {
            return false;
        }
        if n + degree + 1 != self.len() {
            return false;
        }
        if self.iter().any(|k| !k.is_finite()) {
            return false;
        }

        let eps = T::epsilon_tolerance();
        if self.0.windows(2).any(|w| w[1] < w[0] - eps) {
            return false;
        }

        let (first, last) = (self.first(), self.last());
        if self.multiplicity_of(first) > 1
            && self.0[..=degree].iter().any(|k| (*k - first).abs() > eps)
        {
            return false;
        }
        if self.multiplicity_of(last) > 1
            && self.0[self.len() - degree - 1..]
                .iter()
                .any(|k| (*k - last).abs() > eps)
        {
            return false;
        }

        true
    }

    /// Check if the knot vector is clamped
    /// `clamped` means the first and last `degree + 1` knots are equal
    /// e.g. [0, 0, 0, 1, 2, 3, 3, 3] with degree 2 is clamped
    pub fn is_clamped(&self, degree: usize) -> bool {
        if self.len() < degree + 1 {
            return false;
        }
        let eps = T::epsilon_tolerance();
        let (first, last) = (self.first(), self.last());
        let head = self.0[..=degree].iter().all(|k| (*k - first).abs() <= eps);
        let tail = self.0[self.len() - degree - 1..]
            .iter()
            .all(|k| (*k - last).abs() <= eps);
        head && tail
    }

    /// Check if the knot vector has a periodic layout
    /// the head knots lie at or below 0 and the tail knots are not all below 1
    /// # Example
    /// ```
    /// use nurbs_core::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![-2., -1., 0., 1., 2., 3., 4.]);
    /// assert!(knots.is_periodic(2));
    /// assert!(!KnotVector::new(vec![0., 0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).is_periodic(2));
    /// ```
    pub fn is_periodic(&self, degree: usize) -> bool {
        if self.len() <= degree {
            return false;
        }
        let eps = T::epsilon_tolerance();
        let len = self.len();
        let head = self.0[0] <= self.0[degree] + eps && self.0[degree] <= eps;
        let tail_inside = self.0[len - degree - 1] < self.0[len - 1] - eps
            && self.0[len - 1] < T::one() - eps;
        head && !tail_inside
    }

    /// Find the knot span index by binary search
    /// `n` is the index of the last control point (`# of control points - 1`).
    /// Parameters at or beyond the domain ends are clamped to the first or last span.
    ///
    /// # Example
    /// ```
    /// use nurbs_core::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// let idx = knots.find_knot_span_index(4, 2, 2.5);
    /// assert_eq!(idx, 4);
    /// ```
    pub fn find_knot_span_index(&self, n: usize, degree: usize, u: T) -> usize {
        let eps = T::epsilon_tolerance();
        if u > self[n + 1] - eps {
            return n;
        }

        if u < self[degree] + eps {
            return degree;
        }

        // binary search
        let mut low = degree;
        let mut high = n + 1;
        let mut mid = (low + high) / 2;
        while u < self[mid] || self[mid + 1] <= u {
            if u < self[mid] {
                high = mid;
            } else {
                low = mid;
            }
            let next = (low + high) / 2;
            if mid == next {
                break;
            }
            mid = next;
        }

        mid
    }

    /// Get the multiplicity of each knot in ascending order
    /// # Example
    /// ```
    /// use nurbs_core::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// let knot_multiplicity = knots.multiplicity();
    /// assert_eq!(knot_multiplicity[0].multiplicity(), 3);
    /// assert_eq!(knot_multiplicity[1].multiplicity(), 1);
    /// assert_eq!(knot_multiplicity[2].multiplicity(), 1);
    /// assert_eq!(knot_multiplicity[3].multiplicity(), 3);
    /// ```
    pub fn multiplicity(&self) -> Vec<KnotMultiplicity<T>> {
        let Some(head) = self.0.first() else {
            return vec![];
        };

        let eps = T::epsilon_tolerance();
        let mut mult = vec![];
        let mut current = KnotMultiplicity::new(*head, 0);
        self.0.iter().for_each(|knot| {
            if (*knot - *current.knot()).abs() > eps {
                mult.push(current.clone());
                current = KnotMultiplicity::new(*knot, 0);
            }
            current.increment_multiplicity();
        });
        mult.push(current);

        mult
    }

    /// Count the knots equal to `value` within the tolerance
    pub fn multiplicity_of(&self, value: T) -> usize {
        let eps = T::epsilon_tolerance();
        self.iter().filter(|k| (**k - value).abs() <= eps).count()
    }

    /// Get the multiplicity of the knot stored at `index`
    /// # Example
    /// ```
    /// use nurbs_core::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 3., 3.]);
    /// assert_eq!(knots.try_multiplicity_at(7).unwrap(), 3);
    /// assert!(knots.try_multiplicity_at(8).is_err());
    /// ```
    pub fn try_multiplicity_at(&self, index: usize) -> anyhow::Result<usize> {
        anyhow::ensure!(
            index < self.len(),
            "Index {} is out of range of the knot vector of length {}",
            index,
            self.len()
        );
        Ok(self.multiplicity_of(self.0[index]))
    }

    /// Rescale the knots to [0, 1]
    /// # Example
    /// ```
    /// use nurbs_core::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![-5., -5., -3., -2., 2., 3., 5., 5.]);
    /// let normalized = knots.try_normalize().unwrap();
    /// assert_eq!(normalized.first(), 0.);
    /// assert_eq!(normalized.last(), 1.);
    /// ```
    pub fn try_normalize(&self) -> anyhow::Result<Self> {
        anyhow::ensure!(!self.is_empty(), "Cannot normalize an empty knot vector");
        let first = self.first();
        let interval = self.interval();
        anyhow::ensure!(
            interval > T::epsilon_tolerance(),
            "Cannot normalize a knot vector without extent: [{}, {}]",
            first,
            self.last()
        );
        Ok(self.iter().map(|k| (*k - first) / interval).collect())
    }

    /// Cast the knot vector to another floating point type
    /// # Example
    /// ```
    /// use nurbs_core::prelude::*;
    /// let knots: KnotVector<f64> = KnotVector::new(vec![1., 2., 3., 4., 5., 6.]);
    /// let knots2 = knots.cast::<f32>();
    /// assert_eq!(knots2.first(), 1.0);
    /// ```
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> KnotVector<F> {
        KnotVector::new(self.0.iter().map(|v| convert(*v)).collect())
    }
}

fn ensure_generation_parameters(degree: usize, n: usize) -> anyhow::Result<()> {
    anyhow::ensure!(degree > 0, "Degree must be greater than 0");
    anyhow::ensure!(n > 0, "Number of control points must be greater than 0");
    Ok(())
}

impl<T> Index<usize> for KnotVector<T> {
    type Output = T;
    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> FromIterator<T> for KnotVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: FloatingPoint> Invertible for KnotVector<T> {
    /// Reverses the knot vector
    /// the gaps between successive knots are taken in reverse order, starting from the first knot
    /// # Example
    /// ```
    /// use nurbs_core::prelude::*;
    /// let mut knot = KnotVector::new(vec![0., 0., 0., 1., 2., 2.5, 3.5, 4.0, 4.0]);
    /// knot.invert();
    ///
    /// let dst = vec![0.0, 0.0, 0.5, 1.5, 2.0, 3.0, 4.0, 4.0, 4.0];
    /// knot.iter().enumerate().for_each(|(i, v)| {
    ///     assert_eq!(*v, dst[i]);
    /// });
    /// ```
    fn invert(&mut self) {
        let Some(min) = self.0.first() else {
            return;
        };

        let mut next = vec![*min];
        let len = self.len();
        for i in 1..len {
            next.push(next[i - 1] + (self[len - i] - self[len - i - 1]));
        }

        self.0 = next;
    }
}
