use crate::misc::FloatingPoint;

use super::KnotVector;

impl<T: FloatingPoint> KnotVector<T> {
    /// Compute the non-vanishing basis functions
    /// Returns the `degree + 1` values `N[span - degree..=span]` at `u`
    /// # Example
    /// ```
    /// use nurbs_core::prelude::KnotVector;
    /// let knots = KnotVector::new(vec![0., 0., 0., 1., 2., 3., 4., 4., 5., 5., 5.]);
    /// let span = knots.find_knot_span_index(7, 2, 2.5);
    /// let basis = knots.basis_functions(span, 2.5, 2);
    /// assert_eq!(basis, vec![1. / 8., 6. / 8., 1. / 8.]);
    /// ```
    pub fn basis_functions(&self, knot_span_index: usize, u: T, degree: usize) -> Vec<T> {
        let mut basis_functions = vec![T::zero(); degree + 1];
        let mut left = vec![T::zero(); degree + 1];
        let mut right = vec![T::zero(); degree + 1];

        basis_functions[0] = T::one();

        for j in 1..=degree {
            left[j] = u - self[knot_span_index + 1 - j];
            right[j] = self[knot_span_index + j] - u;
            let mut saved = T::zero();

            for r in 0..j {
                let temp = basis_functions[r] / (right[r + 1] + left[j - r]);
                basis_functions[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }

            basis_functions[j] = saved;
        }

        basis_functions
    }

    /// Compute a single basis function `N(index, degree)` at `u`
    /// Used when only one column of a basis matrix is needed
    pub fn one_basis_function(&self, index: usize, u: T, degree: usize) -> T {
        let eps = T::epsilon_tolerance();
        let m = self.len() - 1;

        if (index == 0 && (u - self.first()).abs() <= eps)
            || (index + degree + 1 == m && (u - self.last()).abs() <= eps)
        {
            return T::one();
        }

        // local support
        if index + degree + 1 > m || u < self[index] || u >= self[index + degree + 1] {
            return T::zero();
        }

        // degree zero functions
        let mut n: Vec<T> = (0..=degree)
            .map(|j| {
                if u >= self[index + j] && u < self[index + j + 1] {
                    T::one()
                } else {
                    T::zero()
                }
            })
            .collect();

        for k in 1..=degree {
            let mut saved = if n[0] == T::zero() {
                T::zero()
            } else {
                ((u - self[index]) * n[0]) / (self[index + k] - self[index])
            };

            for j in 0..(degree - k + 1) {
                let u_left = self[index + j + 1];
                let u_right = self[index + j + k + 1];
                if n[j + 1] == T::zero() {
                    n[j] = saved;
                    saved = T::zero();
                } else {
                    let temp = n[j + 1] / (u_right - u_left);
                    n[j] = saved + (u_right - u) * temp;
                    saved = (u - u_left) * temp;
                }
            }
        }

        n[0]
    }

    /// Compute the non-vanishing basis functions and their derivatives
    /// 2d array of basis and derivative values of size (n+1, p+1)
    /// The kth row is the kth derivative and the first row is made up of the basis function values.
    /// Rows above `degree` are zero.
    pub fn derivative_basis_functions(
        &self,
        knot_index: usize,
        u: T,
        degree: usize,
        n: usize,
    ) -> Vec<Vec<T>> {
        let mut ndu = vec![vec![T::zero(); degree + 1]; degree + 1];
        let mut left = vec![T::zero(); degree + 1];
        let mut right = vec![T::zero(); degree + 1];

        ndu[0][0] = T::one();

        for j in 1..=degree {
            left[j] = u - self[knot_index + 1 - j];
            right[j] = self[knot_index + j] - u;

            let mut saved = T::zero();
            for r in 0..j {
                // lower triangle
                ndu[j][r] = right[r + 1] + left[j - r];
                let temp = ndu[r][j - 1] / ndu[j][r];

                // upper triangle
                ndu[r][j] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            ndu[j][j] = saved;
        }

        let mut ders = vec![vec![T::zero(); degree + 1]; n + 1];
        let mut a = vec![vec![T::zero(); degree + 1]; 2];

        // load the basis functions
        for j in 0..=degree {
            ders[0][j] = ndu[j][degree];
        }

        let idegree = degree as isize;
        let du = n.min(degree) as isize;

        // compute the derivatives
        for r in 0..=idegree {
            // alternate rows in array a
            let mut s1 = 0;
            let mut s2 = 1;
            a[0][0] = T::one();

            // loop to compute the kth derivative
            for k in 1..=du {
                let mut d = T::zero();
                let rk = r - k;
                let pk = idegree - k;

                if r >= k {
                    a[s2][0] = a[s1][0] / ndu[(pk + 1) as usize][rk as usize];
                    d = a[s2][0] * ndu[rk as usize][pk as usize];
                }

                let j1 = if rk >= -1 { 1 } else { -rk };
                let j2 = if r - 1 <= pk { k - 1 } else { idegree - r };

                for j in j1..=j2 {
                    let uj = j as usize;
                    a[s2][uj] = (a[s1][uj] - a[s1][uj - 1]) / ndu[(pk + 1) as usize][(rk + j) as usize];
                    d += a[s2][uj] * ndu[(rk + j) as usize][pk as usize];
                }

                let uk = k as usize;
                let ur = r as usize;
                if r <= pk {
                    a[s2][uk] = -a[s1][uk - 1] / ndu[(pk + 1) as usize][ur];
                    d += a[s2][uk] * ndu[ur][pk as usize];
                }

                ders[uk][ur] = d;

                // switch rows
                std::mem::swap(&mut s1, &mut s2);
            }
        }

        // multiply through by the falling factorial p * (p - 1) * ... * (p - k + 1)
        let mut acc = idegree;
        for k in 1..=du {
            for j in 0..=degree {
                ders[k as usize][j] *= T::from_isize(acc).unwrap();
            }
            acc *= idegree - k;
        }
        ders
    }
}
