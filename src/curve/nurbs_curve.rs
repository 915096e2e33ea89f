use nalgebra::allocator::Allocator;
use nalgebra::{Const, DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, OVector, U1};
use simba::scalar::SupersetOf;

use crate::homogeneous::{dehomogenize, dehomogenize_1d, homogenize, rational_1d, weights};
use crate::knot::KnotVector;
use crate::misc::{Binomial, FloatingPoint, Invertible};

/// NURBS curve representation
/// By generics, it can be used for 2D or 3D curves with f32 or f64 scalar types
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(bound(
        serialize = "T: serde::Serialize, OPoint<T, D>: serde::Serialize",
        deserialize = "T: serde::Deserialize<'de>, OPoint<T, D>: serde::Deserialize<'de>"
    ))
)]
pub struct NurbsCurve<T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
{
    /// control points with homogeneous coordinates
    /// the last element of the vector is the `weight`
    control_points: Vec<OPoint<T, D>>,
    degree: usize,
    /// knot vector for the NURBS curve
    /// the length of the knot vector is equal to the `# of control points + degree + 1`
    knots: KnotVector<T>,
}

/// 2D NURBS curve alias
pub type NurbsCurve2D<T> = NurbsCurve<T, Const<3>>;

/// 3D NURBS curve alias
pub type NurbsCurve3D<T> = NurbsCurve<T, Const<4>>;

impl<T: FloatingPoint, D: DimName> NurbsCurve<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    /// Create a new NURBS curve from homogeneous control points
    /// # Failures
    /// - if the degree is zero
    /// - if the number of control points is less than or equal to the degree
    /// - if the knot vector is not valid for the degree and the number of control points
    ///
    /// # Example
    /// ```
    /// use nurbs_core::prelude::*;
    /// use nalgebra::Point3;
    ///
    /// let w = 1.; // weight for each control points
    /// let control_points: Vec<Point3<f64>> = vec![
    ///     Point3::new(50., 50., w),
    ///     Point3::new(30., 370., w),
    ///     Point3::new(180., 350., w),
    ///     Point3::new(150., 100., w),
    ///     Point3::new(250., 50., w),
    ///     Point3::new(350., 100., w),
    ///     Point3::new(470., 400., w),
    /// ];
    /// let degree = 3;
    /// let m = control_points.len() + degree + 1;
    /// // create an uniform knot vector
    /// let knots = (0..m).map(|i| i as f64).collect();
    /// let nurbs = NurbsCurve2D::try_new(degree, control_points, knots);
    /// assert!(nurbs.is_ok());
    /// ```
    pub fn try_new(
        degree: usize,
        control_points: Vec<OPoint<T, D>>,
        knots: Vec<T>,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(degree > 0, "Degree must be greater than 0");
        anyhow::ensure!(
            control_points.len() > degree,
            "Too few control points for curve: {} control points with degree {}",
            control_points.len(),
            degree
        );
        anyhow::ensure!(
            knots.len() == control_points.len() + degree + 1,
            "Invalid number of knots, got {}, expected {}",
            knots.len(),
            control_points.len() + degree + 1
        );

        let knots = KnotVector::new(knots);
        anyhow::ensure!(
            knots.is_valid(degree, control_points.len()),
            "Invalid knot vector for degree {}: {:?}",
            degree,
            knots.as_slice()
        );

        Ok(Self {
            degree,
            control_points,
            knots,
        })
    }

    /// Create a new NURBS curve without validation
    pub(crate) fn new_unchecked(
        degree: usize,
        control_points: Vec<OPoint<T, D>>,
        knots: KnotVector<T>,
    ) -> Self {
        Self {
            degree,
            control_points,
            knots,
        }
    }

    /// Create a new NURBS curve from plain points and their weights
    /// Points beyond the end of `weights` get the weight 1.
    /// # Example
    /// ```
    /// use nurbs_core::prelude::*;
    /// use nalgebra::Point3;
    /// use approx::assert_relative_eq;
    ///
    /// let points = vec![
    ///     Point3::new(-10., 15., 5.),
    ///     Point3::new(10., 5., 5.),
    ///     Point3::new(20., 0., 0.),
    /// ];
    /// let curve = NurbsCurve3D::try_from_weighted(
    ///     2,
    ///     &points,
    ///     &[],
    ///     vec![0., 0., 0., 1., 1., 1.],
    /// ).unwrap();
    /// assert_relative_eq!(curve.point_at(0.5), Point3::new(7.5, 6.25, 3.75));
    /// ```
    pub fn try_from_weighted(
        degree: usize,
        points: &[OPoint<T, DimNameDiff<D, U1>>],
        weights: &[T],
        knots: Vec<T>,
    ) -> anyhow::Result<Self>
    where
        D: DimNameSub<U1>,
        DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
    {
        let control_points = homogenize(points, weights)?;
        Self::try_new(degree, control_points, knots)
    }

    /// Create a degree 1 curve passing through the points
    /// the knots are spaced by the chord length between the points
    pub fn try_polyline(
        points: &[OPoint<T, DimNameDiff<D, U1>>],
        normalize_knots: bool,
    ) -> anyhow::Result<Self>
    where
        D: DimNameSub<U1>,
        DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
    {
        anyhow::ensure!(points.len() >= 2, "Too few points for a polyline");

        let mut knots = vec![T::zero(), T::zero()];
        let mut acc = T::zero();
        for pair in points.windows(2) {
            acc += (&pair[1] - &pair[0]).norm();
            knots.push(acc);
        }
        knots.push(acc);

        if normalize_knots && acc > T::zero() {
            knots.iter_mut().for_each(|k| *k /= acc);
        }

        Self::try_from_weighted(1, points, &[], knots)
    }

    /// Create a dehomogenized version of the curve
    pub fn dehomogenize(&self) -> NurbsCurve<T, DimNameDiff<D, U1>>
    where
        D: DimNameSub<U1>,
        DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
    {
        NurbsCurve {
            degree: self.degree,
            control_points: self.dehomogenized_control_points(),
            knots: self.knots.clone(),
        }
    }

    /// Return the dehomogenized control points
    pub fn dehomogenized_control_points(&self) -> Vec<OPoint<T, DimNameDiff<D, U1>>>
    where
        D: DimNameSub<U1>,
        DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
    {
        dehomogenize_1d(&self.control_points)
    }

    pub fn weights(&self) -> Vec<T> {
        weights(&self.control_points)
    }

    /// Evaluate the curve at a given parameter to get a dehomonogenized point
    pub fn point_at(&self, t: T) -> OPoint<T, DimNameDiff<D, U1>>
    where
        D: DimNameSub<U1>,
        DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
    {
        let p = self.point(t);
        dehomogenize(&p)
    }

    /// Sample the curve at a given number of points between the start and end parameters
    pub fn sample_regular_range(
        &self,
        start: T,
        end: T,
        samples: usize,
    ) -> Vec<OPoint<T, DimNameDiff<D, U1>>>
    where
        D: DimNameSub<U1>,
        DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
    {
        if samples < 2 {
            return vec![self.point_at(start)];
        }
        let us = T::from_usize(samples).unwrap();
        let step = (end - start) / (us - T::one());
        (0..samples)
            .map(|i| self.point_at(start + T::from_usize(i).unwrap() * step))
            .collect()
    }

    /// Evaluate the curve at a given parameter to get a point in homogeneous coordinates
    pub fn point(&self, t: T) -> OPoint<T, D> {
        let n = self.knots.len() - self.degree - 2;
        let knot_span_index = self.knots.find_knot_span_index(n, self.degree, t);
        let basis = self.knots.basis_functions(knot_span_index, t, self.degree);
        let mut position = OPoint::<T, D>::origin();
        for i in 0..=self.degree {
            position.coords +=
                &self.control_points[knot_span_index - self.degree + i].coords * basis[i];
        }
        position
    }

    /// Evaluate the curve at a given parameter to get a tangent vector
    pub fn tangent_at(&self, u: T) -> OVector<T, DimNameDiff<D, U1>>
    where
        D: DimNameSub<U1>,
        DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
    {
        let deriv = self.rational_derivatives(u, 1);
        deriv[1].clone()
    }

    /// Evaluate the rational derivatives at a given parameter
    /// the first element is the point itself, the kth element is the kth derivative
    pub fn rational_derivatives(&self, u: T, derivs: usize) -> Vec<OVector<T, DimNameDiff<D, U1>>>
    where
        D: DimNameSub<U1>,
        DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
    {
        let ders = self.derivatives(u, derivs);
        let a_ders = rational_1d(&ders);
        let w_ders: Vec<_> = ders.iter().map(|d| d[D::dim() - 1]).collect();

        let mut ck: Vec<OVector<T, DimNameDiff<D, U1>>> = Vec::with_capacity(derivs + 1);
        let mut binom = Binomial::<T>::new();
        for k in 0..=derivs {
            let mut v = a_ders[k].clone();

            for i in 1..=k {
                let coef = binom.get(k, i) * w_ders[i];
                v -= &ck[k - i] * coef;
            }

            ck.push(v / w_ders[0]);
        }
        ck
    }

    /// Evaluate the derivatives of the homogeneous curve at a given parameter
    /// derivatives above the degree are zero vectors
    pub fn derivatives(&self, u: T, derivs: usize) -> Vec<OVector<T, D>> {
        let n = self.knots.len() - self.degree - 2;

        let du = derivs.min(self.degree);
        let mut derivatives = vec![OVector::<T, D>::zeros(); derivs + 1];

        let knot_span_index = self.knots.find_knot_span_index(n, self.degree, u);
        let nders = self
            .knots
            .derivative_basis_functions(knot_span_index, u, self.degree, du);
        for k in 0..=du {
            for j in 0..=self.degree {
                derivatives[k] +=
                    &self.control_points[knot_span_index - self.degree + j].coords * nders[k][j];
            }
        }

        derivatives
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn knots(&self) -> &KnotVector<T> {
        &self.knots
    }

    pub fn control_points(&self) -> &Vec<OPoint<T, D>> {
        &self.control_points
    }

    pub fn control_points_iter(&self) -> impl Iterator<Item = &OPoint<T, D>> {
        self.control_points.iter()
    }

    pub fn knots_domain(&self) -> (T, T) {
        self.knots.domain(self.degree)
    }

    pub fn knots_domain_interval(&self) -> T {
        let (d0, d1) = self.knots_domain();
        d1 - d0
    }

    /// Check if the curve is clamped
    pub fn is_clamped(&self) -> bool {
        self.knots.is_clamped(self.degree)
    }

    /// Try to refine the curve by inserting knots
    /// `knots_to_insert` must be sorted and may repeat a value to insert it several times.
    /// The returned curve traces the same geometry with a denser knot vector.
    /// # Example
    /// ```
    /// use nurbs_core::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    ///
    /// let points = vec![
    ///     Point2::new(0., 0.),
    ///     Point2::new(1., 2.),
    ///     Point2::new(3., 2.),
    ///     Point2::new(4., 0.),
    /// ];
    /// let curve = NurbsCurve2D::try_from_weighted(
    ///     2,
    ///     &points,
    ///     &[1., 0.5, 2.],
    ///     vec![0., 0., 0., 0.5, 1., 1., 1.],
    /// ).unwrap();
    /// let refined = curve.try_refine_knot(&[0.25, 0.25, 0.75]).unwrap();
    /// assert_eq!(refined.knots().len(), curve.knots().len() + 3);
    /// assert_eq!(refined.control_points().len(), curve.control_points().len() + 3);
    /// assert_relative_eq!(refined.point_at(0.3), curve.point_at(0.3), epsilon = 1e-10);
    /// ```
    pub fn try_refine_knot(&self, knots_to_insert: &[T]) -> anyhow::Result<Self> {
        if knots_to_insert.is_empty() {
            return Ok(self.clone());
        }

        anyhow::ensure!(
            knots_to_insert.windows(2).all(|w| w[0] <= w[1]),
            "Knots to insert must be sorted in ascending order"
        );
        let (start, end) = self.knots_domain();
        let r = knots_to_insert.len() - 1;
        anyhow::ensure!(
            knots_to_insert[0] >= start && knots_to_insert[r] <= end,
            "Knots to insert [{}, {}] are outside of the domain [{}, {}]",
            knots_to_insert[0],
            knots_to_insert[r],
            start,
            end
        );

        let degree = self.degree;
        let control_points = &self.control_points;

        let n = control_points.len() - 1;
        let m = n + degree + 1;
        let a = self
            .knots
            .find_knot_span_index(n, degree, knots_to_insert[0]);
        let b = self
            .knots
            .find_knot_span_index(n, degree, knots_to_insert[r])
            + 1;

        #[cfg(feature = "log")]
        log::debug!(
            "refine knots: {} insertions into {} knots, affected spans [{}, {}]",
            r + 1,
            self.knots.len(),
            a,
            b
        );

        let mut control_points_post = vec![OPoint::<T, D>::origin(); n + r + 2];
        let mut knots_post = vec![T::zero(); m + r + 2];

        control_points_post[..=(a - degree)].clone_from_slice(&control_points[..=(a - degree)]);
        for i in (b - 1)..=n {
            control_points_post[i + r + 1] = control_points[i].clone();
        }

        knots_post[..=a].copy_from_slice(&self.knots.as_slice()[..=a]);
        for i in (b + degree)..=m {
            knots_post[i + r + 1] = self.knots[i];
        }

        let eps = T::epsilon_tolerance();
        let mut i = b + degree - 1;
        let mut k = b + degree + r;

        for j in (0..=r).rev() {
            while knots_to_insert[j] <= self.knots[i] && i > a {
                control_points_post[k - degree - 1] = control_points[i - degree - 1].clone();
                knots_post[k] = self.knots[i];
                k -= 1;
                i -= 1;
            }
            control_points_post[k - degree - 1] = control_points_post[k - degree].clone();
            for l in 1..=degree {
                let ind = k - degree + l;
                let alpha = knots_post[k + l] - knots_to_insert[j];
                if alpha.abs() < eps {
                    control_points_post[ind - 1] = control_points_post[ind].clone();
                } else {
                    let denom = knots_post[k + l] - self.knots[i - degree + l];
                    let weight = if denom != T::zero() {
                        alpha / denom
                    } else {
                        T::zero()
                    };
                    // weight * P[ind - 1] + (1 - weight) * P[ind]
                    control_points_post[ind - 1] = control_points_post[ind - 1]
                        .lerp(&control_points_post[ind], T::one() - weight);
                }
            }
            knots_post[k] = knots_to_insert[j];
            k -= 1;
        }

        Ok(Self::new_unchecked(
            degree,
            control_points_post,
            KnotVector::new(knots_post),
        ))
    }

    /// Try to insert a knot `times` times
    pub fn try_insert_knot(&self, knot: T, times: usize) -> anyhow::Result<Self> {
        self.try_refine_knot(&vec![knot; times])
    }

    /// Try to clamp the curve to its domain
    /// the domain ends are raised to a multiplicity of `degree + 1`,
    /// then the knots and control points outside the domain are dropped
    /// # Example
    /// ```
    /// use nurbs_core::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    /// let points: Vec<Point2<f64>> = (0..5).map(|i| Point2::new(i as f64, (i % 2) as f64)).collect();
    /// let knots = KnotVector::<f64>::try_generate(2, 5, false).unwrap();
    /// let curve = NurbsCurve2D::try_from_weighted(2, &points, &[], knots.to_vec()).unwrap();
    /// let clamped = curve.try_clamp().unwrap();
    /// assert!(clamped.is_clamped());
    /// assert_eq!(clamped.knots_domain(), curve.knots_domain());
    /// assert_relative_eq!(clamped.point_at(0.5), curve.point_at(0.5), epsilon = 1e-10);
    /// ```
    pub fn try_clamp(&self) -> anyhow::Result<Self> {
        if self.is_clamped() {
            return Ok(self.clone());
        }

        let degree = self.degree;
        let req_mult = degree + 1;
        let (start, end) = self.knots_domain();
        let head_count = req_mult.saturating_sub(self.knots.multiplicity_of(start));
        let tail_count = req_mult.saturating_sub(self.knots.multiplicity_of(end));
        let mut knots_to_insert = vec![start; head_count];
        knots_to_insert.extend(vec![end; tail_count]);
        let refined = self.try_refine_knot(&knots_to_insert)?;

        let eps = T::epsilon_tolerance();
        let head = refined.knots.iter().filter(|k| **k < start - eps).count();
        let tail = refined.knots.iter().filter(|k| **k > end + eps).count();
        let knots = refined.knots.as_slice()[head..(refined.knots.len() - tail)].to_vec();
        let control_points =
            refined.control_points[head..(refined.control_points.len() - tail)].to_vec();

        #[cfg(feature = "log")]
        log::debug!(
            "clamp: {} knots inserted, {} leading and {} trailing knots dropped",
            knots_to_insert.len(),
            head,
            tail
        );

        Ok(Self::new_unchecked(
            degree,
            control_points,
            KnotVector::new(knots),
        ))
    }

    /// Cast the curve to a curve with another floating point type
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> NurbsCurve<F, D> {
        NurbsCurve {
            control_points: self
                .control_points
                .iter()
                .map(|p| p.clone().cast())
                .collect(),
            degree: self.degree,
            knots: self.knots.cast(),
        }
    }
}

impl<T: FloatingPoint, D: DimName> Invertible for NurbsCurve<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    /// Reverse the direction of the curve
    /// control points (and with them the weights) are reversed and the knot vector is inverted
    /// # Example
    /// ```
    /// use nurbs_core::prelude::*;
    /// use nalgebra::Point2;
    /// use approx::assert_relative_eq;
    /// let points = vec![
    ///     Point2::new(0.0, 0.0),
    ///     Point2::new(1.0, 0.0),
    ///     Point2::new(1.0, 1.0),
    ///     Point2::new(0.0, 1.0),
    /// ];
    /// let mut curve = NurbsCurve2D::try_polyline(&points, true).unwrap();
    /// curve.invert();
    /// let (start, end) = curve.knots_domain();
    /// assert_relative_eq!(curve.point_at(start), points[points.len() - 1]);
    /// assert_relative_eq!(curve.point_at(end), points[0]);
    /// ```
    fn invert(&mut self) {
        self.control_points.reverse();
        self.knots.invert();
    }
}
