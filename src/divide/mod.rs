pub mod curve_length_parameter;
pub use curve_length_parameter::*;

use gauss_quad::GaussLegendre;
use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, DimNameDiff, DimNameSub, U1};

use crate::{
    curve::NurbsCurve,
    decompose::{BezierDecomposeOption, Decompose},
    misc::FloatingPoint,
};

impl<T: FloatingPoint, D: DimName> NurbsCurve<T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    /// Compute the length of the curve by gauss-legendre quadrature
    /// # Example
    /// ```
    /// use nurbs_core::prelude::*;
    /// use nalgebra::Point3;
    /// use approx::assert_relative_eq;
    /// let corner_weight = 1. / 2.;
    /// let unit_circle = NurbsCurve2D::try_new(
    ///     2,
    ///     vec![
    ///         Point3::new(1.0, 0.0, 1.),
    ///         Point3::new(1.0, 1.0, 1.0) * corner_weight,
    ///         Point3::new(-1.0, 1.0, 1.0) * corner_weight,
    ///         Point3::new(-1.0, 0.0, 1.),
    ///         Point3::new(-1.0, -1.0, 1.0) * corner_weight,
    ///         Point3::new(1.0, -1.0, 1.0) * corner_weight,
    ///         Point3::new(1.0, 0.0, 1.),
    ///     ],
    ///     vec![0., 0., 0., 1. / 4., 1. / 2., 1. / 2., 3. / 4., 1., 1., 1.],
    /// ).unwrap();
    /// let approx = unit_circle.try_length().unwrap();
    /// let goal = 2.0 * std::f64::consts::PI; // circumference of the unit circle
    /// assert_relative_eq!(approx, goal, epsilon = 1e-8);
    /// ```
    pub fn try_length(&self) -> anyhow::Result<T> {
        let segments = self.try_decompose(BezierDecomposeOption::default())?;
        let gauss = GaussLegendre::init(16 + self.degree());
        Ok(segments
            .iter()
            .map(|s| compute_bezier_segment_length(s, s.knots_domain().1, &gauss))
            .fold(T::zero(), |a, b| a + b))
    }

    /// Compute the arc length from the start of the domain to the parameter `u`
    pub fn try_length_at(&self, u: T) -> anyhow::Result<T> {
        let u = self.knots().clamp(self.degree(), u);
        let segments = self.try_decompose(BezierDecomposeOption::default())?;
        let gauss = GaussLegendre::init(16 + self.degree());
        Ok(segments
            .iter()
            .map(|s| compute_bezier_segment_length(s, u, &gauss))
            .fold(T::zero(), |a, b| a + b))
    }

    /// Find the parameter at which the arc length from the start of the domain reaches `length`
    /// `tolerance` bounds the error of the arc length at the returned parameter
    pub fn try_parameter_at_length(&self, length: T, tolerance: Option<T>) -> anyhow::Result<T> {
        anyhow::ensure!(
            length >= T::zero(),
            "The length must not be negative: {}",
            length
        );

        let (start, end) = self.knots_domain();
        if length <= T::epsilon_tolerance() {
            return Ok(start);
        }

        let segments = self.try_decompose(BezierDecomposeOption::default())?;
        let gauss = GaussLegendre::init(16 + self.degree());
        let tolerance = tolerance.unwrap_or(T::max_tolerance());

        let mut acc = T::zero();
        for segment in segments.iter() {
            let segment_length =
                compute_bezier_segment_length(segment, segment.knots_domain().1, &gauss);
            if length <= acc + segment_length {
                return Ok(compute_bezier_segment_parameter_at_length(
                    segment,
                    length - acc,
                    tolerance,
                    segment_length,
                    &gauss,
                ));
            }
            acc += segment_length;
        }

        Ok(end)
    }

    /// Divide a NURBS curve by a given length
    /// the first sample is the start of the domain, the following samples are `length` apart
    /// # Example
    /// ```
    /// use nurbs_core::prelude::*;
    /// use nalgebra::Point3;
    /// use approx::assert_relative_eq;
    /// let corner_weight = 1. / 2.;
    /// let unit_circle = NurbsCurve2D::try_new(
    ///     2,
    ///     vec![
    ///         Point3::new(1.0, 0.0, 1.),
    ///         Point3::new(1.0, 1.0, 1.0) * corner_weight,
    ///         Point3::new(-1.0, 1.0, 1.0) * corner_weight,
    ///         Point3::new(-1.0, 0.0, 1.),
    ///         Point3::new(-1.0, -1.0, 1.0) * corner_weight,
    ///         Point3::new(1.0, -1.0, 1.0) * corner_weight,
    ///         Point3::new(1.0, 0.0, 1.),
    ///     ],
    ///     vec![0., 0., 0., 1. / 4., 1. / 2., 1. / 2., 3. / 4., 1., 1., 1.],
    /// ).unwrap();
    /// let u = std::f64::consts::FRAC_PI_2; // 90 degrees
    /// let params = unit_circle.try_divide_by_length(u).unwrap();
    /// let total_length = 2.0 * std::f64::consts::PI; // circumference of the unit circle
    /// assert_eq!(params.len(), 5);
    /// assert_relative_eq!(params[0].length(), 0.);
    /// assert_relative_eq!(params[1].length(), total_length / 4.);
    /// assert_relative_eq!(params[2].length(), total_length / 4. * 2.);
    /// assert_relative_eq!(params[3].length(), total_length / 4. * 3.);
    /// assert_relative_eq!(params[4].length(), total_length);
    /// ```
    pub fn try_divide_by_length(&self, length: T) -> anyhow::Result<Vec<CurveLengthParameter<T>>> {
        anyhow::ensure!(length > T::zero(), "The length must be greater than zero");

        let segments = self.try_decompose(BezierDecomposeOption::default())?;
        let gauss = GaussLegendre::init(16 + self.degree());
        let lengths = segments
            .iter()
            .map(|s| compute_bezier_segment_length(s, s.knots_domain().1, &gauss))
            .collect::<Vec<_>>();
        let total = lengths.iter().fold(T::zero(), |a, b| a + *b);

        let eps = T::max_tolerance();
        anyhow::ensure!(
            length < total + eps,
            "The curve is too short to divide by the given length: {} > {}",
            length,
            total
        );

        let mut samples = vec![CurveLengthParameter::new(self.knots_domain().0, T::zero())];

        let mut i = 0;
        let mut lc = length;

        let mut acc = T::zero();
        let mut acc_prev = T::zero();

        while i < segments.len() {
            let current_length = lengths[i];
            acc += current_length;

            while lc < acc + eps {
                let u = compute_bezier_segment_parameter_at_length(
                    &segments[i],
                    lc - acc_prev,
                    eps,
                    current_length,
                    &gauss,
                );
                samples.push(CurveLengthParameter::new(u, lc));
                lc += length;
            }

            acc_prev += current_length;
            i += 1;
        }

        #[cfg(feature = "log")]
        log::trace!(
            "divide by length: {} segments, {} samples",
            segments.len(),
            samples.len()
        );

        Ok(samples)
    }

    /// Divide the curve by a given number of segments of equal arc length
    /// `segments` pieces yield `segments + 1` samples including both ends
    pub fn try_divide_by_count(
        &self,
        segments: usize,
    ) -> anyhow::Result<Vec<CurveLengthParameter<T>>> {
        anyhow::ensure!(segments > 0, "The number of segments must be greater than zero");
        let length = self.try_length()?;
        let u = length / T::from_usize(segments).unwrap();
        self.try_divide_by_length(u)
    }
}

/// Find the curve parameter at arc length on a Bezier segment of a NURBS curve
/// by binary search
fn compute_bezier_segment_parameter_at_length<T: FloatingPoint, D: DimName>(
    s: &NurbsCurve<T, D>,
    length: T,
    tolerance: T,
    total_length: T,
    gauss: &GaussLegendre,
) -> T
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let (k0, k1) = s.knots_domain();
    if length < T::zero() {
        return k0;
    } else if length > total_length {
        return k1;
    }

    let mut start = (k0, T::zero());
    let mut end = (k1, total_length);

    let inv = T::one() / T::from_usize(2).unwrap();

    // binary search
    while (end.1 - start.1) > tolerance {
        let middle_parameter = (start.0 + end.0) * inv;
        if (end.0 - start.0) <= T::epsilon_tolerance() {
            break;
        }
        let mid = (
            middle_parameter,
            compute_bezier_segment_length(s, middle_parameter, gauss),
        );
        if mid.1 > length {
            end = mid;
        } else {
            start = mid;
        }
    }

    (start.0 + end.0) * inv
}

/// Compute the length of a Bezier segment of a NURBS curve from its start to `u`
/// by gauss-legendre quadrature
fn compute_bezier_segment_length<T: FloatingPoint, D: DimName>(
    s: &NurbsCurve<T, D>,
    u: T,
    gauss: &GaussLegendre,
) -> T
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let (start, end) = s.knots_domain();
    if start + T::epsilon_tolerance() < u {
        let t = end.min(u);
        let left = start.to_f64().unwrap();
        let right = t.to_f64().unwrap();
        let sum = gauss.integrate(left, right, |x| {
            let x = T::from_f64(x).unwrap();
            let deriv = s.rational_derivatives(x, 1);
            let tan = deriv[1].norm();
            tan.to_f64().unwrap()
        });
        T::from_f64(sum).unwrap()
    } else {
        T::zero()
    }
}
