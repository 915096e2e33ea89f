use itertools::Itertools;
use nalgebra::{allocator::Allocator, DefaultAllocator, DimName};

use crate::{curve::NurbsCurve, knot::KnotVector, misc::FloatingPoint};

use super::Decompose;

/// Option for decomposing a curve into Bezier segments
#[derive(Debug, Clone, Copy, Default)]
pub struct BezierDecomposeOption {
    /// rescale the knot vector of each segment to [0, 1]
    pub normalize: bool,
}

impl BezierDecomposeOption {
    pub fn new(normalize: bool) -> Self {
        Self { normalize }
    }
}

impl<T: FloatingPoint, D: DimName> Decompose for NurbsCurve<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    type Option = BezierDecomposeOption;
    type Output = Vec<NurbsCurve<T, D>>;

    /// Decompose the curve into a set of Bezier segments of the same degree
    /// every knot is raised to a multiplicity of `degree + 1`,
    /// so each segment has `degree + 1` control points and spans one knot interval.
    /// An unclamped curve is clamped to its domain first.
    /// # Example
    /// ```
    /// use nurbs_core::prelude::*;
    /// use nalgebra::Point3;
    /// let points: Vec<Point3<f64>> = (0..8)
    ///     .map(|i| Point3::new(i as f64, (i % 3) as f64, 0.))
    ///     .collect();
    /// let curve = NurbsCurve3D::try_from_weighted(
    ///     3,
    ///     &points,
    ///     &[],
    ///     vec![0., 0., 0., 0., 1., 2., 3., 4., 5., 5., 5., 5.],
    /// ).unwrap();
    /// let segments = curve.try_decompose(BezierDecomposeOption::default()).unwrap();
    /// assert_eq!(segments.len(), 5);
    /// ```
    fn try_decompose(&self, option: Self::Option) -> anyhow::Result<Self::Output> {
        let clamped = self.try_clamp()?;

        let req_mult = clamped.degree() + 1;
        let knots_to_insert = clamped
            .knots()
            .multiplicity()
            .iter()
            .filter(|m| m.multiplicity() < req_mult)
            .flat_map(|m| vec![*m.knot(); req_mult - m.multiplicity()])
            .collect_vec();
        let refined = clamped.try_refine_knot(&knots_to_insert)?;

        let div = refined.knots().len() / req_mult - 1;

        #[cfg(feature = "log")]
        log::debug!(
            "decompose: {} knots inserted, {} bezier segments",
            knots_to_insert.len(),
            div
        );

        let knot_length = req_mult * 2;
        (0..div)
            .map(|i| -> anyhow::Result<NurbsCurve<T, D>> {
                let start = i * req_mult;
                let end = start + knot_length;
                let knots = KnotVector::new(refined.knots().as_slice()[start..end].to_vec());
                let knots = if option.normalize {
                    knots.try_normalize()?
                } else {
                    knots
                };
                let control_points = refined.control_points()[start..(start + req_mult)].to_vec();
                Ok(NurbsCurve::new_unchecked(
                    refined.degree(),
                    control_points,
                    knots,
                ))
            })
            .collect()
    }
}
