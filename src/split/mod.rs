use nalgebra::{allocator::Allocator, DefaultAllocator, DimName};

use crate::{curve::NurbsCurve, knot::KnotVector, misc::FloatingPoint};

/// Split the object into two objects with the given option
pub trait Split
where
    Self: Sized,
{
    type Option;
    fn try_split(&self, option: Self::Option) -> anyhow::Result<(Self, Self)>;
}

impl<T: FloatingPoint, D: DimName> Split for NurbsCurve<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    type Option = T;

    /// Split the curve into two curves before and after the parameter
    /// the knot at `u` is raised to a multiplicity of `degree + 1` and the control points are divided there
    /// a knot that already has that multiplicity is cut without refinement
    /// # Example
    /// ```
    /// use nurbs_core::prelude::*;
    /// use nalgebra::Point2;
    /// let points = vec![
    ///     Point2::new(0., 0.),
    ///     Point2::new(1., 2.),
    ///     Point2::new(3., 2.),
    ///     Point2::new(4., 0.),
    /// ];
    /// let curve = NurbsCurve2D::try_from_weighted(
    ///     3,
    ///     &points,
    ///     &[],
    ///     vec![0., 0., 0., 0., 1., 1., 1., 1.],
    /// ).unwrap();
    /// let (left, right) = curve.try_split(0.5).unwrap();
    /// assert_eq!(left.knots_domain().1, 0.5);
    /// assert_eq!(right.knots_domain().0, 0.5);
    /// ```
    fn try_split(&self, u: T) -> anyhow::Result<(Self, Self)> {
        let (start, end) = self.knots_domain();
        let eps = T::epsilon_tolerance();
        anyhow::ensure!(
            u > start + eps && u < end - eps,
            "Parameter {} must be inside the domain ({}, {}) to split",
            u,
            start,
            end
        );

        let degree = self.degree();
        let multiplicity = self.knots().multiplicity_of(u);
        let refined = self.try_insert_knot(u, (degree + 1).saturating_sub(multiplicity))?;

        // index of the first copy of `u` in the refined knot vector
        let s = self.knots().iter().filter(|k| **k < u - eps).count();
        let knots0 = refined.knots().as_slice()[..=(s + degree)].to_vec();
        let knots1 = refined.knots().as_slice()[s..].to_vec();
        let cpts0 = refined.control_points()[..s].to_vec();
        let cpts1 = refined.control_points()[s..].to_vec();
        Ok((
            Self::new_unchecked(degree, cpts0, KnotVector::new(knots0)),
            Self::new_unchecked(degree, cpts1, KnotVector::new(knots1)),
        ))
    }
}
