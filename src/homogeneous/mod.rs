use nalgebra::{
    allocator::Allocator, DefaultAllocator, DimName, DimNameDiff, DimNameSub, OPoint, OVector, U1,
};

use crate::misc::FloatingPoint;

/// Homogenize points with weights
/// `D` is the dimension of the homogeneous point, so the inputs have `D - 1` coordinates.
/// Points beyond the end of `weights` get the weight 1.
/// # Failures
/// - if there are more weights than points
///
/// # Example
/// ```
/// use nurbs_core::prelude::*;
/// use nalgebra::{Point3, Point4};
/// let points = vec![Point3::new(1., 2., 3.), Point3::new(4., 5., 6.)];
/// let homogenized: Vec<Point4<f64>> = homogenize(&points, &[2.]).unwrap();
/// assert_eq!(homogenized[0], Point4::new(2., 4., 6., 2.));
/// assert_eq!(homogenized[1], Point4::new(4., 5., 6., 1.));
/// ```
pub fn homogenize<T: FloatingPoint, D: DimName>(
    points: &[OPoint<T, DimNameDiff<D, U1>>],
    weights: &[T],
) -> anyhow::Result<Vec<OPoint<T, D>>>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    anyhow::ensure!(
        weights.len() <= points.len(),
        "The number of weights ({}) exceeds the number of points ({})",
        weights.len(),
        points.len()
    );

    Ok(points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let w = weights.get(i).copied().unwrap_or(T::one());
            homogenize_point(p, w)
        })
        .collect())
}

/// Homogenize a single point with a weight
pub fn homogenize_point<T: FloatingPoint, D: DimName>(
    point: &OPoint<T, DimNameDiff<D, U1>>,
    weight: T,
) -> OPoint<T, D>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let last = D::dim() - 1;
    let coords = OVector::<T, D>::from_fn(|r, _| {
        if r < last {
            point[r] * weight
        } else {
            weight
        }
    });
    OPoint { coords }
}

/// Homogenize a grid of points row by row
/// Rows beyond the end of `weights` get the weight 1.
pub fn homogenize_2d<T: FloatingPoint, D: DimName>(
    points: &[Vec<OPoint<T, DimNameDiff<D, U1>>>],
    weights: &[Vec<T>],
) -> anyhow::Result<Vec<Vec<OPoint<T, D>>>>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    anyhow::ensure!(
        weights.len() <= points.len(),
        "The number of weight rows ({}) exceeds the number of point rows ({})",
        weights.len(),
        points.len()
    );

    points
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let w = weights.get(i).map(|w| w.as_slice()).unwrap_or(&[]);
            homogenize(row, w)
        })
        .collect()
}

/// Dehomogenize a point
/// A weight of zero or one leaves the coordinates unscaled.
pub fn dehomogenize<T: FloatingPoint, D: DimName>(
    point: &OPoint<T, D>,
) -> OPoint<T, DimNameDiff<D, U1>>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    let w = point[D::dim() - 1];
    let eps = T::epsilon_tolerance();
    let scale = if w.abs() <= eps || (w - T::one()).abs() <= eps {
        T::one()
    } else {
        T::one() / w
    };
    let coords = OVector::<T, DimNameDiff<D, U1>>::from_fn(|r, _| point[r] * scale);
    OPoint { coords }
}

/// Dehomogenize a list of points
pub fn dehomogenize_1d<T: FloatingPoint, D: DimName>(
    points: &[OPoint<T, D>],
) -> Vec<OPoint<T, DimNameDiff<D, U1>>>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    points.iter().map(dehomogenize).collect()
}

/// Dehomogenize a grid of points
pub fn dehomogenize_2d<T: FloatingPoint, D: DimName>(
    points: &[Vec<OPoint<T, D>>],
) -> Vec<Vec<OPoint<T, DimNameDiff<D, U1>>>>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    points.iter().map(|row| dehomogenize_1d(row)).collect()
}

/// Extract the weights of homogeneous points
pub fn weights<T: FloatingPoint, D: DimName>(points: &[OPoint<T, D>]) -> Vec<T>
where
    DefaultAllocator: Allocator<D>,
{
    points.iter().map(|p| p[D::dim() - 1]).collect()
}

/// Extract the weights of a grid of homogeneous points
pub fn weights_2d<T: FloatingPoint, D: DimName>(points: &[Vec<OPoint<T, D>>]) -> Vec<Vec<T>>
where
    DefaultAllocator: Allocator<D>,
{
    points.iter().map(|row| weights(row)).collect()
}

/// Drop the weight component of homogeneous vectors without dividing by it
/// Applied to derivatives of a homogeneous curve, this yields the derivatives of the numerator `A(u)`
pub fn rational_1d<T: FloatingPoint, D: DimName>(
    vectors: &[OVector<T, D>],
) -> Vec<OVector<T, DimNameDiff<D, U1>>>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    vectors
        .iter()
        .map(|v| OVector::<T, DimNameDiff<D, U1>>::from_fn(|r, _| v[r]))
        .collect()
}

/// Grid version of [`rational_1d`]
pub fn rational_2d<T: FloatingPoint, D: DimName>(
    vectors: &[Vec<OVector<T, D>>],
) -> Vec<Vec<OVector<T, DimNameDiff<D, U1>>>>
where
    D: DimNameSub<U1>,
    DefaultAllocator: Allocator<D>,
    DefaultAllocator: Allocator<DimNameDiff<D, U1>>,
{
    vectors.iter().map(|row| rational_1d(row)).collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{Point2, Point3, Point4, Vector4};

    use super::*;

    fn points() -> Vec<Point3<f64>> {
        vec![
            Point3::new(-10., 15., 5.),
            Point3::new(10., 5., 5.),
            Point3::new(20., 0., 0.),
            Point3::new(1.5, -2.25, 8.),
        ]
    }

    #[test]
    fn homogenize_then_dehomogenize() {
        let pts = points();
        for weights in [vec![], vec![0.5], vec![0.5, 2., 1.5], vec![0.5, 2., 1.5, 3.]] {
            let homogenized: Vec<Point4<f64>> = homogenize(&pts, &weights).unwrap();
            assert_eq!(homogenized.len(), pts.len());
            let dehomogenized = dehomogenize_1d(&homogenized);
            pts.iter()
                .zip(dehomogenized.iter())
                .for_each(|(a, b)| assert_relative_eq!(a, b, epsilon = 1e-12));

            let ws = super::weights(&homogenized);
            for (i, w) in ws.iter().enumerate() {
                assert_eq!(*w, weights.get(i).copied().unwrap_or(1.));
            }
        }
    }

    #[test]
    fn too_many_weights() {
        let pts = vec![Point2::new(0., 0.), Point2::new(1., 0.)];
        let res: anyhow::Result<Vec<Point3<f64>>> = homogenize(&pts, &[1., 2., 3.]);
        assert!(res.is_err());
    }

    #[test]
    fn dehomogenize_unit_and_zero_weight() {
        assert_eq!(
            dehomogenize(&Point4::new(1., 2., 3., 1.)),
            Point3::new(1., 2., 3.)
        );
        assert_eq!(
            dehomogenize(&Point4::new(1., 2., 3., 0.)),
            Point3::new(1., 2., 3.)
        );
        assert_eq!(
            dehomogenize(&Point4::new(2., 4., 6., 2.)),
            Point3::new(1., 2., 3.)
        );
    }

    #[test]
    fn grid_conversions() {
        let grid = vec![points(), points()];
        let weights = vec![vec![2., 2., 2., 2.]];
        let homogenized: Vec<Vec<Point4<f64>>> = homogenize_2d(&grid, &weights).unwrap();
        assert_eq!(weights_2d(&homogenized), vec![vec![2.; 4], vec![1.; 4]]);

        let dehomogenized = dehomogenize_2d(&homogenized);
        grid.iter().flatten().zip(dehomogenized.iter().flatten()).for_each(|(a, b)| {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        });

        let res: anyhow::Result<Vec<Vec<Point4<f64>>>> =
            homogenize_2d(&grid, &[vec![], vec![], vec![]]);
        assert!(res.is_err());
    }

    #[test]
    fn rational_drops_weight() {
        let ders = vec![Vector4::new(2., 4., 6., 2.), Vector4::new(1., 0., -1., 0.5)];
        let a = rational_1d(&ders);
        assert_eq!(a[0].as_slice(), &[2., 4., 6.]);
        assert_eq!(a[1].as_slice(), &[1., 0., -1.]);
        let grid = rational_2d(&[ders.clone(), ders]);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[1][0].as_slice(), &[2., 4., 6.]);
    }
}
