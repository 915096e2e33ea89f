use approx::assert_relative_eq;
use nalgebra::{Point2, Point3, Point4, Vector3};

use crate::prelude::*;

fn cubic() -> NurbsCurve3D<f64> {
    let points = vec![
        Point3::new(0., 0., 0.),
        Point3::new(1., 2., 0.5),
        Point3::new(2., -1., 1.),
        Point3::new(3., 3., 0.),
        Point3::new(4., 0., -1.),
        Point3::new(5., 2., 0.),
        Point3::new(6., -2., 1.),
        Point3::new(7., 1., 0.),
    ];
    NurbsCurve3D::try_from_weighted(
        3,
        &points,
        &[1., 0.5, 2., 1., 1.5, 1., 0.8, 1.],
        vec![0., 0., 0., 0., 1., 2., 3., 4., 5., 5., 5., 5.],
    )
    .unwrap()
}

fn unit_circle() -> NurbsCurve2D<f64> {
    let corner_weight = 1. / 2.;
    NurbsCurve2D::try_new(
        2,
        vec![
            Point3::new(1.0, 0.0, 1.),
            Point3::new(1.0, 1.0, 1.0) * corner_weight,
            Point3::new(-1.0, 1.0, 1.0) * corner_weight,
            Point3::new(-1.0, 0.0, 1.),
            Point3::new(-1.0, -1.0, 1.0) * corner_weight,
            Point3::new(1.0, -1.0, 1.0) * corner_weight,
            Point3::new(1.0, 0.0, 1.),
        ],
        vec![0., 0., 0., 1. / 4., 1. / 2., 1. / 2., 3. / 4., 1., 1., 1.],
    )
    .unwrap()
}

#[test]
fn quadratic_bezier_midpoint() {
    let points = vec![
        Point3::new(-10., 15., 5.),
        Point3::new(10., 5., 5.),
        Point3::new(20., 0., 0.),
    ];
    let curve =
        NurbsCurve3D::try_from_weighted(2, &points, &[], vec![0., 0., 0., 1., 1., 1.]).unwrap();
    assert_relative_eq!(curve.point_at(0.5), Point3::new(7.5, 6.25, 3.75));
    assert_relative_eq!(curve.point_at(0.), points[0]);
    assert_relative_eq!(curve.point_at(1.), points[2]);
    assert_eq!(curve.weights(), vec![1., 1., 1.]);
}

#[test]
fn invalid_construction() {
    let points = vec![
        Point4::new(0., 0., 0., 1.),
        Point4::new(1., 0., 0., 1.),
        Point4::new(2., 0., 0., 1.),
    ];
    // too few control points
    assert!(NurbsCurve3D::try_new(3, points.clone(), vec![0., 0., 0., 0., 1., 1., 1.]).is_err());
    // wrong number of knots
    assert!(NurbsCurve3D::try_new(2, points.clone(), vec![0., 0., 0., 1., 1.]).is_err());
    // decreasing knots
    assert!(NurbsCurve3D::try_new(2, points.clone(), vec![0., 0., 0., 1., 0.5, 1.]).is_err());
    // zero degree
    assert!(NurbsCurve3D::try_new(0, points.clone(), vec![0., 1., 2.]).is_err());
    // more weights than points
    let plain = vec![Point3::new(0., 0., 0.), Point3::new(1., 0., 0.)];
    assert!(NurbsCurve3D::try_from_weighted(1, &plain, &[1., 1., 1.], vec![0., 0., 1., 1.]).is_err());
}

#[test]
fn circle_points_and_tangents() {
    let circle = unit_circle();
    for i in 0..=32 {
        let u = i as f64 / 32.;
        let p = circle.point_at(u);
        assert_relative_eq!(p.coords.norm(), 1., epsilon = 1e-10);

        let tangent = circle.tangent_at(u);
        assert!(tangent.norm() > 0.);
        assert_relative_eq!(tangent.dot(&p.coords), 0., epsilon = 1e-9);
    }
    assert_relative_eq!(circle.point_at(0.25), Point2::new(0., 1.), epsilon = 1e-10);
    assert_relative_eq!(circle.point_at(0.5), Point2::new(-1., 0.), epsilon = 1e-10);
}

#[test]
fn rational_derivatives_match_finite_differences() {
    let curve = cubic();
    let h = 1e-5;
    for u in [0.3, 1.2, 2.5, 3.7, 4.6] {
        let ders = curve.rational_derivatives(u, 2);
        assert_eq!(ders.len(), 3);
        assert_relative_eq!(ders[0], curve.point_at(u).coords, epsilon = 1e-12);

        let forward = curve.point_at(u + h);
        let backward = curve.point_at(u - h);
        let first = (forward - backward) / (2. * h);
        assert_relative_eq!(ders[1], first, epsilon = 1e-5);

        let t_forward = curve.tangent_at(u + h);
        let t_backward = curve.tangent_at(u - h);
        let second = (t_forward - t_backward) / (2. * h);
        assert_relative_eq!(ders[2], second, epsilon = 1e-4);
    }
}

#[test]
fn derivatives_above_degree_are_zero() {
    let points = vec![
        Point3::new(-10., 15., 5.),
        Point3::new(10., 5., 5.),
        Point3::new(20., 0., 0.),
    ];
    let curve =
        NurbsCurve3D::try_from_weighted(2, &points, &[1., 3., 1.], vec![0., 0., 0., 1., 1., 1.])
            .unwrap();
    let ders = curve.derivatives(0.4, 4);
    assert_eq!(ders.len(), 5);
    assert!(ders[3].iter().chain(ders[4].iter()).all(|v| *v == 0.));
    assert_relative_eq!(ders[0], curve.point(0.4).coords);

    // polynomial curve: the tangent of a quadratic bezier is linear in u
    let polynomial =
        NurbsCurve3D::try_from_weighted(2, &points, &[], vec![0., 0., 0., 1., 1., 1.]).unwrap();
    let tangent = polynomial.tangent_at(0.5);
    assert_relative_eq!(tangent, Vector3::new(30., -15., -5.), epsilon = 1e-10);
}

#[test]
fn knot_refinement_preserves_geometry() {
    let curve = cubic();
    for times in 1..=4 {
        let knots_to_insert = vec![2.5; times];
        let refined = curve.try_refine_knot(&knots_to_insert).unwrap();
        assert_eq!(refined.knots().len(), curve.knots().len() + times);
        assert_eq!(
            refined.control_points().len(),
            curve.control_points().len() + times
        );
        assert_eq!(refined.knots().multiplicity_of(2.5), times);
        assert!(refined.knots().is_valid(3, refined.control_points().len()));

        for i in 0..=50 {
            let u = 5. * i as f64 / 50.;
            assert_relative_eq!(refined.point_at(u), curve.point_at(u), epsilon = 1e-10);
        }
    }
}

#[test]
fn knot_refinement_with_many_knots() {
    let curve = cubic();
    let knots_to_insert = vec![0.1, 0.5, 1., 1., 2.2, 3.9, 4.5, 4.5];
    let refined = curve.try_refine_knot(&knots_to_insert).unwrap();
    assert_eq!(refined.knots().len(), curve.knots().len() + knots_to_insert.len());
    for i in 0..=40 {
        let u = 5. * i as f64 / 40.;
        assert_relative_eq!(refined.point_at(u), curve.point_at(u), epsilon = 1e-10);
    }

    let inserted = curve.try_insert_knot(1.5, 2).unwrap();
    assert_eq!(inserted.knots().multiplicity_of(1.5), 2);
    assert_relative_eq!(inserted.point_at(1.5), curve.point_at(1.5), epsilon = 1e-10);
}

#[test]
fn knot_refinement_edge_cases() {
    let curve = cubic();
    assert_eq!(curve.try_refine_knot(&[]).unwrap(), curve);
    assert!(curve.try_refine_knot(&[3., 2.]).is_err());
    assert!(curve.try_refine_knot(&[-1.]).is_err());
    assert!(curve.try_refine_knot(&[6.]).is_err());
}

#[test]
fn reverse_is_an_involution() {
    let curve = cubic();
    let reversed = curve.inverse();
    let (start, end) = curve.knots_domain();
    assert_eq!(reversed.knots_domain(), (start, end));

    let mut weights = curve.weights();
    weights.reverse();
    assert_eq!(reversed.weights(), weights);

    assert_relative_eq!(reversed.point_at(end), curve.point_at(start), epsilon = 1e-12);
    assert_relative_eq!(reversed.point_at(start), curve.point_at(end), epsilon = 1e-12);
    for i in 0..=20 {
        let u = 5. * i as f64 / 20.;
        assert_relative_eq!(
            reversed.point_at(start + end - u),
            curve.point_at(u),
            epsilon = 1e-10
        );
    }

    let twice = reversed.inverse();
    assert_eq!(twice.knots(), curve.knots());
    assert_eq!(twice.weights(), curve.weights());
    twice
        .control_points()
        .iter()
        .zip(curve.control_points().iter())
        .for_each(|(a, b)| assert_relative_eq!(a, b));
}

#[test]
fn reverse_normalized_curve() {
    let circle = unit_circle();
    let reversed = circle.inverse();
    assert_relative_eq!(reversed.point_at(1.), circle.point_at(0.), epsilon = 1e-12);
    assert_relative_eq!(reversed.point_at(0.25), circle.point_at(0.75), epsilon = 1e-10);
}

#[test]
fn polyline_and_sampling() {
    let points = vec![Point2::new(0., 0.), Point2::new(3., 0.), Point2::new(3., 4.)];
    let polyline = NurbsCurve2D::try_polyline(&points, true).unwrap();
    assert_eq!(polyline.degree(), 1);
    assert_eq!(polyline.knots().to_vec(), vec![0., 0., 3. / 7., 1., 1.]);
    assert_relative_eq!(polyline.point_at(3. / 7.), points[1], epsilon = 1e-10);

    let samples = polyline.sample_regular_range(0., 1., 8);
    assert_eq!(samples.len(), 8);
    assert_relative_eq!(samples[0], points[0]);
    assert_relative_eq!(samples[7], points[2], epsilon = 1e-10);
    assert!(NurbsCurve2D::try_polyline(&points[..1], true).is_err());
}

#[test]
fn cast_and_dehomogenize() {
    let curve = cubic();
    let single = curve.cast::<f32>();
    let p = single.point_at(2.5);
    let q = curve.point_at(2.5);
    assert_relative_eq!(p.x, q.x as f32, epsilon = 1e-4);
    assert_relative_eq!(p.y, q.y as f32, epsilon = 1e-4);
    assert_relative_eq!(p.z, q.z as f32, epsilon = 1e-4);

    let plain = curve.dehomogenize();
    assert_eq!(plain.control_points().len(), curve.control_points().len());
    assert_relative_eq!(plain.control_points()[1], Point3::new(1., 2., 0.5), epsilon = 1e-12);
}

#[test]
fn clamp_unclamped_curve() {
    let points = vec![
        Point3::new(0., 0., 0.),
        Point3::new(1., 2., 0.5),
        Point3::new(2., -1., 1.),
        Point3::new(3., 3., 0.),
        Point3::new(4., 0., -1.),
        Point3::new(5., 2., 0.),
    ];
    let knots = KnotVector::<f64>::try_generate(3, 6, false).unwrap();
    let curve =
        NurbsCurve3D::try_from_weighted(3, &points, &[1., 2., 0.5, 1., 1.5, 1.], knots.to_vec())
            .unwrap();
    let clamped = curve.try_clamp().unwrap();
    assert!(clamped.is_clamped());
    assert!(clamped
        .knots()
        .is_valid(3, clamped.control_points().len()));
    assert_eq!(clamped.knots_domain(), curve.knots_domain());

    let (start, end) = curve.knots_domain();
    for i in 0..=20 {
        let u = start + (end - start) * i as f64 / 20.;
        assert_relative_eq!(clamped.point_at(u), curve.point_at(u), epsilon = 1e-10);
    }
    assert_eq!(cubic().try_clamp().unwrap(), cubic());
}
