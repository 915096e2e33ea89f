use nalgebra::{convert, RealField};
use num_traits::ToPrimitive;

/// Tolerance for treating two knots, parameters or weights as the same value
pub const EPSILON: f64 = 1e-10;

/// Tolerance for geometric distance comparisons
pub const MAX_TOLERANCE: f64 = 1e-6;

/// Trait for floating point types (f32, f64)
/// Mainly used to identify the type of the field in nalgebra
pub trait FloatingPoint: RealField + ToPrimitive + Copy {
    /// Returns the tolerance used for "same value" comparisons of knots and parameters
    fn epsilon_tolerance() -> Self {
        convert(EPSILON)
    }

    /// Returns the tolerance used for geometric distance comparisons
    fn max_tolerance() -> Self {
        convert(MAX_TOLERANCE)
    }
}

impl FloatingPoint for f32 {
    fn epsilon_tolerance() -> Self {
        1e-6
    }

    fn max_tolerance() -> Self {
        1e-4
    }
}

impl FloatingPoint for f64 {}
