pub mod decompose_nurbs_curve;
pub use decompose_nurbs_curve::*;

/// Decompose a curve into a set of simpler curves
pub trait Decompose {
    type Option;
    type Output;
    fn try_decompose(&self, option: Self::Option) -> anyhow::Result<Self::Output>;
}
