#![allow(clippy::needless_range_loop)]

mod curve;
mod decompose;
mod divide;
mod homogeneous;
mod knot;
mod misc;
mod split;

pub mod prelude {
    pub use crate::curve::*;
    pub use crate::decompose::*;
    pub use crate::divide::*;
    pub use crate::homogeneous::*;
    pub use crate::knot::*;
    pub use crate::misc::*;
    pub use crate::split::*;
}
