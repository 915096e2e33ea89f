pub mod binomial;
pub mod floating_point;
pub mod invertible;

pub use binomial::*;
pub use floating_point::*;
pub use invertible::*;
