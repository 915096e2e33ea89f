/// Trait for types whose parametrization direction can be reversed.
/// `invert` works on an owned value in place, `inverse` leaves `self` untouched.
pub trait Invertible: Clone {
    fn invert(&mut self);
    fn inverse(&self) -> Self {
        let mut inv = self.clone();
        inv.invert();
        inv
    }
}
