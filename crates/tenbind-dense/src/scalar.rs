//! Element types of dense aggregates.

use tenbind_runtime::Element;

/// A numeric element of a dense aggregate.
///
/// Integer arithmetic wraps, so results match what the host computes for
/// the same dtype.
pub trait Scalar: Element + Default {
    /// Additive identity
    fn zero() -> Self;
    /// Multiplicative identity
    fn one() -> Self;
    /// `self + rhs`
    fn add(self, rhs: Self) -> Self;
    /// `self - rhs`
    fn sub(self, rhs: Self) -> Self;
    /// `self * rhs`
    fn mul(self, rhs: Self) -> Self;
}

macro_rules! impl_scalar_int {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                fn zero() -> Self { 0 }
                fn one() -> Self { 1 }
                fn add(self, rhs: Self) -> Self { self.wrapping_add(rhs) }
                fn sub(self, rhs: Self) -> Self { self.wrapping_sub(rhs) }
                fn mul(self, rhs: Self) -> Self { self.wrapping_mul(rhs) }
            }
        )*
    };
}

macro_rules! impl_scalar_float {
    ($($ty:ty),*) => {
        $(
            impl Scalar for $ty {
                fn zero() -> Self { 0.0 }
                fn one() -> Self { 1.0 }
                fn add(self, rhs: Self) -> Self { self + rhs }
                fn sub(self, rhs: Self) -> Self { self - rhs }
                fn mul(self, rhs: Self) -> Self { self * rhs }
            }
        )*
    };
}

impl_scalar_int!(i8, i16, i32, i64, u8, u16, u32, u64);
impl_scalar_float!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_ops_wrap() {
        assert_eq!(Scalar::sub(0u32, 1), u32::MAX);
        assert_eq!(Scalar::add(i8::MAX, 1), i8::MIN);
        assert_eq!(Scalar::mul(3u8, 100), 44);
    }

    #[test]
    fn test_float_ops() {
        assert_eq!(Scalar::add(0.5f64, 0.25), 0.75);
        assert_eq!(<f32 as Scalar>::one(), 1.0);
    }
}
