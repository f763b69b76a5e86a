use num_traits::{ ToPrimitive, NumCast };


/// All types that may be recorded as a metric value.
///
/// This trait gets implemented automatically for all types
/// that satisfy its dependent traits.

pub trait Scalar: ToPrimitive + Copy + std::fmt::Debug {}
impl<T: ToPrimitive + Copy + std::fmt::Debug> Scalar for T {}


/// Convert a [Scalar] into the `f64` representation metrics are stored in.
///
/// Values that cannot be represented become NaN.

pub fn to_metric<S: Scalar>(value: S) -> f64 {
  value.to_f64().unwrap_or(f64::NAN)
}


/// Convert a stored metric back into a numeric type of the caller's choice.

pub fn from_metric<N: NumCast>(value: f64) -> Option<N> {
  N::from(value)
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn primitive_metrics() {
    assert_eq!(to_metric(3_u8), 3.0);
    assert_eq!(to_metric(-2_i64), -2.0);
    assert_eq!(to_metric(0.5_f32), 0.5);
    assert_eq!(to_metric(7_usize), 7.0);
  }

  #[test]
  fn narrowing() {
    assert_eq!(from_metric::<u8>(42.0), Some(42));
    assert_eq!(from_metric::<u8>(-1.0), None);
    assert_eq!(from_metric::<f32>(0.25), Some(0.25));
  }
}
