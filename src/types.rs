//! Core data types for tiffscope

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// Maximum error accepted by [`RationalNumber::approximate`]
const TOLERANCE: f64 = 1e-8;
const MAX_ITERATIONS: usize = 100;

/// A TIFF rational: 32-bit numerator over a 32-bit divisor
///
/// Values are not required to be in lowest terms. Only the reducing
/// constructor [`RationalNumber::new_safe`] divides by the GCD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RationalNumber {
    pub numerator: i32,
    pub divisor: i32,
}

impl RationalNumber {
    /// Creates a rational as-is, without reduction
    pub const fn new(numerator: i32, divisor: i32) -> Self {
        Self { numerator, divisor }
    }

    /// Creates a reduced rational from 64-bit inputs
    ///
    /// Inputs that do not fit in 32 bits are shifted right one bit at a time
    /// (sign preserving) until both fit or one of them reaches magnitude 1.
    /// A side that still overflows saturates to the nearest `i32` bound.
    /// Inputs that already fit are only reduced.
    pub fn new_safe(numerator: i64, divisor: i64) -> Result<Self> {
        if divisor == 0 {
            return Err(Error::InvalidFormat(format!(
                "Invalid rational, numerator: {}, divisor: {}",
                numerator, divisor
            )));
        }
        Ok(Self::reduce(numerator, divisor))
    }

    fn reduce(mut n: i64, mut d: i64) -> Self {
        while (!fits_i32(n) || !fits_i32(d)) && n.unsigned_abs() > 1 && d.unsigned_abs() > 1 {
            n >>= 1;
            d >>= 1;
        }
        let n = saturate(n);
        let d = saturate(d);

        // A positive divisor keeps both quotients inside the i32 range.
        let g = gcd(n.abs(), d.abs());
        if g == 0 {
            return Self::new(n as i32, d as i32);
        }
        Self::new((n / g) as i32, (d / g) as i32)
    }

    /// Finds a close rational for a floating point value
    ///
    /// Walks the Stern-Brocot tree from an integer (or unit fraction)
    /// bracket around `|value|`, keeping the closest mediant, until the error
    /// drops below `1e-8` or 100 iterations pass.
    pub fn approximate(value: f64) -> Self {
        if value.is_nan() {
            return Self::new(0, 1);
        }
        if value >= i32::MAX as f64 {
            return Self::new(i32::MAX, 1);
        }
        if value <= -(i32::MAX as f64) {
            return Self::new(-i32::MAX, 1);
        }
        if value == 0.0 {
            return Self::new(0, 1);
        }

        let negative = value < 0.0;
        let value = value.abs();

        let (low, high) = if value >= 1.0 {
            let approx = value as i64;
            if (approx as f64) < value {
                (Self::new(approx as i32, 1), Self::reduce(approx + 1, 1))
            } else {
                (Self::reduce(approx - 1, 1), Self::new(approx as i32, 1))
            }
        } else {
            let approx = (1.0 / value) as i64;
            if 1.0 / (approx as f64) < value {
                (Self::reduce(1, approx), Self::reduce(1, approx - 1))
            } else {
                (Self::reduce(1, approx.saturating_add(1)), Self::reduce(1, approx))
            }
        };

        let mut low = Candidate::new(low, value);
        let mut high = Candidate::new(high, value);
        let mut best = if low.error < high.error { low } else { high };

        let mut iterations = 0;
        while best.error > TOLERANCE && iterations < MAX_ITERATIONS {
            let mediant = Self::reduce(
                low.rational.numerator as i64 + high.rational.numerator as i64,
                low.rational.divisor as i64 + high.rational.divisor as i64,
            );
            let candidate = Candidate::new(mediant, value);

            if value < mediant.value() {
                high = candidate;
            } else {
                low = candidate;
            }

            if candidate.error < best.error {
                best = candidate;
            }
            iterations += 1;
        }

        if negative {
            best.rational.negate()
        } else {
            best.rational
        }
    }

    /// Whether the divisor is non-zero
    pub fn is_valid(&self) -> bool {
        self.divisor != 0
    }

    pub fn value(&self) -> f64 {
        self.numerator as f64 / self.divisor as f64
    }

    pub fn float_value(&self) -> f32 {
        self.numerator as f32 / self.divisor as f32
    }

    /// Integer quotient, truncated toward zero; 0 when invalid
    pub fn int_value(&self) -> i32 {
        self.numerator.checked_div(self.divisor).unwrap_or(0)
    }

    /// Negated value; `i32::MIN` numerators saturate to `i32::MAX`
    pub fn negate(&self) -> Self {
        match self.numerator.checked_neg() {
            Some(n) => Self::new(n, self.divisor),
            None => Self::new(i32::MAX, self.divisor),
        }
    }
}

impl fmt::Display for RationalNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.divisor == 0 {
            return write!(f, "Invalid rational ({}/{})", self.numerator, self.divisor);
        }
        if self.numerator.checked_rem(self.divisor) == Some(0) {
            return write!(f, "{}", self.numerator / self.divisor);
        }
        write!(f, "{}/{} ({:.3})", self.numerator, self.divisor, self.value())
    }
}

#[derive(Clone, Copy)]
struct Candidate {
    rational: RationalNumber,
    error: f64,
}

impl Candidate {
    fn new(rational: RationalNumber, value: f64) -> Self {
        Self {
            rational,
            error: (rational.value() - value).abs(),
        }
    }
}

fn fits_i32(v: i64) -> bool {
    v >= i32::MIN as i64 && v <= i32::MAX as i64
}

fn saturate(v: i64) -> i64 {
    v.clamp(i32::MIN as i64, i32::MAX as i64)
}

fn gcd(a: i64, b: i64) -> i64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_keeps_terms() {
        let r = RationalNumber::new(4, 8);
        assert_eq!(r.numerator, 4);
        assert_eq!(r.divisor, 8);
        assert!(r.is_valid());
        assert!(!RationalNumber::new(1, 0).is_valid());
    }

    #[test]
    fn test_new_safe_reduces() {
        assert_eq!(RationalNumber::new_safe(4, 8).unwrap(), RationalNumber::new(1, 2));
        assert_eq!(RationalNumber::new_safe(-6, 3).unwrap(), RationalNumber::new(-2, 1));
        assert!(RationalNumber::new_safe(5, 0).is_err());
    }

    #[test]
    fn test_new_safe_shifts_large_values() {
        let r = RationalNumber::new_safe(6_000_000_000, 3_000_000_000).unwrap();
        assert_eq!(r, RationalNumber::new(2, 1));

        let r = RationalNumber::new_safe(u32::MAX as i64, 1).unwrap();
        assert_eq!(r, RationalNumber::new(i32::MAX, 1));
    }

    #[test]
    fn test_new_safe_keeps_i32_bounds() {
        let r = RationalNumber::new_safe(i32::MIN as i64, 1).unwrap();
        assert_eq!(r, RationalNumber::new(i32::MIN, 1));
        assert_eq!(r.value(), i32::MIN as f64);

        assert_eq!(
            RationalNumber::new_safe(1, i32::MIN as i64).unwrap(),
            RationalNumber::new(1, i32::MIN)
        );
        assert_eq!(
            RationalNumber::new_safe(i32::MIN as i64, -1).unwrap(),
            RationalNumber::new(i32::MIN, -1)
        );
        assert_eq!(
            RationalNumber::new_safe(i32::MIN as i64, i32::MIN as i64).unwrap(),
            RationalNumber::new(-1, -1)
        );
        assert_eq!(
            RationalNumber::new_safe(-(1i64 << 40), 1).unwrap(),
            RationalNumber::new(i32::MIN, 1)
        );
    }

    #[test]
    fn test_approximate_specials() {
        assert_eq!(RationalNumber::approximate(0.0), RationalNumber::new(0, 1));
        assert_eq!(RationalNumber::approximate(f64::NAN), RationalNumber::new(0, 1));
        assert_eq!(RationalNumber::approximate(1e12), RationalNumber::new(i32::MAX, 1));
        assert_eq!(RationalNumber::approximate(-1e12), RationalNumber::new(-i32::MAX, 1));
    }

    #[test]
    fn test_approximate_simple_values() {
        assert_eq!(RationalNumber::approximate(0.5), RationalNumber::new(1, 2));
        assert_eq!(RationalNumber::approximate(3.0), RationalNumber::new(3, 1));
        assert_eq!(RationalNumber::approximate(-0.25), RationalNumber::new(-1, 4));
        assert_eq!(RationalNumber::approximate(2.75), RationalNumber::new(11, 4));
    }

    #[test]
    fn test_approximate_pi() {
        let r = RationalNumber::approximate(std::f64::consts::PI);
        assert!((r.value() - std::f64::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_int_value_and_negate() {
        assert_eq!(RationalNumber::new(7, 2).int_value(), 3);
        assert_eq!(RationalNumber::new(-7, 2).int_value(), -3);
        assert_eq!(RationalNumber::new(1, 0).int_value(), 0);
        assert_eq!(RationalNumber::new(3, 4).negate(), RationalNumber::new(-3, 4));
        assert_eq!(RationalNumber::new(i32::MIN, 1).negate().numerator, i32::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(RationalNumber::new(300, 1).to_string(), "300");
        assert_eq!(RationalNumber::new(1, 3).to_string(), "1/3 (0.333)");
        assert_eq!(RationalNumber::new(1, 0).to_string(), "Invalid rational (1/0)");
    }

    proptest! {
        #[test]
        fn prop_new_safe_never_yields_zero_divisor(
            n in -(2 * i32::MAX as i64)..=(2 * i32::MAX as i64),
            d in -(2 * i32::MAX as i64)..=(2 * i32::MAX as i64),
        ) {
            prop_assume!(d != 0);
            let r = RationalNumber::new_safe(n, d).unwrap();
            prop_assert!(r.divisor != 0);
        }

        #[test]
        fn prop_approximate_binary_fractions(whole in -1000i32..1000, frac in 0u32..16) {
            let v = whole as f64 + frac as f64 / 16.0;
            let r = RationalNumber::approximate(v);
            prop_assert!((r.value() - v).abs() < 1e-8);
        }

        #[test]
        fn prop_new_safe_keeps_fitting_values(n in any::<i32>(), d in any::<i32>()) {
            prop_assume!(d != 0);
            let r = RationalNumber::new_safe(n as i64, d as i64).unwrap();
            prop_assert_eq!(r.numerator as i64 * d as i64, n as i64 * r.divisor as i64);
        }

        #[test]
        fn prop_approximate_is_stable(whole in -100_000i32..100_000, d in 1i32..80, n in 0i32..80) {
            let n = n % d;
            let v = RationalNumber::new(whole * d + n, d).value();
            let r = RationalNumber::approximate(v);
            prop_assert!((r.value() - v).abs() < 1e-8);
        }
    }
}
