//! Exact integer unit math and fixed-point to decimal conversion.
//!
//! Everything that ends up in a transaction is computed on [`U256`] with
//! explicit floor/ceil division. Decimals are used for display only.

use alloy::primitives::U256;
use fastnum::{
    UD256, bint,
    decimal::{Context, RoundingMode, UnsignedDecimal},
};

/// Precision of Set Protocol position units (`PreciseUnitMath`).
pub const PRECISE_UNIT: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// Fixed-point to decimal converter.
#[derive(Clone, Copy, Debug, Default)]
pub struct Converter {
    decimals: i32,
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    pub fn from_unsigned<const N: usize>(&self, value: U256) -> UnsignedDecimal<N> {
        let unscaled = bint::UInt::<N>::from_le_slice(value.as_le_slice())
            .expect("Converter: U256 -> UInt::<N>");
        UnsignedDecimal::<N>::from_parts(
            unscaled,
            -self.decimals,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }

    pub fn to_unsigned<const N: usize>(&self, value: UnsignedDecimal<N>) -> U256 {
        let rescaled = value.rescale(self.decimals as i16);
        U256::from_le_slice(rescaled.digits().to_radix_le(256).as_slice())
    }

    /// Parses a human readable decimal string (`"1.5"`) into base units.
    ///
    /// Returns `None` if the string is not a plain non-negative decimal
    /// (no sign, exponent or special values) or carries more fractional
    /// digits than the converter's precision.
    pub fn parse_units(&self, raw: &str) -> Option<U256> {
        let raw = raw.trim();
        let (whole, frac) = raw.split_once('.').unwrap_or((raw, "0"));
        let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !is_digits(whole) || !is_digits(frac) {
            return None;
        }
        let value = UD256::from_str(raw, Context::default()).ok()?;
        if !value.is_finite() {
            return None;
        }
        let units = self.to_unsigned(value);
        (self.from_unsigned::<4>(units) == value).then_some(units)
    }
}

/// `a * b / d` rounded down, `None` on overflow or zero divisor.
pub fn mul_div_floor(a: U256, b: U256, d: U256) -> Option<U256> {
    if d.is_zero() {
        return None;
    }
    a.checked_mul(b).map(|n| n / d)
}

/// `a * b / d` rounded up, `None` on overflow or zero divisor.
pub fn mul_div_ceil(a: U256, b: U256, d: U256) -> Option<U256> {
    if d.is_zero() {
        return None;
    }
    let (q, r) = a.checked_mul(b)?.div_rem(d);
    if r.is_zero() { Some(q) } else { q.checked_add(U256::from(1)) }
}

/// Renders a fixed-point integer with exactly `decimals` fractional digits.
pub fn format_fixed(value: U256, decimals: u8) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let scale = U256::from(10).pow(U256::from(decimals));
    let (whole, frac) = value.div_rem(scale);
    format!(
        "{whole}.{frac:0>width$}",
        frac = frac.to_string(),
        width = decimals as usize
    )
}

/// Converts a price reported as a float by an external service.
/// Negative and non-finite values become zero.
pub fn decimal_from_f64(value: f64) -> UD256 {
    if !value.is_finite() || value <= 0.0 {
        return UD256::ZERO;
    }
    UD256::from_str(&value.to_string(), Context::default()).unwrap_or(UD256::ZERO)
}
