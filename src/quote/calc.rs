//! Pure unit calculations of the trade quote.
//!
//! Amounts are token base units, units are base units per one whole Set
//! token. Rounding follows the trade module: debits round up, credits
//! round down.

use alloy::primitives::U256;
use fastnum::{D256, UD64, UD256, dec256, udec64};

use crate::{
    error::{DustPosition, InputError, QuoteError},
    num::{self, PRECISE_UNIT},
};

/// Smallest position, in base units, a trade may leave or create.
pub const DEFAULT_DUST_THRESHOLD: U256 = U256::from_limbs([50, 0, 0, 0]);

/// Gas of the trade module call on top of the swap itself.
pub const DEFAULT_GAS_OVERHEAD: u64 = 150_000;

/// Buffer applied to the total gas estimate, in percent.
pub const DEFAULT_GAS_BUFFER_PERCENT: u64 = 5;

/// Maximum amount of a component that can be traded out of a Set.
///
/// `max = unit * total_supply / 1e18`
pub fn implied_max_notional(unit: U256, total_supply: U256) -> Option<U256> {
    num::mul_div_floor(unit, total_supply, PRECISE_UNIT)
}

/// Rounds the amount down to a whole number of per-Set units.
///
/// `amount = floor(floor(amount * 1e18 / total_supply) * total_supply / 1e18)`
pub fn quantize(amount: U256, total_supply: U256) -> Option<U256> {
    let units = num::mul_div_floor(amount, PRECISE_UNIT, total_supply)?;
    num::mul_div_floor(units, total_supply, PRECISE_UNIT)
}

/// Bounds the requested amount by the Set's position.
///
/// An amount equal to the whole position drains it and is kept as is,
/// smaller amounts are quantized with [`quantize`].
pub fn bound_amount(amount: U256, unit: U256, total_supply: U256) -> Result<U256, QuoteError> {
    let available = implied_max_notional(unit, total_supply).ok_or(QuoteError::Overflow)?;
    if total_supply.is_zero() || amount > available {
        return Err(QuoteError::Capacity {
            requested: amount,
            available,
        });
    }
    if amount == available {
        return Ok(amount);
    }
    let quantized = quantize(amount, total_supply).ok_or(QuoteError::Overflow)?;
    if quantized.is_zero() {
        return Err(InputError::ZeroAmount.into());
    }
    Ok(quantized)
}

/// Units debited per Set for selling `sell_amount`, rounded up.
pub fn from_units(sell_amount: U256, total_supply: U256) -> Option<U256> {
    num::mul_div_ceil(sell_amount, PRECISE_UNIT, total_supply)
}

/// Share of the bought amount kept after the slippage tolerance, per mille.
///
/// `floor(1000 * (100 - slippage) / 100)`
pub fn tolerance_permille(slippage_percentage: UD64) -> Result<U256, InputError> {
    if slippage_percentage.is_nan() || slippage_percentage > udec64!(100) {
        return Err(InputError::InvalidPercentage("slippage"));
    }
    // Percent scaled by 1e4
    let scaled = num::Converter::new(4).to_unsigned(slippage_percentage);
    Ok((U256::from(1_000_000) - scaled) / U256::from(1_000))
}

/// Units credited per Set for buying `buy_amount`, after the tolerance, rounded down.
pub fn to_units(buy_amount: U256, total_supply: U256, permille: U256) -> Option<U256> {
    let tolerated = num::mul_div_floor(buy_amount, permille, U256::from(1_000))?;
    num::mul_div_floor(tolerated, PRECISE_UNIT, total_supply)
}

/// Checks the positions left after the trade against the dust threshold.
///
/// Returns the remaining units of the sold component and the new units of the bought one.
pub fn check_dust(
    current_from_unit: U256,
    from_units: U256,
    current_to_unit: U256,
    to_units: U256,
    threshold: U256,
) -> Result<(U256, U256), QuoteError> {
    let remaining = current_from_unit
        .checked_sub(from_units)
        .ok_or(QuoteError::Capacity {
            requested: from_units,
            available: current_from_unit,
        })?;
    if !remaining.is_zero() && remaining < threshold {
        return Err(QuoteError::Dust {
            position: DustPosition::Remaining,
            units: remaining,
            threshold,
        });
    }

    let new_to_units = current_to_unit
        .checked_add(to_units)
        .ok_or(QuoteError::Overflow)?;
    if !new_to_units.is_zero() && new_to_units < threshold {
        return Err(QuoteError::Dust {
            position: DustPosition::New,
            units: new_to_units,
            threshold,
        });
    }

    Ok((remaining, new_to_units))
}

/// Total gas of the trade, `floor((swap_gas + overhead) * (100 + buffer) / 100)`.
pub fn estimate_gas(swap_gas: u64, overhead: u64, buffer_percent: u64) -> Option<u64> {
    swap_gas
        .checked_add(overhead)?
        .checked_mul(buffer_percent.checked_add(100)?)
        .map(|gas| gas / 100)
}

/// Realized slippage between the values of sold and bought amounts, in percent.
pub fn realized_slippage(from_value: UD256, to_value: UD256) -> D256 {
    if from_value == UD256::ZERO {
        return D256::ZERO;
    }
    let from_value = from_value.to_signed();
    (from_value - to_value.to_signed()) / from_value * dec256!(100)
}

#[cfg(test)]
mod tests {
    use fastnum::{decimal::Context, udec256};

    use super::*;

    fn sets(n: u64) -> U256 {
        U256::from(n) * PRECISE_UNIT
    }

    // ==================== bound_amount() tests ====================

    #[test]
    fn test_quantized_amount_is_exact_for_whole_supplies() {
        for total_supply in [sets(1), sets(3), sets(125), sets(1_000_000)] {
            for amount in [1u64, 7, 999_999, 123_456_789, 10_000_000_000] {
                let quantized = quantize(U256::from(amount), total_supply).unwrap();
                assert!(quantized <= U256::from(amount));
                assert!(
                    (quantized * PRECISE_UNIT % total_supply).is_zero(),
                    "amount: {amount}, total supply: {total_supply}"
                );
            }
        }
    }

    #[test]
    fn test_quantize_rounds_down_to_unit_multiple() {
        // 3 sets, 10 base units -> 3 units per set -> 9 base units
        assert_eq!(quantize(U256::from(10), sets(3)), Some(U256::from(9)));
        // 2.5 sets
        let total_supply = U256::from(2_500_000_000_000_000_000u128);
        assert_eq!(
            quantize(U256::from(1_000_001), total_supply),
            Some(U256::from(1_000_000))
        );
    }

    #[test]
    fn test_full_drain_is_not_over_capacity() {
        // 50 USDC per set, 10 sets
        let (unit, total_supply) = (U256::from(50_000_000), sets(10));
        assert_eq!(
            bound_amount(U256::from(500_000_000), unit, total_supply).unwrap(),
            U256::from(500_000_000)
        );
    }

    #[test]
    fn test_full_drain_with_fractional_supply_is_kept_as_is() {
        // 7 base units per set, 1.5 sets -> 10.5 floored to 10
        let (unit, total_supply) = (U256::from(7), U256::from(1_500_000_000_000_000_000u128));
        assert_eq!(implied_max_notional(unit, total_supply), Some(U256::from(10)));
        // Quantization would have produced 9
        assert_eq!(quantize(U256::from(10), total_supply), Some(U256::from(9)));
        assert_eq!(
            bound_amount(U256::from(10), unit, total_supply).unwrap(),
            U256::from(10)
        );
    }

    #[test]
    fn test_amount_over_capacity() {
        let (unit, total_supply) = (U256::from(50_000_000), sets(10));
        assert!(matches!(
            bound_amount(U256::from(500_000_001), unit, total_supply),
            Err(QuoteError::Capacity { requested, available })
                if requested == U256::from(500_000_001) && available == U256::from(500_000_000)
        ));
    }

    #[test]
    fn test_empty_set_has_no_capacity() {
        assert!(matches!(
            bound_amount(U256::from(1), U256::from(1_000), U256::ZERO),
            Err(QuoteError::Capacity { available, .. }) if available.is_zero()
        ));
    }

    #[test]
    fn test_amount_quantized_to_zero() {
        // 1000 sets, a single base unit is less than one unit per set
        assert!(matches!(
            bound_amount(U256::from(1), U256::from(1_000), sets(1_000)),
            Err(QuoteError::Input(InputError::ZeroAmount))
        ));
    }

    // ==================== from_units() / to_units() tests ====================

    #[test]
    fn test_from_units_rounds_up() {
        let supplies = [
            sets(1),
            sets(3),
            U256::from(7),
            U256::from(1_234_567_890_123_456_789u128),
        ];
        for total_supply in supplies {
            for sell in [1u64, 2, 99, 1_000_003, 987_654_321_987] {
                let sell = U256::from(sell);
                let units = from_units(sell, total_supply).unwrap();
                assert!(units * total_supply >= sell * PRECISE_UNIT);
                assert!((units - U256::from(1)) * total_supply < sell * PRECISE_UNIT);
            }
        }
    }

    #[test]
    fn test_tolerance_permille() {
        assert_eq!(tolerance_permille(udec64!(2)).unwrap(), U256::from(980));
        assert_eq!(tolerance_permille(udec64!(0.5)).unwrap(), U256::from(995));
        assert_eq!(tolerance_permille(udec64!(0.25)).unwrap(), U256::from(997));
        assert_eq!(tolerance_permille(udec64!(0)).unwrap(), U256::from(1000));
        assert_eq!(tolerance_permille(udec64!(100)).unwrap(), U256::ZERO);
        for invalid in [
            udec64!(100.5),
            UD64::from_str("NaN", Context::default()).unwrap(),
            UD64::from_str("Infinity", Context::default()).unwrap(),
        ] {
            assert!(matches!(
                tolerance_permille(invalid),
                Err(InputError::InvalidPercentage("slippage"))
            ));
        }
    }

    #[test]
    fn test_to_units_applies_tolerance_and_rounds_down() {
        // 0.05 WETH bought for 10 sets at 2% tolerance
        assert_eq!(
            to_units(
                U256::from(50_000_000_000_000_000u64),
                sets(10),
                U256::from(980)
            ),
            Some(U256::from(4_900_000_000_000_000u64))
        );
        // 10 * 0.98 = 9.8 -> 9, then 9 / 3 sets = 3
        assert_eq!(to_units(U256::from(10), sets(3), U256::from(980)), Some(U256::from(3)));
        assert_eq!(to_units(U256::from(7), sets(3), U256::from(1000)), Some(U256::from(2)));
    }

    // ==================== check_dust() tests ====================

    #[test]
    fn test_remaining_position_below_threshold() {
        let threshold = DEFAULT_DUST_THRESHOLD;
        for from_units in [60u64, 55] {
            assert!(matches!(
                check_dust(U256::from(100), U256::from(from_units), U256::ZERO, U256::from(1_000), threshold),
                Err(QuoteError::Dust { position: DustPosition::Remaining, units, .. })
                    if units == U256::from(100 - from_units)
            ));
        }
        assert_eq!(
            check_dust(U256::from(100), U256::from(30), U256::ZERO, U256::from(1_000), threshold)
                .unwrap(),
            (U256::from(70), U256::from(1_000))
        );
    }

    #[test]
    fn test_fully_drained_position_is_not_dust() {
        assert_eq!(
            check_dust(
                U256::from(100),
                U256::from(100),
                U256::ZERO,
                U256::from(1_000),
                DEFAULT_DUST_THRESHOLD
            )
            .unwrap(),
            (U256::ZERO, U256::from(1_000))
        );
    }

    #[test]
    fn test_debit_over_position() {
        assert!(matches!(
            check_dust(U256::from(100), U256::from(101), U256::ZERO, U256::from(1_000), DEFAULT_DUST_THRESHOLD),
            Err(QuoteError::Capacity { .. })
        ));
    }

    #[test]
    fn test_new_position_below_threshold() {
        assert!(matches!(
            check_dust(U256::from(100), U256::from(30), U256::ZERO, U256::from(49), DEFAULT_DUST_THRESHOLD),
            Err(QuoteError::Dust { position: DustPosition::New, .. })
        ));
        // Existing position tops the new units up
        assert!(
            check_dust(U256::from(100), U256::from(30), U256::from(10), U256::from(40), DEFAULT_DUST_THRESHOLD)
                .is_ok()
        );
        // Nothing bought into nothing held
        assert!(
            check_dust(U256::from(100), U256::from(30), U256::ZERO, U256::ZERO, DEFAULT_DUST_THRESHOLD)
                .is_ok()
        );
    }

    #[test]
    fn test_configurable_threshold() {
        assert!(
            check_dust(U256::from(100), U256::from(60), U256::ZERO, U256::from(1_000), U256::from(10))
                .is_ok()
        );
    }

    // ==================== estimate_gas() tests ====================

    #[test]
    fn test_estimate_gas() {
        assert_eq!(
            estimate_gas(80_000, DEFAULT_GAS_OVERHEAD, DEFAULT_GAS_BUFFER_PERCENT),
            Some(241_500)
        );
        // 150_001 * 1.05 = 157_501.05
        assert_eq!(estimate_gas(1, DEFAULT_GAS_OVERHEAD, DEFAULT_GAS_BUFFER_PERCENT), Some(157_501));
        assert_eq!(estimate_gas(u64::MAX, DEFAULT_GAS_OVERHEAD, DEFAULT_GAS_BUFFER_PERCENT), None);
    }

    // ==================== realized_slippage() tests ====================

    #[test]
    fn test_realized_slippage() {
        assert_eq!(realized_slippage(udec256!(100), udec256!(99)), dec256!(1));
        assert_eq!(realized_slippage(udec256!(100), udec256!(102.5)), dec256!(-2.5));
        assert_eq!(realized_slippage(UD256::ZERO, udec256!(5)), D256::ZERO);
    }
}
