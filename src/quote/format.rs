//! Human readable rendering of quote values.

use fastnum::{D256, UD256};
use itertools::Itertools;

use crate::num::{Converter, format_fixed};

/// USD value with two decimals and thousands separators, `$1,234.56`.
pub fn usd(value: UD256) -> String {
    let cents = format_fixed(Converter::new(2).to_unsigned(value), 2);
    let (whole, frac) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));
    format!("${}.{frac}", group_thousands(whole))
}

/// Native currency amount with six decimals, `0.012345 ETH`.
pub fn chain_currency(value: UD256, symbol: &str) -> String {
    format!("{} {symbol}", format_fixed(Converter::new(6).to_unsigned(value), 6))
}

/// Percentage with two decimals, negative values are signed: `2.00%`, `-1.25%`.
pub fn percentage(value: D256) -> String {
    let hundredths = Converter::new(2).to_unsigned(value.unsigned_abs());
    let sign = if value.is_negative() && !hundredths.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{}%", format_fixed(hundredths, 2))
}

fn group_thousands(digits: &str) -> String {
    digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk))
        .join(",")
}
