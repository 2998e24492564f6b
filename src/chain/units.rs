//! Exact wei / pht fixed-point conversion
//!
//! pht is the human display unit, wei the smallest on-chain unit
//! (1 pht = 10^18 wei). Conversions are pure integer arithmetic on U256;
//! floating point never touches a chain-bound value.

use alloy::primitives::U256;

use crate::types::{LightstreamsError, Result};

/// Decimal places between wei and pht
const PHT_DECIMALS: usize = 18;

fn wei_per_pht() -> U256 {
    U256::from(1_000_000_000_000_000_000u64)
}

/// Render a wei amount as an exact pht decimal string
pub fn wei_to_pht(wei: U256) -> String {
    let unit = wei_per_pht();
    let whole = wei / unit;
    let fraction = wei % unit;

    if fraction.is_zero() {
        return whole.to_string();
    }

    let mut digits = fraction.to_string();
    while digits.len() < PHT_DECIMALS {
        digits.insert(0, '0');
    }
    while digits.ends_with('0') {
        digits.pop();
    }

    format!("{}.{}", whole, digits)
}

/// Parse a pht decimal string into an exact wei amount
///
/// Rejects more than 18 fractional digits rather than rounding.
pub fn pht_to_wei(pht: &str) -> Result<U256> {
    let bad = |detail: &str| LightstreamsError::BadInput(format!("Invalid pht amount: {}", detail));

    let (whole, fraction) = match pht.split_once('.') {
        Some((w, f)) => (w, f),
        None => (pht, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(bad("empty value"));
    }
    if fraction.len() > PHT_DECIMALS {
        return Err(bad("more than 18 decimal places"));
    }

    let whole = if whole.is_empty() { "0" } else { whole };
    let whole = U256::from_str_radix(whole, 10).map_err(|_| bad("not a decimal number"))?;

    let mut padded = fraction.to_string();
    while padded.len() < PHT_DECIMALS {
        padded.push('0');
    }
    let fraction = U256::from_str_radix(&padded, 10).map_err(|_| bad("not a decimal number"))?;

    whole
        .checked_mul(wei_per_pht())
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(|| bad("amount out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wei_to_pht_exact() {
        let wei = U256::from(1_234_567_890_000_000_000u64);
        assert_eq!(wei_to_pht(wei), "1.23456789");
    }

    #[test]
    fn test_whole_values_have_no_decimal_point() {
        assert_eq!(wei_to_pht(U256::ZERO), "0");
        assert_eq!(wei_to_pht(U256::from(2_000_000_000_000_000_000u64)), "2");
    }

    #[test]
    fn test_smallest_fraction() {
        assert_eq!(wei_to_pht(U256::from(1u64)), "0.000000000000000001");
    }

    #[test]
    fn test_round_trip_whole_pht_lossless() {
        for value in ["1", "42", "1000000"] {
            let wei = pht_to_wei(value).unwrap();
            assert_eq!(wei_to_pht(wei), value);
        }
    }

    #[test]
    fn test_round_trip_fractional() {
        let wei = pht_to_wei("1.23456789").unwrap();
        assert_eq!(wei, U256::from(1_234_567_890_000_000_000u64));
        assert_eq!(wei_to_pht(wei), "1.23456789");
    }

    #[test]
    fn test_bare_fraction() {
        assert_eq!(pht_to_wei(".5").unwrap(), U256::from(500_000_000_000_000_000u64));
    }

    #[test]
    fn test_too_many_decimals_rejected() {
        assert!(pht_to_wei("1.0000000000000000001").is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(pht_to_wei("").is_err());
        assert!(pht_to_wei("abc").is_err());
        assert!(pht_to_wei("1.2.3").is_err());
        assert!(pht_to_wei("-1").is_err());
    }
}
