use ethers::types::{I256, U256};
use ethers::utils::{format_units, parse_units, ParseUnits};
use thiserror::Error;

/// Decimals of the chain's native currency (1 ETH = 10^18 wei).
pub const ETHER_DECIMALS: usize = 18;

/// Longest whole part that cannot overflow U256 once scaled by 10^18
const MAX_WHOLE_DIGITS: usize = 59;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitsError {
    #[error("Amount cannot be empty")]
    Empty,
    #[error("Malformed amount: {0}")]
    Malformed(String),
    #[error("Amount must be greater than zero")]
    NonPositive,
    #[error("Too many decimal places: {found} (maximum {max})")]
    TooManyDecimals { found: usize, max: usize },
    #[error("Amount exceeds uint256 maximum")]
    Overflow,
}

/// Parses a decimal ETH string ("1", "0.25", ".5") into wei.
///
/// Conversion is done by `ethers::utils::parse_units`; this adds the checks
/// it leaves out: empty or signed input, fractions finer than one wei,
/// whole parts that would overflow, and zero.
pub fn parse_eth_amount(amount: &str) -> Result<U256, UnitsError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(UnitsError::Empty);
    }
    if amount.starts_with('-') {
        return Err(UnitsError::NonPositive);
    }
    if amount.starts_with('+') || amount.contains('_') {
        return Err(UnitsError::Malformed(amount.to_string()));
    }

    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    if fraction.len() > ETHER_DECIMALS {
        return Err(UnitsError::TooManyDecimals { found: fraction.len(), max: ETHER_DECIMALS });
    }
    if whole.trim_start_matches('0').len() > MAX_WHOLE_DIGITS {
        return Err(UnitsError::Overflow);
    }

    let wei = match parse_units(amount, "ether") {
        Ok(ParseUnits::U256(wei)) => wei,
        Ok(ParseUnits::I256(_)) => return Err(UnitsError::NonPositive),
        Err(_) => return Err(UnitsError::Malformed(amount.to_string())),
    };
    if wei.is_zero() {
        return Err(UnitsError::NonPositive);
    }
    Ok(wei)
}

/// Formats wei as an ETH decimal string with trailing zeros removed but at
/// least one fractional digit ("1.0", "0.5", "12.000000000000000001").
pub fn format_eth(wei: U256) -> String {
    match format_units(wei, "ether") {
        Ok(formatted) => trim_fraction(&formatted),
        Err(_) => wei.to_string(),
    }
}

/// Formats a signed price-feed answer with `decimals` fractional digits,
/// e.g. 200000000000 with 8 decimals is "2000.00000000".
pub fn format_price(answer: I256, decimals: u8) -> String {
    format_units(answer, decimals as u32).unwrap_or_else(|_| answer.to_string())
}

fn trim_fraction(formatted: &str) -> String {
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted, ""));
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, fraction)
    }
}
