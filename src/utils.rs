//! Unit conversion and format checks shared by the extractor, the executors
//! and the formatter.

use ethers_core::types::U256;
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{from_value, Value};

use crate::error::{ActionError, ActionResult};
use crate::mcp::protocol::{error_codes, Response};

lazy_static! {
    static ref ADDRESS_RE: Regex = Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("static regex");
    static ref TX_HASH_RE: Regex = Regex::new(r"^0x[a-fA-F0-9]{64}$").expect("static regex");
    static ref AMOUNT_RE: Regex = Regex::new(r"^\d+(\.\d+)?$").expect("static regex");
}

/// Largest precision the converters accept; 10^77 is the biggest power of ten in a U256.
pub const MAX_DECIMALS: u32 = 77;

pub fn is_address(value: &str) -> bool {
    ADDRESS_RE.is_match(value)
}

pub fn is_tx_hash(value: &str) -> bool {
    TX_HASH_RE.is_match(value)
}

pub fn is_amount(value: &str) -> bool {
    AMOUNT_RE.is_match(value)
}

fn pow10(exp: u32) -> U256 {
    U256::exp10(exp as usize)
}

/// Converts a human decimal string into base units using exact integer math.
///
/// Trailing fractional zeros beyond the precision are accepted ("1.500" at
/// two decimals); any other digit beyond it is rejected rather than rounded.
pub fn parse_units(amount: &str, decimals: u32) -> ActionResult<U256> {
    let amount = amount.trim();
    if !is_amount(amount) {
        return Err(ActionError::invalid(
            "amount",
            format!("'{}' is not a decimal number", amount),
        ));
    }
    if decimals > MAX_DECIMALS {
        return Err(ActionError::invalid(
            "decimals",
            format!("precision {} is out of range", decimals),
        ));
    }

    let (whole, fraction) = match amount.split_once('.') {
        Some((w, f)) => (w, f.trim_end_matches('0')),
        None => (amount, ""),
    };
    if fraction.len() > decimals as usize {
        return Err(ActionError::invalid(
            "amount",
            format!("'{}' has more than {} decimal places", amount, decimals),
        ));
    }

    let overflow = || ActionError::invalid("amount", format!("'{}' is too large", amount));
    let whole = U256::from_dec_str(whole).map_err(|_| overflow())?;
    let padded = format!("{:0<width$}", fraction, width = decimals as usize);
    let fraction = if padded.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(&padded).map_err(|_| overflow())?
    };

    whole
        .checked_mul(pow10(decimals))
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(overflow)
}

/// Renders base units as a display decimal with trailing zeros trimmed.
/// Precision beyond `MAX_DECIMALS` falls back to raw units.
pub fn format_units(value: U256, decimals: u32) -> String {
    if decimals == 0 || decimals > MAX_DECIMALS {
        return value.to_string();
    }
    let divisor = pow10(decimals);
    let whole = value / divisor;
    let fraction = format!(
        "{:0>width$}",
        (value % divisor).to_string(),
        width = decimals as usize
    );
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// Renders base units with exactly `places` fractional digits, rounding half up.
pub fn format_units_fixed(value: U256, decimals: u32, places: u32) -> String {
    if decimals > MAX_DECIMALS || places > MAX_DECIMALS {
        return value.to_string();
    }
    let scaled = if places >= decimals {
        value.saturating_mul(pow10(places - decimals))
    } else {
        let step = pow10(decimals - places);
        value.saturating_add(step / 2) / step
    };
    if places == 0 {
        return scaled.to_string();
    }
    let unit = pow10(places);
    format!(
        "{}.{:0>width$}",
        scaled / unit,
        (scaled % unit).to_string(),
        width = places as usize
    )
}

/// Inserts thousands separators into the integer part of a number string.
/// Anything that is not a plain number comes back unchanged.
pub fn group_thousands(raw: &str) -> String {
    let (int_part, rest) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw, None),
    };
    if int_part.is_empty() || !int_part.chars().all(|c| c.is_ascii_digit()) {
        return raw.to_string();
    }
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    match rest {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    }
}

/// Helper function to extract a required argument from a JSON-RPC params object
pub fn get_required_arg<T: DeserializeOwned>(
    args: &Value,
    key: &str,
    req_id: &Value,
) -> Result<T, Response> {
    from_value(args.get(key).cloned().unwrap_or(Value::Null)).map_err(|_| {
        Response::error(
            req_id.clone(),
            error_codes::INVALID_PARAMS,
            format!("Missing or invalid required argument: '{}'", key),
        )
    })
}
