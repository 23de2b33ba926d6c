//! Normalisation of raw feed values into publishable numbers.
//!
//! Both functions are pure; they log at debug level only so a full feed
//! pass stays quiet.

use log::debug;

use crate::error::{Result, SyncError};

/// Feed marker for "more than ten in stock"
pub const PLENTIFUL_DESCRIPTOR: &str = ">10";
/// Count published for [`PLENTIFUL_DESCRIPTOR`]
pub const PLENTIFUL_COUNT: u32 = 100;
/// Feed marker for a single reserved unit, published as unavailable
pub const RESERVED_DESCRIPTOR: &str = "1";

/// Maps a feed quantity descriptor to the count published on a marketplace.
///
/// - `">10"` -> 100
/// - `"1"` -> 0 (the last unit is held back for the shop floor)
/// - anything else is parsed as a base-10 integer
pub fn normalize_quantity(descriptor: &str) -> Result<u32> {
    let count = match descriptor {
        PLENTIFUL_DESCRIPTOR => PLENTIFUL_COUNT,
        RESERVED_DESCRIPTOR => 0,
        other => other
            .trim()
            .parse::<u32>()
            .map_err(|_| SyncError::InvalidQuantity(descriptor.to_string()))?,
    };
    debug!("Quantity '{descriptor}' -> {count}");
    Ok(count)
}

/// Extracts the whole-unit price from a free-text feed price.
///
/// Takes everything before the first `.`, drops every non-digit and reads
/// the rest as an integer, so `"5'990.00 руб."` becomes 5990.
pub fn normalize_price(price_text: &str) -> Result<u64> {
    let whole = price_text.split('.').next().unwrap_or_default();
    let digits: String = whole.chars().filter(char::is_ascii_digit).collect();

    if digits.is_empty() {
        return Err(SyncError::InvalidPrice(price_text.to_string()));
    }

    let value = digits
        .parse::<u64>()
        .map_err(|_| SyncError::InvalidPrice(price_text.to_string()))?;
    debug!("Price '{price_text}' -> {value}");
    Ok(value)
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
