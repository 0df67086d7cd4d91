//! Card number utilities: Luhn checksum, brand classification, masking.
//!
//! Brand classification matches leading digits against well-known ranges.
//! It is a display hint, not authoritative BIN data.

use openpay_types::constants::{PAN_MASK_PREFIX, PAN_VISIBLE_SUFFIX};
use openpay_types::CardBrand;

/// Validate a PAN with the Luhn checksum.
///
/// Processes digits right-to-left, doubling every second digit and
/// subtracting 9 when the doubled value exceeds 9; valid iff the sum is
/// divisible by 10. Empty strings and strings containing non-digits fail.
#[must_use]
pub fn luhn(digits: &str) -> bool {
    if digits.is_empty() {
        return false;
    }

    let mut sum: u32 = 0;
    let mut double = false;
    for c in digits.chars().rev() {
        let Some(d) = c.to_digit(10) else {
            return false;
        };
        let mut d = d;
        if double {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
        double = !double;
    }
    sum % 10 == 0
}

/// Classify the card brand from the leading digits.
///
/// Ranges covered:
/// - Visa: prefix 4, 13–19 digits
/// - Amex: prefix 34 or 37, 15 digits
/// - Mastercard: prefix 51–55 or 2221–2720, 16 digits
/// - Discover: prefix 6011 or 65, 16 digits
/// - anything else: [`CardBrand::Unknown`]
#[must_use]
pub fn brand(pan: &str) -> CardBrand {
    if !pan.chars().all(|c| c.is_ascii_digit()) {
        return CardBrand::Unknown;
    }
    let len = pan.len();

    if pan.starts_with('4') && (13..=19).contains(&len) {
        return CardBrand::Visa;
    }
    if (pan.starts_with("34") || pan.starts_with("37")) && len == 15 {
        return CardBrand::Amex;
    }
    if len == 16 {
        if let Some(p2) = prefix_value(pan, 2) {
            if (51..=55).contains(&p2) {
                return CardBrand::Mastercard;
            }
        }
        if let Some(p4) = prefix_value(pan, 4) {
            if (2221..=2720).contains(&p4) {
                return CardBrand::Mastercard;
            }
            if p4 == 6011 {
                return CardBrand::Discover;
            }
        }
        if pan.starts_with("65") {
            return CardBrand::Discover;
        }
    }
    CardBrand::Unknown
}

/// Mask a PAN for display: a fixed 12-char `*` prefix plus the last four
/// digits, independent of the input length.
///
/// A PAN shorter than four digits is returned behind the mask unchanged.
#[must_use]
pub fn masked(pan: &str) -> String {
    let suffix = if pan.len() >= PAN_VISIBLE_SUFFIX {
        &pan[pan.len() - PAN_VISIBLE_SUFFIX..]
    } else {
        pan
    };
    format!("{PAN_MASK_PREFIX}{suffix}")
}

fn prefix_value(pan: &str, n: usize) -> Option<u32> {
    pan.get(..n)?.parse().ok()
}
