//! Luhn checksum for card-like numbers
//!
//! <https://en.wikipedia.org/wiki/Luhn_algorithm>

/// Checks a number with the Luhn algorithm.
///
/// Characters that are not ASCII digits (spaces, hyphens) are skipped, and only
/// digits advance the doubling position. Walking right to left, the rightmost
/// digit is taken as is, the one before it is doubled, and so on; a doubled
/// value above 9 has 9 subtracted.
///
/// A digit sum of zero is rejected, so `"0000"` is not a valid number.
pub fn is_valid_luhn(number: &str) -> bool {
    let mut sum: u64 = 0;
    let mut double = false;

    for digit in number.chars().rev().filter_map(|c| c.to_digit(10)) {
        let value = if double {
            let doubled = digit * 2;
            if doubled > 9 {
                doubled - 9
            } else {
                doubled
            }
        } else {
            digit
        };

        double = !double;
        sum += u64::from(value);
    }

    sum != 0 && sum % 10 == 0
}
