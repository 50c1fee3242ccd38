//! Order number checksum validation.
//!
//! Order numbers are decimal digit strings carrying a Luhn check digit. Anything that does not pass the check is
//! rejected before it reaches the database or the accrual system.

/// Returns true if `number` is a non-empty string of decimal digits with a valid Luhn checksum.
///
/// Any non-digit character (including whitespace and signs) makes the number invalid.
pub fn is_valid_order_number(number: &str) -> bool {
    if number.is_empty() {
        return false;
    }
    let mut sum = 0u32;
    for (i, c) in number.chars().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}
