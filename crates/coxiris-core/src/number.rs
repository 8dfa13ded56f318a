//! Numeric parameter validation.
//!
//! Command parameters are plain signed decimals: an optional `+`/`-`, then
//! digits with at most one decimal point. Exponents, separators and embedded
//! whitespace are rejected before any conversion takes place.

/// Returns `true` if `token` is a well-formed signed decimal number.
///
/// At least one digit is required somewhere after the sign, so `"3."` and
/// `".5"` pass while `"-"` and `"."` do not.
pub fn is_valid_number(token: &str) -> bool {
    let digits = token
        .strip_prefix(['+', '-'])
        .unwrap_or(token)
        .as_bytes();

    let mut has_digit = false;
    let mut has_point = false;

    for &byte in digits {
        match byte {
            b'0'..=b'9' => has_digit = true,
            b'.' if !has_point => has_point = true,
            _ => return false,
        }
    }

    has_digit
}

/// Validate and convert a parameter token.
///
/// Returns `None` when the token fails [`is_valid_number`].
pub fn parse_number(token: &str) -> Option<f64> {
    if !is_valid_number(token) {
        return None;
    }
    token.parse::<f64>().ok()
}
