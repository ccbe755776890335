//! Numeric text normalization across regional decimal conventions.
//!
//! Page text may write the same quantity as "1.234,56" or "1,234.56".
//! Both normalize to the canonical string "1234.56"; all comparisons in
//! the monitor happen on canonical strings, never on raw page text.

use crate::error::ValueError;
use regex_lite::Regex;
use std::sync::LazyLock;

/// Signed digits with separator groups; every separator must have a
/// digit on both sides, so "1..2" and "5." are rejected.
static NUMBER_GRAMMAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+(?:[.,]\d+)*$").unwrap());

/// Normalizes numeric text into its canonical decimal representation.
///
/// Currency symbols, whitespace, and any other decoration are stripped
/// first. The last `.` or `,` is taken as the decimal separator; all
/// earlier separators are treated as grouping and removed.
pub fn normalize(text: &str) -> Result<String, ValueError> {
    let stripped: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '+' | '-'))
        .collect();

    if !NUMBER_GRAMMAR.is_match(&stripped) {
        return Err(ValueError::InvalidFormat(text.trim().to_string()));
    }

    let (sign, digits) = match stripped.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", stripped.trim_start_matches('+')),
    };

    let (int_part, frac_part) = match digits.rfind(['.', ',']) {
        Some(pos) => (&digits[..pos], &digits[pos + 1..]),
        None => (digits, ""),
    };

    let int_part: String = int_part.chars().filter(|c| c.is_ascii_digit()).collect();
    let int_part = int_part.trim_start_matches('0');
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let frac_part = frac_part.trim_end_matches('0');

    let canonical = if frac_part.is_empty() {
        int_part.to_string()
    } else {
        format!("{}.{}", int_part, frac_part)
    };

    if canonical == "0" {
        return Ok(canonical);
    }
    Ok(format!("{}{}", sign, canonical))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_period_decimal() {
        assert_eq!(normalize("29.99").unwrap(), "29.99");
        assert_eq!(normalize("1,234.56").unwrap(), "1234.56");
        assert_eq!(normalize("10").unwrap(), "10");
        assert_eq!(normalize("0.99").unwrap(), "0.99");
    }

    #[test]
    fn test_normalize_comma_decimal() {
        assert_eq!(normalize("29,99").unwrap(), "29.99");
        assert_eq!(normalize("1.234,56").unwrap(), "1234.56");
        assert_eq!(normalize("0,99").unwrap(), "0.99");
        assert_eq!(normalize("3,1415").unwrap(), "3.1415");
    }

    #[test]
    fn test_both_conventions_agree() {
        assert_eq!(normalize("1.234,56").unwrap(), normalize("1,234.56").unwrap());
        assert_eq!(normalize("29,99").unwrap(), normalize("29.99").unwrap());
        assert_eq!(normalize("1.234.567,89").unwrap(), normalize("1,234,567.89").unwrap());
    }

    #[test]
    fn test_formatting_only_differences_collapse() {
        assert_eq!(normalize("100").unwrap(), normalize("100.0").unwrap());
        assert_eq!(normalize("100").unwrap(), normalize("100,00").unwrap());
        assert_eq!(normalize("007").unwrap(), "7");
        assert_eq!(normalize("5.10").unwrap(), "5.1");
    }

    #[test]
    fn test_normalize_signs() {
        assert_eq!(normalize("-3,14").unwrap(), "-3.14");
        assert_eq!(normalize("-10").unwrap(), "-10");
        assert_eq!(normalize("+42").unwrap(), "42");
        assert_eq!(normalize("-0,0").unwrap(), "0");
    }

    #[test]
    fn test_normalize_strips_decoration() {
        assert_eq!(normalize("R$5.000,00").unwrap(), "5000");
        assert_eq!(normalize("$1,234.56").unwrap(), "1234.56");
        assert_eq!(normalize("  29,99 \u{20ac} ").unwrap(), "29.99");
        assert_eq!(normalize("1 234,56").unwrap(), "1234.56");
    }

    #[test]
    fn test_last_separator_is_decimal() {
        // A single separator is always read as the decimal mark.
        assert_eq!(normalize("1,234").unwrap(), "1.234");
        assert_eq!(normalize("1.234").unwrap(), "1.234");
    }

    #[test]
    fn test_invalid_no_digits() {
        assert!(normalize("").is_err());
        assert!(normalize("   ").is_err());
        assert!(normalize("N/A").is_err());
        assert!(normalize("--").is_err());
    }

    #[test]
    fn test_invalid_separator_sequences() {
        assert!(normalize("1..2").is_err());
        assert!(normalize("1,,2").is_err());
        assert!(normalize("5.").is_err());
        assert!(normalize(",5").is_err());
        assert!(normalize("1.,2").is_err());
    }

    #[test]
    fn test_invalid_misplaced_sign() {
        assert!(normalize("10-20").is_err());
        assert!(normalize("5-").is_err());
    }
}
