// src/common/serial.rs

use once_cell::sync::Lazy;
use regex::Regex;

static SERIAL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(s/n|sn)\s*[:#\-.]?\s*").expect("valid serial prefix regex"));

static SERIAL_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s\-_:.]+").expect("valid separator regex"));

/// Normalizes a scanned or typed router serial (e.g. `S/N: 4857-5443 7F11.40B5`)
/// into its bare alphanumeric form (`485754437F1140B5`).
pub fn normalize_serial_number(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let without_prefix = SERIAL_PREFIX.replace(trimmed, "");
    let without_separators = SERIAL_SEPARATORS.replace_all(&without_prefix, "");

    without_separators
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefixes_and_separators() {
        assert_eq!(normalize_serial_number("  S/N: 4857-5443 7F11.40B5\n"), "485754437F1140B5");
        assert_eq!(normalize_serial_number("sn#ABC_123"), "ABC123");
        assert_eq!(normalize_serial_number("SN-XYZ"), "XYZ");
    }

    #[test]
    fn keeps_plain_serials_untouched() {
        assert_eq!(normalize_serial_number("485754437F1140B5"), "485754437F1140B5");
    }

    #[test]
    fn only_leading_sn_is_a_prefix() {
        // "SN" inside the serial is data, not a prefix.
        assert_eq!(normalize_serial_number("ABSN12"), "ABSN12");
    }

    #[test]
    fn blank_and_symbol_only_input_is_empty() {
        assert_eq!(normalize_serial_number("   "), "");
        assert_eq!(normalize_serial_number("S/N: --"), "");
        assert_eq!(normalize_serial_number("#@!"), "");
    }
}
