//! Format checks for Indian vehicle registration and mobile numbers.
//!
//! Registration numbers are stored in their canonical form (`MH12AB1234`) and
//! displayed re-spaced (`MH 12 AB 1234`). Mobile numbers are stored as ten
//! digits without the `91` country code.

use std::sync::LazyLock;

use regex::Regex;

static VEHICLE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2}[0-9]{2}[A-Z]{2}[0-9]{4}$").expect("valid regex"));
static MOBILE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[6-9][0-9]{9}$").expect("valid regex"));
static MOBILE_WITH_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^91[6-9][0-9]{9}$").expect("valid regex"));

pub const VEHICLE_NUMBER_REQUIRED: &str = "Vehicle number is required";
pub const VEHICLE_NUMBER_FORMAT: &str =
    "Invalid format. Use format: MH12AB1234 (State-District-Series-Number)";
pub const MOBILE_FORMAT: &str =
    "Invalid mobile number. Use 10-digit format (6XXXXXXXXX) or with country code (+91XXXXXXXXXX)";

/// Strips all whitespace and uppercases.
pub fn normalize_vehicle_number(vehicle_no: &str) -> String {
    vehicle_no
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

pub fn validate_vehicle_number(vehicle_no: &str) -> Result<(), &'static str> {
    if vehicle_no.trim().is_empty() {
        return Err(VEHICLE_NUMBER_REQUIRED);
    }
    if !VEHICLE_NUMBER.is_match(&normalize_vehicle_number(vehicle_no)) {
        return Err(VEHICLE_NUMBER_FORMAT);
    }
    Ok(())
}

/// `MH12AB1234` -> `MH 12 AB 1234`. Anything that is not ten characters long
/// after normalization is returned normalized but unspaced.
pub fn format_vehicle_number(vehicle_no: &str) -> String {
    let clean = normalize_vehicle_number(vehicle_no);
    if clean.len() == 10 && clean.is_ascii() {
        format!("{} {} {} {}", &clean[0..2], &clean[2..4], &clean[4..6], &clean[6..10])
    } else {
        clean
    }
}

/// Empty input is valid: the field-level "required" rule lives with each form.
pub fn validate_mobile_number(mobile: &str) -> Result<(), &'static str> {
    if mobile.trim().is_empty() {
        return Ok(());
    }
    let clean: String = mobile
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '+')
        .collect();
    if MOBILE.is_match(&clean) || MOBILE_WITH_CODE.is_match(&clean) {
        Ok(())
    } else {
        Err(MOBILE_FORMAT)
    }
}

pub fn normalize_mobile_number(mobile: &str) -> String {
    let digits: String = mobile.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.strip_prefix("91") {
        Some(rest) if digits.len() == 12 => rest.to_string(),
        _ => digits,
    }
}

pub fn format_mobile_number(mobile: &str) -> String {
    let digits = normalize_mobile_number(mobile);
    if digits.len() == 10 {
        format!("+91 {} {}", &digits[0..5], &digits[5..])
    } else {
        mobile.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_numbers_are_accepted_after_normalization() {
        assert!(validate_vehicle_number("MH12AB1234").is_ok());
        assert!(validate_vehicle_number("mh 12 ab 1234").is_ok());
        assert_eq!(normalize_vehicle_number("mh 12 ab 1234"), "MH12AB1234");
    }

    #[test]
    fn malformed_vehicle_numbers_are_rejected() {
        assert_eq!(validate_vehicle_number("MH1AB1234"), Err(VEHICLE_NUMBER_FORMAT));
        assert_eq!(validate_vehicle_number("12MHAB1234"), Err(VEHICLE_NUMBER_FORMAT));
        assert_eq!(validate_vehicle_number("   "), Err(VEHICLE_NUMBER_REQUIRED));
    }

    #[test]
    fn vehicle_numbers_display_with_spaces() {
        assert_eq!(format_vehicle_number("mh12ab1234"), "MH 12 AB 1234");
        assert_eq!(format_vehicle_number("MH1AB1234"), "MH1AB1234");
    }

    #[test]
    fn mobile_numbers() {
        assert!(validate_mobile_number("9876543210").is_ok());
        assert!(validate_mobile_number("919876543210").is_ok());
        assert!(validate_mobile_number("+91 98765-43210").is_ok());
        assert!(validate_mobile_number("").is_ok());
        assert_eq!(validate_mobile_number("1234567890"), Err(MOBILE_FORMAT));
        assert_eq!(validate_mobile_number("98765"), Err(MOBILE_FORMAT));
    }

    #[test]
    fn mobile_numbers_drop_country_code_for_storage() {
        assert_eq!(normalize_mobile_number("+91 98765 43210"), "9876543210");
        assert_eq!(normalize_mobile_number("9876543210"), "9876543210");
        assert_eq!(normalize_mobile_number(""), "");
        assert_eq!(format_mobile_number("919876543210"), "+91 98765 43210");
        assert_eq!(format_mobile_number("12345"), "12345");
    }
}
