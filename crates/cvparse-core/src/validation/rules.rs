//! Deterministic field rules for email and phone values.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `local@domain.tld`, final label of two or more letters.
    pub static ref EMAIL: Regex = Regex::new(
        r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"
    ).unwrap();

    /// E.164-like: optional `+`, leading 1-9, up to 15 digits in total.
    pub static ref PHONE: Regex = Regex::new(
        r"^\+?[1-9]\d{1,14}$"
    ).unwrap();
}

/// Whether `email` is syntactically valid.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Whether `phone` is an E.164-like number.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE.is_match(phone)
}
