//! Bangladeshi mobile phone numbers.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// Nothing but whitespace or punctuation was supplied.
    #[error("phone number is required")]
    Empty,
    /// The digit count is not 11.
    #[error("phone number must have exactly {expected} digits (got {actual})")]
    WrongLength {
        /// Required digit count.
        expected: usize,
        /// Digits found in the input.
        actual: usize,
    },
    /// The number does not start with the mobile prefix.
    #[error("phone number must start with {prefix}")]
    BadPrefix {
        /// Required leading digits.
        prefix: &'static str,
    },
}

/// A normalized local mobile number: exactly 11 ASCII digits starting `01`.
///
/// Parsing strips every non-digit, so `"017-1234 5678"` becomes
/// `"01712345678"`. A country-code form such as `"+8801712345678"` has 13
/// digits and is rejected.
///
/// ```
/// use gadzilla_core::Phone;
///
/// assert_eq!(Phone::parse("01712345678").unwrap().as_str(), "01712345678");
/// assert!(Phone::parse("+880171234567").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Required number of digits.
    pub const DIGITS: usize = 11;
    /// Required leading digits.
    pub const PREFIX: &'static str = "01";

    /// Normalize and validate a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError`] when the digit string is empty, has the wrong
    /// length, or lacks the `01` prefix.
    pub fn parse(raw: &str) -> Result<Self, PhoneError> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }

        if digits.len() != Self::DIGITS {
            return Err(PhoneError::WrongLength {
                expected: Self::DIGITS,
                actual: digits.len(),
            });
        }

        if !digits.starts_with(Self::PREFIX) {
            return Err(PhoneError::BadPrefix {
                prefix: Self::PREFIX,
            });
        }

        Ok(Self(digits))
    }

    /// The normalized digit string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Phone` and returns its digit string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_local_number() {
        let phone = Phone::parse("01712345678").unwrap();
        assert_eq!(phone.as_str(), "01712345678");
    }

    #[test]
    fn test_strips_formatting() {
        let phone = Phone::parse(" 017-1234 5678 ").unwrap();
        assert_eq!(phone.as_str(), "01712345678");
    }

    #[test]
    fn test_rejects_country_code_form() {
        // 12 digits once the plus sign is dropped
        assert_eq!(
            Phone::parse("+880171234567"),
            Err(PhoneError::WrongLength {
                expected: 11,
                actual: 12
            })
        );
        assert!(Phone::parse("+8801712345678").is_err());
    }

    #[test]
    fn test_rejects_wrong_prefix() {
        assert_eq!(
            Phone::parse("02712345678"),
            Err(PhoneError::BadPrefix { prefix: "01" })
        );
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(Phone::parse(""), Err(PhoneError::Empty));
        assert_eq!(Phone::parse(" - "), Err(PhoneError::Empty));
    }

    #[test]
    fn test_rejects_short() {
        assert!(matches!(
            Phone::parse("0171234"),
            Err(PhoneError::WrongLength { actual: 7, .. })
        ));
    }
}
