use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Number of digits in the code body, i.e. without the check digit.
pub const BODY_LEN: usize = 12;
/// Number of digits in a full EAN-13 code.
pub const CODE_LEN: usize = 13;

/// Computes the EAN-13 check digit of a 12-digit body.
///
/// Digits at even zero-based positions weigh 1, odd positions weigh 3; the
/// check digit is `(10 - sum % 10) % 10`. Anything but exactly 12 ASCII
/// digits is rejected with [`CoreError::InvalidCode`].
pub fn checksum(body: &str) -> Result<char> {
    let bytes = body.as_bytes();
    if bytes.len() != BODY_LEN {
        return Err(CoreError::InvalidCode(format!(
            "body must have {} digits, got {}: '{}'",
            BODY_LEN,
            body.chars().count(),
            body
        )));
    }
    if !bytes.iter().all(u8::is_ascii_digit) {
        return Err(CoreError::InvalidCode(format!(
            "body must contain only digits: '{}'",
            body
        )));
    }

    Ok(char::from(b'0' + check_digit(bytes)))
}

/// Check digit of 12 ASCII digits. Callers guarantee the input shape.
pub(crate) fn check_digit(body: &[u8]) -> u8 {
    let sum: u32 = body
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            if i % 2 == 0 {
                digit
            } else {
                digit * 3
            }
        })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

/// A validated EAN-13 code: 13 ASCII digits whose last digit is the
/// checksum of the first 12.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ean13(String);

impl Ean13 {
    /// Parses a full 13-digit code, verifying its check digit.
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        Self::validate(&code)?;
        Ok(Self(code))
    }

    /// Builds a code from a 12-digit body by appending its check digit.
    pub fn from_body(body: &str) -> Result<Self> {
        let digit = checksum(body)?;
        let mut code = String::with_capacity(CODE_LEN);
        code.push_str(body);
        code.push(digit);
        Ok(Self(code))
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The first 12 digits.
    pub fn body(&self) -> &str {
        &self.0[..BODY_LEN]
    }

    /// The body read as a decimal integer.
    pub fn body_value(&self) -> u64 {
        self.body()
            .bytes()
            .fold(0, |acc, b| acc * 10 + u64::from(b - b'0'))
    }

    /// The trailing check digit.
    pub fn check_digit(&self) -> char {
        char::from(self.0.as_bytes()[BODY_LEN])
    }

    fn validate(code: &str) -> Result<()> {
        let bytes = code.as_bytes();
        if bytes.len() != CODE_LEN || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(CoreError::InvalidCode(format!(
                "expected {} digits: '{}'",
                CODE_LEN, code
            )));
        }

        let expected = b'0' + check_digit(&bytes[..BODY_LEN]);
        if bytes[BODY_LEN] != expected {
            return Err(CoreError::InvalidCode(format!(
                "check digit mismatch in '{}': expected {}",
                code,
                char::from(expected)
            )));
        }

        Ok(())
    }
}

impl Display for Ean13 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Ean13 {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Ean13> for String {
    fn from(value: Ean13) -> Self {
        value.0
    }
}

impl AsRef<str> for Ean13 {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_of_zero_body() {
        assert_eq!(checksum("000000000000").unwrap(), '0');
    }

    #[test]
    fn checksum_of_reference_body() {
        // 1+6+3+12+5+18+7+24+9+0+1+6 = 92
        assert_eq!(checksum("123456789012").unwrap(), '8');
        assert_eq!(
            Ean13::from_body("123456789012").unwrap().as_str(),
            "1234567890128"
        );
    }

    #[test]
    fn checksum_rejects_bad_input() {
        assert!(checksum("12345678901").is_err());
        assert!(checksum("1234567890123").is_err());
        assert!(checksum("12345678901a").is_err());
        assert!(checksum("").is_err());
    }

    #[test]
    fn valid_code() {
        let code = Ean13::new("4006381333931").unwrap();
        assert_eq!(code.body(), "400638133393");
        assert_eq!(code.check_digit(), '1');
        assert_eq!(code.body_value(), 400_638_133_393);
    }

    #[test]
    fn wrong_check_digit() {
        let err = Ean13::new("1234567890123").unwrap_err();
        assert!(matches!(err, CoreError::InvalidCode(_)));
    }

    #[test]
    fn wrong_length_or_characters() {
        assert!(Ean13::new("123456789012").is_err());
        assert!(Ean13::new("12345678901280").is_err());
        assert!(Ean13::new("12345678901x8").is_err());
    }

    #[test]
    fn serde_validates_on_deserialize() {
        let code: Ean13 = serde_json::from_str("\"1234567890128\"").unwrap();
        assert_eq!(code.to_string(), "1234567890128");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"1234567890128\"");

        assert!(serde_json::from_str::<Ean13>("\"1234567890123\"").is_err());
    }
}
