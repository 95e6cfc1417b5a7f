use crate::code::{Ean13, BODY_LEN};
use crate::error::{CoreError, Result};
use std::fmt::Display;
use std::str::FromStr;

/// Placeholder for a digit chosen by the generator.
pub const WILDCARD: char = 'x';

/// A digit template for generated codes.
///
/// A mask has at most 12 characters, each either a digit or the wildcard
/// `x` (`X` is accepted). It is right-padded with wildcards to the 12-digit
/// body length; the padded form is the template.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Mask {
    template: [u8; BODY_LEN],
}

impl Mask {
    pub fn new(mask: &str) -> Result<Self> {
        let len = mask.chars().count();
        if len > BODY_LEN {
            return Err(CoreError::MaskTooLong { len });
        }

        let mut template = [WILDCARD as u8; BODY_LEN];
        for (slot, c) in template.iter_mut().zip(mask.chars()) {
            *slot = match c {
                '0'..='9' => c as u8,
                'x' | 'X' => WILDCARD as u8,
                other => {
                    return Err(CoreError::InvalidMask(format!(
                        "unexpected character '{}' in '{}', expected digits or '{}'",
                        other, mask, WILDCARD
                    )))
                }
            };
        }

        Ok(Self { template })
    }

    /// The padded 12-character template.
    pub fn template(&self) -> &str {
        // Only ASCII digits and the wildcard are ever stored.
        std::str::from_utf8(&self.template).unwrap_or_default()
    }

    pub fn is_wildcard(&self, position: usize) -> bool {
        self.template
            .get(position)
            .is_some_and(|&b| b == WILDCARD as u8)
    }

    pub fn wildcard_count(&self) -> usize {
        self.template
            .iter()
            .filter(|&&b| b == WILDCARD as u8)
            .count()
    }

    /// Fills the wildcards from `source`, a non-empty slice of ASCII digits.
    ///
    /// The wildcard at template position `i` takes `source[i % source.len()]`,
    /// so a source shorter than the template wraps around and two wildcards
    /// may read the same digit. With a 12-digit source every wildcard reads
    /// the digit at its own position. Fixed positions are copied verbatim.
    pub fn fill(&self, source: &[u8]) -> [u8; BODY_LEN] {
        let mut body = self.template;
        if source.is_empty() {
            return body;
        }
        for (i, slot) in body.iter_mut().enumerate() {
            if *slot == WILDCARD as u8 {
                *slot = source[i % source.len()];
            }
        }
        body
    }

    /// Fills the `n`-th wildcard with `digits[n]`, one digit per wildcard.
    ///
    /// Wildcards beyond the end of `digits` are left as they are.
    pub fn fill_wildcards(&self, digits: &[u8]) -> [u8; BODY_LEN] {
        let mut body = self.template;
        let slots = body.iter_mut().filter(|slot| **slot == WILDCARD as u8);
        for (slot, &digit) in slots.zip(digits) {
            *slot = digit;
        }
        body
    }

    /// Whether every fixed position of the template matches `code`.
    pub fn matches(&self, code: &Ean13) -> bool {
        self.template
            .iter()
            .zip(code.body().bytes())
            .all(|(&t, c)| t == WILDCARD as u8 || t == c)
    }
}

impl FromStr for Mask {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl Display for Mask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.template())
    }
}
