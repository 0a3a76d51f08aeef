//! Construction of variant sequence windows by single-base substitution.

use crate::error::{Error, Result};

/// Parse a single nucleotide allele, case-insensitively.
///
/// # Errors
///
/// `Error::InvalidBase` unless the string is exactly one of `A`, `C`, `G`, `T`.
pub fn parse_base(allele: &str) -> Result<char> {
    let mut chars = allele.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if matches!(c.to_ascii_uppercase(), 'A' | 'C' | 'G' | 'T') => {
            Ok(c.to_ascii_uppercase())
        }
        _ => Err(Error::InvalidBase(allele.to_string())),
    }
}

/// Replace the base at `offset` in `reference` by `alternative`.
///
/// The result has the same length as the input.
pub fn build_variant_sequence(reference: &str, alternative: char, offset: usize) -> Result<String> {
    if !alternative.is_ascii() {
        return Err(Error::InvalidBase(alternative.to_string()));
    }
    if offset >= reference.len() || !reference.is_char_boundary(offset) {
        return Err(Error::OffsetOutOfRange {
            offset,
            len: reference.len(),
        });
    }

    let mut result = String::with_capacity(reference.len());
    result.push_str(&reference[..offset]);
    result.push(alternative);
    result.push_str(&reference[offset + 1..]);
    Ok(result)
}

/// A single-nucleotide variant located within a sequence window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variant {
    /// Declared reference base.
    pub reference: char,
    /// Alternative base.
    pub alternative: char,
    /// 0-based offset within the window.
    pub offset: usize,
}

impl Variant {
    /// Build the variant window, checking that the window carries the declared reference.
    pub fn apply(&self, window: &str) -> Result<String> {
        let found = window
            .as_bytes()
            .get(self.offset)
            .map(|b| b.to_ascii_uppercase() as char)
            .ok_or(Error::OffsetOutOfRange {
                offset: self.offset,
                len: window.len(),
            })?;
        if found != self.reference.to_ascii_uppercase() {
            return Err(Error::ReferenceMismatch {
                position: self.offset as u64,
                expected: self.reference,
                found,
            });
        }

        let variant = build_variant_sequence(window, self.alternative, self.offset)?;
        debug_assert_eq!(variant.len(), window.len());
        debug_assert_eq!(variant.as_bytes()[self.offset] as char, self.alternative);
        Ok(variant)
    }
}
