//! Bijective base-62 codec between record ids and short codes.
//!
//! The alphabet is ordered `0-9`, `a-z`, `A-Z`, so the character at position
//! `n` has value `n`. Codes carry no leading zeros except the literal `"0"`.

use crate::error::{CoreError, Result};

const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const BASE: i64 = 62;

/// Length of the longest code, produced by `i64::MAX`.
pub const MAX_CODE_LENGTH: usize = 11;

/// Encodes a non-negative id as a base-62 short code.
///
/// Returns [`CoreError::InvalidEncoding`] for negative ids, which are outside
/// the id domain `[0, 2^63)`.
pub fn encode(id: i64) -> Result<String> {
    if id < 0 {
        return Err(CoreError::InvalidEncoding(format!(
            "cannot encode negative id {id}"
        )));
    }
    if id == 0 {
        return Ok("0".to_string());
    }

    let mut buf = [0_u8; MAX_CODE_LENGTH];
    let mut index = MAX_CODE_LENGTH;
    let mut remaining = id;
    while remaining > 0 {
        index -= 1;
        buf[index] = ALPHABET[(remaining % BASE) as usize];
        remaining /= BASE;
    }

    // The alphabet is pure ASCII.
    Ok(buf[index..].iter().map(|b| char::from(*b)).collect())
}

/// Decodes a base-62 short code back into its id.
///
/// The empty string decodes to `0`. Any character outside the alphabet, or a
/// code whose value does not fit in an `i64`, is rejected with
/// [`CoreError::InvalidEncoding`].
pub fn decode(code: &str) -> Result<i64> {
    code.chars().try_fold(0_i64, |acc, c| {
        let digit = digit_value(c).ok_or_else(|| {
            CoreError::InvalidEncoding(format!("invalid base62 character '{c}'"))
        })?;
        acc.checked_mul(BASE)
            .and_then(|value| value.checked_add(digit))
            .ok_or_else(|| CoreError::InvalidEncoding(format!("code '{code}' overflows i64")))
    })
}

fn digit_value(c: char) -> Option<i64> {
    let value = match c {
        '0'..='9' => c as u32 - '0' as u32,
        'a'..='z' => c as u32 - 'a' as u32 + 10,
        'A'..='Z' => c as u32 - 'A' as u32 + 36,
        _ => return None,
    };
    Some(i64::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_encodes_to_zero_char() {
        assert_eq!(encode(0).unwrap(), "0");
    }

    #[test]
    fn empty_code_decodes_to_zero() {
        assert_eq!(decode("").unwrap(), 0);
    }

    #[test]
    fn single_digit_boundaries() {
        assert_eq!(encode(9).unwrap(), "9");
        assert_eq!(encode(10).unwrap(), "a");
        assert_eq!(encode(35).unwrap(), "z");
        assert_eq!(encode(36).unwrap(), "A");
        assert_eq!(encode(61).unwrap(), "Z");
        assert_eq!(encode(62).unwrap(), "10");
    }

    #[test]
    fn known_value() {
        assert_eq!(encode(123_456_789).unwrap(), "8m0Kx");
        assert_eq!(decode("8m0Kx").unwrap(), 123_456_789);
    }

    #[test]
    fn max_id_fits_in_eleven_chars() {
        let code = encode(i64::MAX).unwrap();
        assert_eq!(code.len(), MAX_CODE_LENGTH);
        assert_eq!(code, "aZl8N0y58M7");
        assert_eq!(decode(&code).unwrap(), i64::MAX);
    }

    #[test]
    fn negative_id_is_rejected() {
        assert!(matches!(encode(-1), Err(CoreError::InvalidEncoding(_))));
    }

    #[test]
    fn invalid_characters_are_rejected() {
        for code in ["abc-def", "abc def", "ab!", "é", "abc_"] {
            assert!(
                matches!(decode(code), Err(CoreError::InvalidEncoding(_))),
                "{code} should be rejected"
            );
        }
    }

    #[test]
    fn overflowing_code_is_rejected() {
        assert!(matches!(
            decode("ZZZZZZZZZZZZ"),
            Err(CoreError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn codes_have_no_leading_zeros() {
        for id in [1_i64, 62, 3_844, 1_000_000, i64::MAX] {
            assert!(!encode(id).unwrap().starts_with('0'));
        }
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(id in 0_i64..=i64::MAX) {
            let code = encode(id).unwrap();
            prop_assert!(code.len() <= MAX_CODE_LENGTH);
            prop_assert_eq!(decode(&code).unwrap(), id);
        }
    }
}
