//! Grant bit-vector codec.
//!
//! A grant claim is a base64 byte string read as a little-endian bitset:
//! bit `i` is bit `i % 8` of byte `i / 8`.
//!
//! - bit 0: the principal is granted every location
//! - bit `i >= 1`: the principal is granted location `i`
//!
//! The vector is only as long as the highest granted id needs, so every bit
//! test is bounds-checked and anything past the end reads as "not granted".

use std::collections::BTreeSet;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};

use crate::LocationResult;
use crate::error::LocationError;

/// Bit index of the "all locations" sentinel.
pub const ALL_LOCATIONS_BIT: u64 = 0;

/// Largest location id [`GrantVector::encode`] accepts (a 128 KiB vector).
pub const MAX_ENCODABLE_ID: u64 = (1 << 20) - 1;

/// Decoded grant bit-vector of one principal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantVector {
    bytes: Vec<u8>,
}

impl GrantVector {
    /// A vector granting nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps raw claim bytes.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Decodes a base64 claim value.
    ///
    /// The standard alphabet is expected; missing padding and the URL-safe
    /// alphabet are accepted as well.
    ///
    /// # Errors
    ///
    /// Returns `MalformedClaim` if the value is not base64.
    pub fn decode(claim: &str) -> LocationResult<Self> {
        let claim = claim.trim();
        [&STANDARD, &STANDARD_NO_PAD, &URL_SAFE, &URL_SAFE_NO_PAD]
            .iter()
            .find_map(|engine| engine.decode(claim).ok())
            .map(Self::from_bytes)
            .ok_or_else(|| LocationError::malformed_claim("grant claim is not valid base64"))
    }

    /// Encodes a set of granted ids, optionally with the "all" sentinel.
    ///
    /// Id 0 is the sentinel position and is ignored in `ids`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedClaim` if an id exceeds [`MAX_ENCODABLE_ID`].
    pub fn encode(ids: impl IntoIterator<Item = u64>, all: bool) -> LocationResult<Self> {
        let mut bytes: Vec<u8> = Vec::new();
        let mut set = |index: u64| {
            let byte = (index / 8) as usize;
            if bytes.len() <= byte {
                bytes.resize(byte + 1, 0);
            }
            bytes[byte] |= 1 << (index % 8);
        };

        if all {
            set(ALL_LOCATIONS_BIT);
        }
        for id in ids {
            if id > MAX_ENCODABLE_ID {
                return Err(LocationError::malformed_claim(format!(
                    "location id {id} is too large for a grant vector (max {MAX_ENCODABLE_ID})"
                )));
            }
            if id != ALL_LOCATIONS_BIT {
                set(id);
            }
        }
        Ok(Self { bytes })
    }

    /// The claim value for this vector (standard base64 with padding).
    #[must_use]
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Logical length: index of the highest set bit plus one, 0 if none set.
    #[must_use]
    pub fn bit_length(&self) -> u64 {
        self.bytes
            .iter()
            .rposition(|&b| b != 0)
            .map(|idx| idx as u64 * 8 + (8 - u64::from(self.bytes[idx].leading_zeros())))
            .unwrap_or(0)
    }

    /// Tests bit `index`; out of range is `false`.
    #[must_use]
    pub fn bit(&self, index: u64) -> bool {
        let Ok(byte) = usize::try_from(index / 8) else {
            return false;
        };
        self.bytes
            .get(byte)
            .is_some_and(|b| b & (1 << (index % 8)) != 0)
    }

    /// `true` if the "all locations" sentinel is set.
    #[must_use]
    pub fn is_granted_all(&self) -> bool {
        self.bit_length() > 0 && self.bit(ALL_LOCATIONS_BIT)
    }

    /// `true` if location `id` is granted, explicitly or through the sentinel.
    ///
    /// Id 0 is never granted.
    #[must_use]
    pub fn is_granted(&self, id: u64) -> bool {
        id > 0 && (self.is_granted_all() || (id < self.bit_length() && self.bit(id)))
    }

    /// `true` if any of `ids` is granted.
    pub fn is_granted_any(&self, ids: impl IntoIterator<Item = u64>) -> bool {
        ids.into_iter().any(|id| self.is_granted(id))
    }

    /// Ids whose bits are set, ignoring the sentinel.
    #[must_use]
    pub fn explicit_ids(&self) -> BTreeSet<u64> {
        let len = self.bit_length();
        if len <= 1 {
            return BTreeSet::new();
        }
        (1..len).filter(|&i| self.bit(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_location() {
        let v = GrantVector::from_bytes(vec![0x02]);
        assert!(!v.is_granted_all());
        assert!(v.is_granted(1));
        assert!(!v.is_granted(2));
        assert_eq!(v.explicit_ids(), BTreeSet::from([1]));
        assert_eq!(v.bit_length(), 2);
    }

    #[test]
    fn test_all_sentinel() {
        let v = GrantVector::from_bytes(vec![0x01]);
        assert!(v.is_granted_all());
        for id in [1, 2, 7, 8, 1_000, u64::MAX] {
            assert!(v.is_granted(id), "id {id}");
        }
        assert!(v.explicit_ids().is_empty());
    }

    #[test]
    fn test_all_sentinel_ignores_other_bits() {
        let v = GrantVector::from_bytes(vec![0b0000_0101, 0x00, 0x80]);
        assert!(v.is_granted_all());
        assert!(v.is_granted(1));
        assert!(v.is_granted(99));
    }

    #[test]
    fn test_zero_never_granted() {
        for bytes in [vec![], vec![0x00], vec![0x01], vec![0xff, 0xff]] {
            assert!(!GrantVector::from_bytes(bytes).is_granted(0));
        }
    }

    #[test]
    fn test_empty_and_zero_vectors() {
        for bytes in [vec![], vec![0x00], vec![0x00, 0x00, 0x00]] {
            let v = GrantVector::from_bytes(bytes);
            assert!(!v.is_granted_all());
            assert!(v.explicit_ids().is_empty());
            assert!(!v.is_granted(1));
            assert_eq!(v.bit_length(), 0);
        }
    }

    #[test]
    fn test_out_of_range_is_not_granted() {
        let v = GrantVector::from_bytes(vec![0b0000_1000]);
        assert!(v.is_granted(3));
        assert!(!v.is_granted(4));
        assert!(!v.is_granted(8));
        assert!(!v.is_granted(u64::MAX));
        assert!(!v.bit(u64::MAX));
    }

    #[test]
    fn test_trailing_zero_bytes_do_not_extend_length() {
        let v = GrantVector::from_bytes(vec![0b0000_0010, 0x00, 0x00]);
        assert_eq!(v.bit_length(), 2);
        assert_eq!(v.explicit_ids(), BTreeSet::from([1]));
    }

    #[test]
    fn test_multi_byte_layout() {
        // bits 1, 9 and 17: byte 0 bit 1, byte 1 bit 1, byte 2 bit 1
        let v = GrantVector::from_bytes(vec![0x02, 0x02, 0x02]);
        assert_eq!(v.explicit_ids(), BTreeSet::from([1, 9, 17]));
        assert_eq!(v.bit_length(), 18);
        assert!(v.is_granted_any([4, 5, 9]));
        assert!(!v.is_granted_any([2, 3, 10]));
        assert!(!v.is_granted_any(std::iter::empty()));
    }

    #[test]
    fn test_encode_matches_decode() {
        let ids = BTreeSet::from([1, 2, 3, 8, 15, 16, 63, 64, 200]);
        let v = GrantVector::encode(ids.iter().copied(), false).unwrap();
        assert!(!v.is_granted_all());

        let decoded = GrantVector::decode(&v.to_base64()).unwrap();
        assert_eq!(decoded.explicit_ids(), ids);
    }

    #[test]
    fn test_encode_layout() {
        let v = GrantVector::encode([1], false).unwrap();
        assert_eq!(v.as_bytes(), &[0x02]);
        assert_eq!(v.to_base64(), "Ag==");

        let v = GrantVector::encode([0, 9], true).unwrap();
        assert_eq!(v.as_bytes(), &[0x01, 0x02]);

        let v = GrantVector::encode(std::iter::empty(), true).unwrap();
        assert_eq!(v.as_bytes(), &[0x01]);
    }

    #[test]
    fn test_encode_rejects_huge_ids() {
        let err = GrantVector::encode([MAX_ENCODABLE_ID + 1], false).unwrap_err();
        assert!(matches!(err, LocationError::MalformedClaim { .. }));
        assert!(GrantVector::encode([MAX_ENCODABLE_ID], false).is_ok());
    }

    #[test]
    fn test_decode_variants() {
        assert_eq!(GrantVector::decode("Ag==").unwrap().as_bytes(), &[0x02]);
        assert_eq!(GrantVector::decode("Ag").unwrap().as_bytes(), &[0x02]);
        assert_eq!(GrantVector::decode(" AQ== ").unwrap().as_bytes(), &[0x01]);
        // 0xfb 0xff: '+' / '/' in the standard alphabet, '-' / '_' in URL-safe
        assert_eq!(GrantVector::decode("-_8").unwrap().as_bytes(), &[0xfb, 0xff]);
        assert_eq!(GrantVector::decode("+/8=").unwrap().as_bytes(), &[0xfb, 0xff]);
        assert!(GrantVector::decode("").unwrap().as_bytes().is_empty());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        for claim in ["!!!", "not base64 at all", "A"] {
            let err = GrantVector::decode(claim).unwrap_err();
            assert!(matches!(err, LocationError::MalformedClaim { .. }), "{claim}");
        }
    }

    #[test]
    fn test_random_sets_survive_encoding() {
        // xorshift64, fixed seed
        let mut seed: u64 = 0x9e37_79b9_7f4a_7c15;
        for _ in 0..50 {
            let mut ids = BTreeSet::new();
            for _ in 0..(seed % 20) {
                seed ^= seed << 13;
                seed ^= seed >> 7;
                seed ^= seed << 17;
                ids.insert(1 + seed % 500);
            }
            let v = GrantVector::encode(ids.iter().copied(), false).unwrap();
            let decoded = GrantVector::decode(&v.to_base64()).unwrap();
            assert!(!decoded.is_granted_all());
            assert_eq!(decoded.explicit_ids(), ids);
            for id in 1..=500 {
                assert_eq!(decoded.is_granted(id), ids.contains(&id));
            }
        }
    }
}
