//! Key and value encoding for the sled trees
//!
//! Every tree is keyed by a `u64` id stored big-endian, so sled's byte
//! ordering matches numeric ordering and iteration yields records by id.
//! Values are bincode-encoded with the standard configuration.

use bincode::{Decode, Encode};

use super::error::DbError;

/// Big-endian `u64` tree key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IdKey(pub u64);

impl IdKey {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// # Errors
    ///
    /// Returns `DbError::CorruptKey` if `bytes` is not exactly 8 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DbError> {
        let raw: [u8; 8] = bytes
            .try_into()
            .map_err(|_| DbError::CorruptKey(bytes.len()))?;
        Ok(Self(u64::from_be_bytes(raw)))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for IdKey {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Encode a record value
///
/// # Errors
///
/// Returns `DbError::EncodeError` if bincode cannot encode the value.
pub fn encode<T: Encode>(value: &T) -> Result<Vec<u8>, DbError> {
    Ok(bincode::encode_to_vec(value, bincode::config::standard())?)
}

/// Decode a record value
///
/// # Errors
///
/// Returns `DbError::DecodeError` if the bytes do not hold a `T`.
pub fn decode<T: Decode<()>>(bytes: &[u8]) -> Result<T, DbError> {
    let (value, _): (T, usize) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(value)
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
