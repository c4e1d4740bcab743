// src/utils/crypto.rs
//! Hashing helpers matching the chain's conventions.
//!
//! Credential root hashes are Blake2b with a 256-bit output, and SS58
//! address checksums use Blake2b-512 over a fixed preimage prefix.

use blake2::digest::consts::{U16, U32};
use blake2::{Blake2b, Blake2b512, Digest};
use thiserror::Error;

type Blake2b128 = Blake2b<U16>;
type Blake2b256 = Blake2b<U32>;

/// Length in bytes of every hash handled by this crate.
pub const HASH_LENGTH: usize = 32;

const SS58_PREFIX: &[u8] = b"SS58PRE";

/// Why a hex-encoded hash was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashFormatError {
    #[error("hash is missing the 0x prefix")]
    MissingPrefix,
    #[error("hash is not valid hex: {0}")]
    InvalidHex(String),
    #[error("hash has {0} bytes, expected 32")]
    InvalidLength(usize),
}

/// Computes a Blake2b-256 hash of the input data.
///
/// # Arguments
/// * `data` - Binary data to hash
///
/// # Returns
/// Fixed-size 32-byte array containing the hash.
pub fn hash_data(data: &[u8]) -> [u8; HASH_LENGTH] {
    Blake2b256::digest(data).into()
}

/// Blake2b-128, the hasher behind `Blake2_128Concat` storage keys.
pub fn hash_128(data: &[u8]) -> [u8; 16] {
    Blake2b128::digest(data).into()
}

/// Computes the two checksum bytes SS58 appends to an encoded address.
pub fn ss58_checksum(payload: &[u8]) -> [u8; 2] {
    let mut hasher = Blake2b512::new();
    hasher.update(SS58_PREFIX);
    hasher.update(payload);
    let digest = hasher.finalize();
    [digest[0], digest[1]]
}

/// Decodes a `0x`-prefixed, 32-byte hex hash.
pub fn decode_hash(value: &str) -> Result<[u8; HASH_LENGTH], HashFormatError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or(HashFormatError::MissingPrefix)?;
    let bytes = hex::decode(digits).map_err(|e| HashFormatError::InvalidHex(e.to_string()))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| HashFormatError::InvalidLength(len))
}

/// Encodes a hash as lowercase hex with a `0x` prefix.
pub fn encode_hash(hash: &[u8; HASH_LENGTH]) -> String {
    format!("0x{}", hex::encode(hash))
}
