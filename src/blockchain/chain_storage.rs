// src/blockchain/chain_storage.rs
//! Pallet storage entries read over `state_getStorage`.
//!
//! Web3 name ownership and attestations have no runtime API of their own,
//! so they are read from storage directly. Map keys are
//! `twox128(pallet) ++ twox128(item) ++ blake2_128_concat(scale(key))`, and
//! values are SCALE encoded.

use super::ChainError;
use crate::models::attestation::Attestation;
use crate::models::did::did_from_account;
use crate::utils::crypto::{encode_hash, hash_128, HASH_LENGTH};
use parity_scale_codec::{Decode, Encode};

/// `twox128("Attestation") ++ twox128("Attestations")`
const ATTESTATIONS_PREFIX: &str =
    "6310fed47319b658f9b8b2504e0d72ecae394d879ddf7f99595bc0dd36e355b5";

/// `twox128("Web3Names") ++ twox128("Owner")`
const WEB3_NAME_OWNER_PREFIX: &str =
    "9aa8ac11f0e9c4ff19e9fc10cd9c7c32eca6b7a1fdc9f689184ecb4f359c0518";

type AccountId = [u8; 32];

#[derive(Debug, Decode)]
enum AuthorizationId {
    Delegation([u8; HASH_LENGTH]),
}

/// Leading fields of `attestation::Attestations` values. The trailing
/// deposit is not read.
#[derive(Debug, Decode)]
struct AttestationDetails {
    ctype_hash: [u8; HASH_LENGTH],
    attester: AccountId,
    authorization_id: Option<AuthorizationId>,
    revoked: bool,
}

/// Leading field of `web3Names.owner` values.
#[derive(Debug, Decode)]
struct Web3NameOwnership {
    owner: AccountId,
}

fn blake2_128_concat(key: &[u8]) -> String {
    format!("{}{}", hex::encode(hash_128(key)), hex::encode(key))
}

/// Storage key of the attestation for `root_hash`.
pub fn attestation_key(root_hash: &[u8; HASH_LENGTH]) -> String {
    format!("0x{}{}", ATTESTATIONS_PREFIX, blake2_128_concat(root_hash))
}

/// Storage key of the owner record for `web3_name`.
pub fn web3_name_owner_key(web3_name: &str) -> String {
    let encoded = web3_name.as_bytes().to_vec().encode();
    format!("0x{}{}", WEB3_NAME_OWNER_PREFIX, blake2_128_concat(&encoded))
}

fn storage_bytes(raw: &str) -> Result<Vec<u8>, ChainError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits).map_err(|e| ChainError::Storage(e.to_string()))
}

fn decode_value<T: Decode>(raw: &str) -> Result<T, ChainError> {
    let bytes = storage_bytes(raw)?;
    T::decode(&mut bytes.as_slice()).map_err(|e| ChainError::Storage(e.to_string()))
}

/// Decodes the attestation stored under `root_hash`.
pub fn decode_attestation(root_hash: &str, raw: &str) -> Result<Attestation, ChainError> {
    let details: AttestationDetails = decode_value(raw)?;
    Ok(Attestation {
        claim_hash: root_hash.to_string(),
        ctype_hash: encode_hash(&details.ctype_hash),
        owner: did_from_account(&details.attester),
        delegation_id: details
            .authorization_id
            .map(|AuthorizationId::Delegation(id)| encode_hash(&id)),
        revoked: details.revoked,
    })
}

/// Decodes a web3 name owner record into the owner's DID.
pub fn decode_web3_name_owner(raw: &str) -> Result<String, ChainError> {
    let ownership: Web3NameOwnership = decode_value(raw)?;
    Ok(did_from_account(&ownership.owner))
}
