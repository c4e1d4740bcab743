// src/test_util.rs
//! Fixture builders for tests.
//!
//! Compiled for the crate's own tests and behind the `test-util` feature.

use crate::models::credential::{Claim, Credential};
use crate::services::integrity::{
    claim_statements, salted_hash, statement_digest, IntegrityError, IntegrityVerifier,
};
use crate::utils::crypto::encode_hash;
use serde_json::Value;
use std::collections::BTreeMap;

pub use crate::blockchain::in_memory::InMemoryChain;

/// A claim over `contents`; anything but a JSON object yields no properties.
pub fn claim(ctype_hash: &str, owner: &str, contents: Value) -> Claim {
    Claim {
        ctype_hash: ctype_hash.to_string(),
        contents: match contents {
            Value::Object(properties) => properties,
            _ => Default::default(),
        },
        owner: owner.to_string(),
    }
}

/// Hashes `claim` into a complete credential.
///
/// Statement `i` is salted with the nonce `nonce-<i>`, so the same claim
/// always seals to the same root hash.
pub fn seal(
    claim: Claim,
    legitimations: Vec<Credential>,
    delegation_id: Option<String>,
) -> Result<Credential, IntegrityError> {
    let mut claim_hashes = Vec::new();
    let mut claim_nonce_map = BTreeMap::new();
    for (index, statement) in claim_statements(&claim).iter().enumerate() {
        let digest = statement_digest(statement);
        let nonce = format!("nonce-{}", index);
        claim_hashes.push(salted_hash(&nonce, &digest));
        claim_nonce_map.insert(digest, nonce);
    }

    let mut credential = Credential {
        claim,
        legitimations,
        claim_hashes,
        claim_nonce_map,
        root_hash: String::new(),
        delegation_id,
    };
    credential.root_hash = encode_hash(&IntegrityVerifier::calculate_root_hash(&credential)?);
    Ok(credential)
}
