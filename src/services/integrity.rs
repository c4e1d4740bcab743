// src/services/integrity.rs
//! Structural and cryptographic integrity of a credential.
//!
//! A credential commits to its content in two layers:
//! - the claim is split into statements, one compact JSON object per
//!   property: `{"@id": owner}` and `{"kilt:ctype:<hash>#<key>": value}`.
//!   Each statement's Blake2b-256 digest is salted with a nonce from
//!   `claim_nonce_map`, giving one entry of `claim_hashes`
//! - the root hash is Blake2b-256 over the claim hashes, the legitimation
//!   root hashes and the delegation id, concatenated as raw bytes in that order
//!
//! [`IntegrityVerifier`] recomputes both layers from what the credential
//! carries, so neither the owner nor any claimed property can be changed
//! without breaking the commitment. The on-chain attestation check is done
//! by the caller.

use crate::models::credential::{Claim, Credential};
use crate::models::did::{Did, DidParseError};
use crate::utils::crypto::{decode_hash, encode_hash, hash_data, HashFormatError, HASH_LENGTH};
use serde_json::{json, Map, Value};
use thiserror::Error;

const CTYPE_ID_PREFIX: &str = "kilt:ctype:";

/// Why a credential failed integrity verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("malformed {field}: {source}")]
    MalformedHash {
        field: &'static str,
        #[source]
        source: HashFormatError,
    },

    #[error("claim owner is not a valid DID: {0}")]
    InvalidOwner(#[source] DidParseError),

    #[error("no nonce for claim statement {0}")]
    MissingNonce(String),

    #[error("claim statement {0} is not among the claim hashes")]
    StatementNotHashed(String),

    #[error("salted hash for statement digest {0} is not among the claim hashes")]
    UnknownNonce(String),

    #[error("root hash mismatch: credential states {expected}, content hashes to {computed}")]
    RootHashMismatch { expected: String, computed: String },

    #[error("legitimation {index} is invalid: {source}")]
    InvalidLegitimation {
        index: usize,
        #[source]
        source: Box<IntegrityError>,
    },

    #[error("on-chain attestation does not match the credential")]
    AttestationMismatch,
}

/// Checks a credential independently of chain state.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, credential: &Credential) -> Result<(), IntegrityError>;
}

/// Splits a claim into the statements its hashes commit to.
///
/// The owner statement comes first, then one statement per content property
/// in document order. Property names are expanded with the CType vocabulary,
/// which binds every statement to the claim's CType.
pub fn claim_statements(claim: &Claim) -> Vec<String> {
    let vocabulary = format!("{}{}#", CTYPE_ID_PREFIX, claim.ctype_hash);
    let mut statements = Vec::with_capacity(claim.contents.len() + 1);
    statements.push(json!({ "@id": claim.owner }).to_string());
    for (key, value) in &claim.contents {
        let mut statement = Map::with_capacity(1);
        statement.insert(format!("{}{}", vocabulary, key), value.clone());
        statements.push(Value::Object(statement).to_string());
    }
    statements
}

/// Hex digest of one claim statement.
pub fn statement_digest(statement: &str) -> String {
    encode_hash(&hash_data(statement.as_bytes()))
}

/// Claim hash of a statement digest salted with `nonce`.
pub fn salted_hash(nonce: &str, digest: &str) -> String {
    encode_hash(&hash_data(format!("{}{}", nonce, digest).as_bytes()))
}

/// Default [`CredentialVerifier`]: hash formats, owner DID, statement
/// commitments, nonce salting and root hash, applied recursively to
/// legitimations.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntegrityVerifier;

impl IntegrityVerifier {
    /// Recomputes the root hash a credential should carry.
    pub fn calculate_root_hash(credential: &Credential) -> Result<[u8; HASH_LENGTH], IntegrityError> {
        let mut leaves = Vec::with_capacity(
            HASH_LENGTH * (credential.claim_hashes.len() + credential.legitimations.len() + 1),
        );
        for claim_hash in &credential.claim_hashes {
            leaves.extend_from_slice(&parse_hash("claimHashes", claim_hash)?);
        }
        for legitimation in &credential.legitimations {
            leaves.extend_from_slice(&parse_hash("legitimation rootHash", &legitimation.root_hash)?);
        }
        if let Some(delegation_id) = &credential.delegation_id {
            leaves.extend_from_slice(&parse_hash("delegationId", delegation_id)?);
        }
        Ok(hash_data(&leaves))
    }

    /// Every statement of the claim must have a nonce, and its salted hash
    /// must be committed in `claim_hashes`.
    fn verify_statements(credential: &Credential) -> Result<(), IntegrityError> {
        for statement in claim_statements(&credential.claim) {
            let digest = statement_digest(&statement);
            let Some(nonce) = credential
                .claim_nonce_map
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(&digest))
                .map(|(_, nonce)| nonce)
            else {
                return Err(IntegrityError::MissingNonce(statement));
            };
            if !contains_hash(&credential.claim_hashes, &salted_hash(nonce, &digest)) {
                return Err(IntegrityError::StatementNotHashed(statement));
            }
        }
        Ok(())
    }

    fn verify_nonces(credential: &Credential) -> Result<(), IntegrityError> {
        for (digest, nonce) in &credential.claim_nonce_map {
            parse_hash("claimNonceMap", digest)?;
            if !contains_hash(&credential.claim_hashes, &salted_hash(nonce, digest)) {
                return Err(IntegrityError::UnknownNonce(digest.clone()));
            }
        }
        Ok(())
    }
}

impl CredentialVerifier for IntegrityVerifier {
    fn verify(&self, credential: &Credential) -> Result<(), IntegrityError> {
        parse_hash("cTypeHash", &credential.claim.ctype_hash)?;
        Did::parse(&credential.claim.owner).map_err(IntegrityError::InvalidOwner)?;
        Self::verify_statements(credential)?;
        Self::verify_nonces(credential)?;

        for (index, legitimation) in credential.legitimations.iter().enumerate() {
            self.verify(legitimation)
                .map_err(|source| IntegrityError::InvalidLegitimation {
                    index,
                    source: Box::new(source),
                })?;
        }

        let expected = parse_hash("rootHash", &credential.root_hash)?;
        let computed = Self::calculate_root_hash(credential)?;
        if expected != computed {
            return Err(IntegrityError::RootHashMismatch {
                expected: credential.root_hash.clone(),
                computed: encode_hash(&computed),
            });
        }
        Ok(())
    }
}

fn parse_hash(field: &'static str, value: &str) -> Result<[u8; HASH_LENGTH], IntegrityError> {
    decode_hash(value).map_err(|source| IntegrityError::MalformedHash { field, source })
}

fn contains_hash(hashes: &[String], hash: &str) -> bool {
    hashes.iter().any(|candidate| candidate.eq_ignore_ascii_case(hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{claim, seal};
    use serde_json::json;

    const OWNER: &str = "did:kilt:4nwPAmtsK5toZfBM9WvmAe4Fa3LyZ3X3JHt7EUFfrcPPAZAm";
    const OTHER: &str = "did:kilt:4nxhWrDR27YzC5z4soRcz31MaeFn287JRqiE5y4u7jBEdgP2";

    fn hash_of(byte: &str) -> String {
        format!("0x{}", byte.repeat(32))
    }

    fn john_doe() -> Credential {
        seal(
            claim(
                &hash_of("cc"),
                OWNER,
                json!({ "email": "john@example.com", "age": 29 }),
            ),
            Vec::new(),
            None,
        )
        .unwrap()
    }

    /// Credential carrying only the given claim hashes, for root hash vectors.
    fn bare(claim_hashes: &[String]) -> Credential {
        let mut credential = john_doe();
        credential.claim_hashes = claim_hashes.to_vec();
        credential.claim_nonce_map.clear();
        credential
    }

    #[test]
    fn test_claim_matches_known_vector() {
        let credential: Credential = serde_json::from_value(json!({
            "claim": {
                "cTypeHash": hash_of("cc"),
                "contents": { "email": "john@example.com", "age": 29 },
                "owner": OWNER
            },
            "claimHashes": [
                "0x60524964fe38995156a3f116f77990757cd1ca3d9c28f2dcf2da5f5b9e049dc6",
                "0xbc4ddf8046327040f300339ef1cf26f7f488b1c07965356ea01132a67d19d656",
                "0x951cebd57f9bc0215974d9cd2ff08963ec0fec3cfc7fd1eeff363915c01dcc57"
            ],
            "claimNonceMap": {
                "0x3e9e3d2e4424953d05c15e7782b5f688a84a7cbe1c528d5476d4a0af31151380": "nonce-0",
                "0x24a185db9ca88b02c1245b7af1ddcd5c013498550d02de4d910c2484fc35b0a1": "nonce-1",
                "0x40d7805eb401d331c53430bfb582b4039a5515027a2fede8c639dbd9232f5892": "nonce-2"
            },
            "rootHash": "0xf4058fffd82a23f0cb18a5c1fb584c3199047cf4e4c0cf91f94a58c45a3e5e26"
        }))
        .unwrap();

        assert_eq!(
            claim_statements(&credential.claim),
            vec![
                format!("{{\"@id\":\"{}\"}}", OWNER),
                format!("{{\"kilt:ctype:{}#email\":\"john@example.com\"}}", hash_of("cc")),
                format!("{{\"kilt:ctype:{}#age\":29}}", hash_of("cc")),
            ]
        );
        assert_eq!(IntegrityVerifier.verify(&credential), Ok(()));
        assert_eq!(credential, john_doe());
    }

    #[test]
    fn test_root_hash_matches_known_vectors() {
        let root = IntegrityVerifier::calculate_root_hash(&bare(&[hash_of("11"), hash_of("22")]));
        assert_eq!(
            encode_hash(&root.unwrap()),
            "0x428d37d6b34f605a8ff32b6a04c95d9c7d2aead9ecde193b2f5019b7f13ced23"
        );

        let mut delegated = bare(&[hash_of("11"), hash_of("22")]);
        delegated.delegation_id = Some(hash_of("44"));
        assert_eq!(
            encode_hash(&IntegrityVerifier::calculate_root_hash(&delegated).unwrap()),
            "0x51221e984532cac60fd7d6e844d7d006041d882f8159bca2aa2e5ccc458aabe4"
        );

        let mut legitimated = bare(&[hash_of("11")]);
        let mut legitimation = bare(&[hash_of("55")]);
        legitimation.root_hash =
            "0xbd6732ce1fd898fde2c72fe601c4f49477a577180b7fb2dce74d9a167c738132".to_string();
        legitimated.legitimations.push(legitimation);
        assert_eq!(
            encode_hash(&IntegrityVerifier::calculate_root_hash(&legitimated).unwrap()),
            "0x0d6cd119614779123d7e8f73dfe366de13a8cba89f5e4527a32fc49944189179"
        );
    }

    #[test]
    fn test_tampered_owner_or_contents_is_rejected() {
        let mut new_owner = john_doe();
        new_owner.claim.owner = OTHER.to_string();
        assert_eq!(
            IntegrityVerifier.verify(&new_owner),
            Err(IntegrityError::MissingNonce(format!("{{\"@id\":\"{}\"}}", OTHER)))
        );

        let mut new_age = john_doe();
        new_age.claim.contents.insert("age".to_string(), json!(99));
        assert!(matches!(
            IntegrityVerifier.verify(&new_age),
            Err(IntegrityError::MissingNonce(statement)) if statement.ends_with("#age\":99}")
        ));

        let mut added = john_doe();
        added.claim.contents.insert("admin".to_string(), json!(true));
        assert!(matches!(
            IntegrityVerifier.verify(&added),
            Err(IntegrityError::MissingNonce(_))
        ));

        let mut other_ctype = john_doe();
        other_ctype.claim.ctype_hash = hash_of("dd");
        assert!(matches!(
            IntegrityVerifier.verify(&other_ctype),
            Err(IntegrityError::MissingNonce(_))
        ));
    }

    #[test]
    fn test_undisclosed_property_still_verifies() {
        let mut disclosed = john_doe();
        disclosed.claim.contents.remove("age");
        let age_digest = disclosed
            .claim_nonce_map
            .iter()
            .find(|(_, nonce)| nonce.as_str() == "nonce-2")
            .map(|(digest, _)| digest.clone())
            .unwrap();
        disclosed.claim_nonce_map.remove(&age_digest);

        assert_eq!(IntegrityVerifier.verify(&disclosed), Ok(()));
    }

    #[test]
    fn test_statement_must_be_salted_into_claim_hashes() {
        let mut credential = john_doe();
        let owner_digest = statement_digest(&claim_statements(&credential.claim)[0]);
        credential
            .claim_nonce_map
            .insert(owner_digest, "another-nonce".to_string());
        assert!(matches!(
            IntegrityVerifier.verify(&credential),
            Err(IntegrityError::StatementNotHashed(_))
        ));
    }

    #[test]
    fn test_stray_nonce_is_rejected() {
        let mut credential = john_doe();
        let digest = hash_of("aa");
        credential
            .claim_nonce_map
            .insert(digest.clone(), "stray".to_string());
        assert_eq!(
            IntegrityVerifier.verify(&credential),
            Err(IntegrityError::UnknownNonce(digest))
        );
    }

    #[test]
    fn test_extra_claim_hash_breaks_root() {
        let mut credential = john_doe();
        credential.claim_hashes.push(hash_of("23"));
        assert!(matches!(
            IntegrityVerifier.verify(&credential),
            Err(IntegrityError::RootHashMismatch { .. })
        ));
    }

    #[test]
    fn test_delegation_id_is_committed() {
        let delegated = seal(
            claim(&hash_of("cc"), OWNER, json!({ "email": "john@example.com" })),
            Vec::new(),
            Some(hash_of("44")),
        )
        .unwrap();
        assert_eq!(IntegrityVerifier.verify(&delegated), Ok(()));

        let mut dropped = delegated.clone();
        dropped.delegation_id = None;
        assert!(matches!(
            IntegrityVerifier.verify(&dropped),
            Err(IntegrityError::RootHashMismatch { .. })
        ));
    }

    #[test]
    fn test_legitimations_are_committed_and_verified() {
        let legitimation = seal(
            claim(&hash_of("ee"), OTHER, json!({ "role": "attester" })),
            Vec::new(),
            None,
        )
        .unwrap();
        let credential = seal(
            claim(&hash_of("cc"), OWNER, json!({ "email": "john@example.com" })),
            vec![legitimation],
            None,
        )
        .unwrap();
        assert_eq!(IntegrityVerifier.verify(&credential), Ok(()));

        let mut tampered = credential.clone();
        tampered.legitimations[0].claim.owner = OWNER.to_string();
        assert!(matches!(
            IntegrityVerifier.verify(&tampered),
            Err(IntegrityError::InvalidLegitimation { index: 0, .. })
        ));
    }

    #[test]
    fn test_malformed_fields_are_rejected() {
        let mut bad_ctype = john_doe();
        bad_ctype.claim.ctype_hash = "0x1234".to_string();
        assert!(matches!(
            IntegrityVerifier.verify(&bad_ctype),
            Err(IntegrityError::MalformedHash { field: "cTypeHash", .. })
        ));

        let mut bad_owner = john_doe();
        bad_owner.claim.owner = "john_doe".to_string();
        assert!(matches!(
            IntegrityVerifier.verify(&bad_owner),
            Err(IntegrityError::InvalidOwner(DidParseError::UnsupportedMethod(_)))
        ));

        let mut bad_root = john_doe();
        bad_root.root_hash = "not-a-hash".to_string();
        assert!(matches!(
            IntegrityVerifier.verify(&bad_root),
            Err(IntegrityError::MalformedHash { field: "rootHash", .. })
        ));
    }
}
