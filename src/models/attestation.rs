// src/models/attestation.rs
//! On-chain attestation record.

use crate::models::credential::Credential;
use serde::{Deserialize, Serialize};

/// Attestation of a credential, keyed on chain by the credential root hash.
///
/// This tool only reads attestations; revocation happens elsewhere.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    /// Root hash of the attested credential
    pub claim_hash: String,

    #[serde(rename = "cTypeHash")]
    pub ctype_hash: String,

    /// DID of the attester
    pub owner: String,

    #[serde(default)]
    pub delegation_id: Option<String>,

    pub revoked: bool,
}

impl Attestation {
    /// Whether this record attests exactly `credential`: same root hash, same CType.
    pub fn matches(&self, credential: &Credential) -> bool {
        self.claim_hash.eq_ignore_ascii_case(&credential.root_hash)
            && self
                .ctype_hash
                .eq_ignore_ascii_case(&credential.claim.ctype_hash)
    }
}
