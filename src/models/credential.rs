// src/models/credential.rs
//! Published credential data model.
//!
//! A DID advertises a credential collection through a service endpoint. The
//! collection is a JSON array whose entries each wrap one attested credential
//! and optional presentation metadata.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// An attested credential as published by its holder.
///
/// The credential commits to its claim through `claim_hashes` and to the
/// whole structure through `root_hash`, which is also the key of its on-chain
/// attestation.
///
/// # Serialization
/// Field names follow the camelCase wire format of published collections.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// The claim about the subject
    pub claim: Claim,

    /// Credentials the attester relied on, committed into the root hash
    #[serde(default)]
    pub legitimations: Vec<Credential>,

    /// Salted hashes of the individual claim statements
    #[serde(default)]
    pub claim_hashes: Vec<String>,

    /// Claim hash to nonce map used to salt the statements
    #[serde(default)]
    pub claim_nonce_map: BTreeMap<String, String>,

    /// Hex-encoded root hash; the attestation lookup key
    /// Example: "0x428d37d6b34f605a8ff32b6a04c95d9c7d2aead9ecde193b2f5019b7f13ced23"
    pub root_hash: String,

    /// Delegation node the attester acted under, if any
    #[serde(default)]
    pub delegation_id: Option<String>,
}

impl Credential {
    /// DID of the subject this credential makes a claim about.
    pub fn subject(&self) -> &str {
        &self.claim.owner
    }
}

/// A claim about a subject conforming to a CType.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Claim {
    /// Hash of the CType (claim schema)
    #[serde(rename = "cTypeHash")]
    pub ctype_hash: String,

    /// Claimed properties
    /// Example: {"name": "John Doe", "age": 42}
    #[serde(default)]
    pub contents: Map<String, Value>,

    /// DID of the subject
    pub owner: String,
}

/// One entry of a published credential collection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PublishedCredential {
    pub credential: Credential,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CredentialMetadata>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_url: Option<String>,
}

/// The content behind a `KiltPublishedCredentialCollectionV1` endpoint.
pub type CredentialCollection = Vec<PublishedCredential>;
