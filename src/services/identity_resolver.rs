// src/services/identity_resolver.rs
//! Identity resolution.
//!
//! Turns a web3 name or a DID into the DID and its live document. Each
//! resolution is a fresh chain round trip; nothing is cached or retried.

use crate::blockchain::ChainApi;
use crate::models::did::{Did, DidDocument, DidResolution};
use crate::services::error::VerificationError;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the user asked to verify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityQuery {
    Web3Name(String),
    Did(String),
}

impl IdentityQuery {
    /// Anything starting with `did:` is taken as a DID, everything else as a web3 name.
    pub fn from_input(input: &str) -> Self {
        let input = input.trim();
        if input.starts_with("did:") {
            IdentityQuery::Did(input.to_string())
        } else {
            IdentityQuery::Web3Name(input.to_string())
        }
    }
}

impl fmt::Display for IdentityQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityQuery::Web3Name(name) => f.write_str(name),
            IdentityQuery::Did(did) => f.write_str(did),
        }
    }
}

/// How a web3 name is turned into a document.
///
/// Older runtimes only expose the owner lookup; newer ones answer name,
/// DID and document in one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    /// Look up the owner DID, then resolve it separately.
    #[default]
    OwnerLookup,
    /// Resolve name, owner and document in one query.
    Linked,
}

/// A DID with its live document.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedIdentity {
    pub did: String,
    pub web3_name: Option<String>,
    pub document: DidDocument,
}

/// Resolves `query` against the chain.
///
/// # Errors
/// - [`VerificationError::IdentityNotFound`] if the name has no owner or the DID is unknown
/// - [`VerificationError::IdentityDeleted`] if the DID's document was deleted
/// - [`VerificationError::Chain`] if a round trip fails
pub async fn resolve_identity(
    chain: &dyn ChainApi,
    query: &IdentityQuery,
    strategy: ResolutionStrategy,
) -> Result<ResolvedIdentity, VerificationError> {
    match (query, strategy) {
        (IdentityQuery::Did(did), _) => resolve_did(chain, did, None).await,
        (IdentityQuery::Web3Name(name), ResolutionStrategy::OwnerLookup) => {
            let owner = chain
                .web3_name_owner(name)
                .await?
                .ok_or_else(|| VerificationError::IdentityNotFound(name.clone()))?;
            info!("DID for \"{}\": {}", name, owner);
            resolve_did(chain, &owner, Some(name.clone())).await
        }
        (IdentityQuery::Web3Name(name), ResolutionStrategy::Linked) => {
            let linked = chain
                .resolve_web3_name(name)
                .await?
                .ok_or_else(|| VerificationError::IdentityNotFound(name.clone()))?;
            info!("DID for \"{}\": {}", linked.web3_name, linked.did);
            into_identity(linked.did, Some(linked.web3_name), linked.resolution)
        }
    }
}

async fn resolve_did(
    chain: &dyn ChainApi,
    did: &str,
    web3_name: Option<String>,
) -> Result<ResolvedIdentity, VerificationError> {
    let parsed =
        Did::parse(did).map_err(|_| VerificationError::IdentityNotFound(did.to_string()))?;
    let resolution = chain
        .resolve_did(&parsed)
        .await?
        .ok_or_else(|| VerificationError::IdentityNotFound(did.to_string()))?;
    into_identity(parsed.to_string(), web3_name, resolution)
}

fn into_identity(
    did: String,
    web3_name: Option<String>,
    resolution: DidResolution,
) -> Result<ResolvedIdentity, VerificationError> {
    // No document on a known DID means it was deleted.
    let Some(document) = resolution.document else {
        return Err(VerificationError::IdentityDeleted(did));
    };
    Ok(ResolvedIdentity {
        web3_name: web3_name.or_else(|| document.web3_name.clone()),
        did,
        document,
    })
}
