// src/blockchain/mod.rs
//! Chain access.
//!
//! [`ChainApi`] is the seam between the verification pipeline and the
//! network: the pipeline only ever talks to a `dyn ChainApi`, and
//! [`kilt_client::KiltClient`] implements it over a WebSocket JSON-RPC
//! connection.

pub mod chain_storage;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod in_memory;
pub mod kilt_client;
pub mod rpc_client;

use crate::models::attestation::Attestation;
use crate::models::did::{Did, DidResolution};
use async_trait::async_trait;
pub use error::ChainError;

/// A web3 name together with the DID owning it and its resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedIdentity {
    pub web3_name: String,
    pub did: String,
    pub resolution: DidResolution,
}

/// Read-only queries the verification pipeline needs from the chain.
///
/// Every call is a single round trip. `Ok(None)` means the chain has no
/// record for the key; `Err` means the round trip itself failed.
#[async_trait]
pub trait ChainApi: Send + Sync {
    /// Looks up the DID owning `web3_name`.
    async fn web3_name_owner(&self, web3_name: &str) -> Result<Option<String>, ChainError>;

    /// Resolves a DID to its document.
    async fn resolve_did(&self, did: &Did) -> Result<Option<DidResolution>, ChainError>;

    /// Resolves a web3 name, its owner and the owner's document in one call.
    async fn resolve_web3_name(
        &self,
        web3_name: &str,
    ) -> Result<Option<LinkedIdentity>, ChainError>;

    /// Fetches the attestation stored under a credential root hash.
    async fn attestation(&self, root_hash: &str) -> Result<Option<Attestation>, ChainError>;

    /// Closes the connection. Later queries fail with [`ChainError::ConnectionClosed`].
    async fn disconnect(&self) -> Result<(), ChainError>;
}
