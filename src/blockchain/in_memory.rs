// src/blockchain/in_memory.rs
//! In-memory chain state.
//!
//! Implements [`ChainApi`] over hash maps so the pipeline can run without a
//! node, for local fixtures and tests. Disconnecting behaves like the real
//! client: every later query fails with [`ChainError::ConnectionClosed`].

use super::{ChainApi, ChainError, LinkedIdentity};
use crate::models::attestation::Attestation;
use crate::models::did::{Did, DidDocument, DidResolution, ResolutionMetadata};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Chain state held in memory.
///
/// DIDs are keyed by address, so light and full DIDs over the same key
/// resolve to the same entry. Attestations are keyed by lowercase root hash.
#[derive(Debug, Default)]
pub struct InMemoryChain {
    web3_names: HashMap<String, String>,
    dids: HashMap<String, DidResolution>,
    attestations: HashMap<String, Attestation>,
    attestation_queries: AtomicUsize,
    disconnected: AtomicBool,
}

impl InMemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links `web3_name` to `did`, replacing any previous owner.
    pub fn register_web3_name(&mut self, web3_name: &str, did: &str) {
        self.web3_names
            .insert(web3_name.to_string(), did.to_string());
    }

    /// Stores a live DID document under its URI.
    pub fn store_document(&mut self, document: DidDocument) {
        let key = Self::did_key(&document.uri);
        self.dids.insert(
            key,
            DidResolution {
                document: Some(document),
                metadata: ResolutionMetadata::default(),
            },
        );
    }

    /// Tombstones a DID. Resolution keeps succeeding but yields no document.
    pub fn delete_did(&mut self, did: &str) {
        self.dids.insert(
            Self::did_key(did),
            DidResolution {
                document: None,
                metadata: ResolutionMetadata { deactivated: true },
            },
        );
    }

    /// Stores an attestation under its claim hash.
    pub fn store_attestation(&mut self, attestation: Attestation) {
        self.attestations
            .insert(attestation.claim_hash.to_ascii_lowercase(), attestation);
    }

    /// Whether [`ChainApi::disconnect`] has been called.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    /// Number of attestation lookups served so far.
    pub fn attestation_queries(&self) -> usize {
        self.attestation_queries.load(Ordering::SeqCst)
    }

    fn did_key(did: &str) -> String {
        Did::parse(did)
            .map(|did| did.address().to_string())
            .unwrap_or_else(|_| did.to_string())
    }

    fn ensure_connected(&self) -> Result<(), ChainError> {
        if self.is_disconnected() {
            Err(ChainError::ConnectionClosed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChainApi for InMemoryChain {
    async fn web3_name_owner(&self, web3_name: &str) -> Result<Option<String>, ChainError> {
        self.ensure_connected()?;
        Ok(self.web3_names.get(web3_name).cloned())
    }

    async fn resolve_did(&self, did: &Did) -> Result<Option<DidResolution>, ChainError> {
        self.ensure_connected()?;
        Ok(self.dids.get(did.address()).cloned())
    }

    async fn resolve_web3_name(
        &self,
        web3_name: &str,
    ) -> Result<Option<LinkedIdentity>, ChainError> {
        self.ensure_connected()?;
        let Some(did) = self.web3_names.get(web3_name) else {
            return Ok(None);
        };
        Ok(self
            .dids
            .get(&Self::did_key(did))
            .map(|resolution| LinkedIdentity {
                web3_name: web3_name.to_string(),
                did: did.clone(),
                resolution: resolution.clone(),
            }))
    }

    async fn attestation(&self, root_hash: &str) -> Result<Option<Attestation>, ChainError> {
        self.ensure_connected()?;
        self.attestation_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .attestations
            .get(&root_hash.to_ascii_lowercase())
            .cloned())
    }

    async fn disconnect(&self) -> Result<(), ChainError> {
        self.disconnected.store(true, Ordering::SeqCst);
        Ok(())
    }
}
