// src/blockchain/kilt_client.rs
//! KILT chain client.
//!
//! Maps the [`ChainApi`] queries onto the node's JSON-RPC methods:
//! - DID resolution and the combined web3 name lookup use the DID runtime API
//! - web3 name ownership and attestations are read from pallet storage, see
//!   [`super::chain_storage`]
//!
//! Method names are configurable because they differ between node versions.

use super::chain_storage::{
    attestation_key, decode_attestation, decode_web3_name_owner, web3_name_owner_key,
};
use super::rpc_client::RpcClient;
use super::{ChainApi, ChainError, LinkedIdentity};
use crate::models::attestation::Attestation;
use crate::models::did::{
    Did, DidDocument, DidResolution, ResolutionMetadata, ServiceEndpoint, KILT_DID_PREFIX,
};
use crate::utils::crypto::decode_hash;
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Public Peregrine testnet endpoint.
pub const DEFAULT_ENDPOINT: &str = "wss://peregrine.kilt.io/parachain-public-ws";

/// JSON-RPC method names used for each query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcMethods {
    pub did_query: String,
    pub did_query_by_web3_name: String,
    /// Raw storage read, used for web3 name owners and attestations
    pub get_storage: String,
}

impl Default for RpcMethods {
    fn default() -> Self {
        Self {
            did_query: "did_query".to_string(),
            did_query_by_web3_name: "did_queryByWeb3Name".to_string(),
            get_storage: "state_getStorage".to_string(),
        }
    }
}

/// DID information as returned by the DID RPC.
///
/// `details` is `null` once the DID has been deleted; the identifier and the
/// web3 name linkage may outlive it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcDidLinkedInfo {
    identifier: String,
    #[serde(default)]
    w3n: Option<String>,
    #[serde(default)]
    service_endpoints: Vec<RpcServiceEndpoint>,
    #[serde(default)]
    details: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcServiceEndpoint {
    id: String,
    #[serde(default)]
    service_types: Vec<String>,
    #[serde(default)]
    urls: Vec<String>,
}

impl RpcDidLinkedInfo {
    fn did_uri(&self) -> String {
        if self.identifier.starts_with(KILT_DID_PREFIX) {
            self.identifier.clone()
        } else {
            format!("{}{}", KILT_DID_PREFIX, self.identifier)
        }
    }

    fn into_resolution(self) -> DidResolution {
        let deactivated = self.details.is_none();
        let uri = self.did_uri();
        let document = if deactivated {
            None
        } else {
            Some(DidDocument {
                uri,
                web3_name: self.w3n,
                service: self
                    .service_endpoints
                    .into_iter()
                    .map(|endpoint| ServiceEndpoint {
                        id: endpoint.id,
                        types: endpoint.service_types,
                        urls: endpoint.urls,
                    })
                    .collect(),
            })
        };
        DidResolution {
            document,
            metadata: ResolutionMetadata { deactivated },
        }
    }
}

/// [`ChainApi`] over one WebSocket JSON-RPC connection.
pub struct KiltClient {
    rpc: RpcClient,
    methods: RpcMethods,
}

impl KiltClient {
    /// Connects to a chain endpoint.
    ///
    /// # Arguments
    /// * `endpoint` - WebSocket URL of the node
    /// * `methods` - RPC method names to call
    pub async fn connect(endpoint: &str, methods: RpcMethods) -> Result<Self, ChainError> {
        info!("Connecting to {}", endpoint);
        let rpc = RpcClient::connect(endpoint).await?;
        Ok(Self { rpc, methods })
    }

    async fn linked_info_by_web3_name(
        &self,
        web3_name: &str,
    ) -> Result<Option<RpcDidLinkedInfo>, ChainError> {
        self.rpc
            .request(&self.methods.did_query_by_web3_name, json!([web3_name]))
            .await
    }

    async fn storage(&self, key: String) -> Result<Option<String>, ChainError> {
        self.rpc.request(&self.methods.get_storage, json!([key])).await
    }
}

#[async_trait]
impl ChainApi for KiltClient {
    async fn web3_name_owner(&self, web3_name: &str) -> Result<Option<String>, ChainError> {
        self.storage(web3_name_owner_key(web3_name))
            .await?
            .map(|raw| decode_web3_name_owner(&raw))
            .transpose()
    }

    async fn resolve_did(&self, did: &Did) -> Result<Option<DidResolution>, ChainError> {
        let info: Option<RpcDidLinkedInfo> = self
            .rpc
            .request(&self.methods.did_query, json!([did.address()]))
            .await?;
        Ok(info.map(RpcDidLinkedInfo::into_resolution))
    }

    async fn resolve_web3_name(
        &self,
        web3_name: &str,
    ) -> Result<Option<LinkedIdentity>, ChainError> {
        let info = self.linked_info_by_web3_name(web3_name).await?;
        Ok(info.map(|info| LinkedIdentity {
            web3_name: info.w3n.clone().unwrap_or_else(|| web3_name.to_string()),
            did: info.did_uri(),
            resolution: info.into_resolution(),
        }))
    }

    async fn attestation(&self, root_hash: &str) -> Result<Option<Attestation>, ChainError> {
        // Nothing can be attested under a key that is not a hash.
        let Ok(key) = decode_hash(root_hash) else {
            debug!("Root hash {} is malformed, no attestation to query", root_hash);
            return Ok(None);
        };
        self.storage(attestation_key(&key))
            .await?
            .map(|raw| decode_attestation(root_hash, &raw))
            .transpose()
    }

    async fn disconnect(&self) -> Result<(), ChainError> {
        info!("Disconnecting from chain");
        self.rpc.close().await
    }
}
