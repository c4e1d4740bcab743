// src/services/pipeline.rs
//! The verification run.
//!
//! Resolve the identity, pick the collection endpoint, fetch the collection,
//! verify every credential. The run is all-or-nothing, and the chain
//! connection is released when it ends, whatever the outcome.

use crate::blockchain::ChainApi;
use crate::services::endpoint_selector::{
    filter_endpoints, select_collection_url, MatchMode,
    KILT_PUBLISHED_CREDENTIAL_COLLECTION_V1_TYPE,
};
use crate::services::error::VerificationError;
use crate::services::identity_resolver::{resolve_identity, IdentityQuery, ResolutionStrategy};
use crate::services::integrity::CredentialVerifier;
use crate::services::verifier::Verifier;
use crate::storage::collection_fetcher::CollectionFetcher;
use crate::utils::serialization::to_pretty_json;
use log::{info, warn};
use std::sync::Arc;

/// Knobs of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Service type of the collection endpoint
    pub endpoint_type: String,
    pub match_mode: MatchMode,
    pub strategy: ResolutionStrategy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            endpoint_type: KILT_PUBLISHED_CREDENTIAL_COLLECTION_V1_TYPE.to_string(),
            match_mode: MatchMode::default(),
            strategy: ResolutionStrategy::default(),
        }
    }
}

/// How a run that was not rejected ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Every credential in the collection passed.
    AllValid { did: String, credentials: usize },
    /// The DID advertises no collection endpoint; nothing was fetched.
    NoEndpoint { did: String },
}

/// Runs verification over one chain connection.
pub struct Pipeline {
    chain: Arc<dyn ChainApi>,
    fetcher: CollectionFetcher,
    verifier: Verifier,
    options: PipelineOptions,
}

impl Pipeline {
    /// Builds a pipeline owning `chain` for the duration of [`Pipeline::run`].
    pub fn new(
        chain: Arc<dyn ChainApi>,
        fetcher: CollectionFetcher,
        checker: Arc<dyn CredentialVerifier>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            verifier: Verifier::new(chain.clone(), checker),
            chain,
            fetcher,
            options,
        }
    }

    /// Verifies the published credentials of `query`, then disconnects.
    ///
    /// A failed disconnect is logged and does not change the outcome.
    pub async fn run(&self, query: &IdentityQuery) -> Result<PipelineOutcome, VerificationError> {
        let outcome = self.check(query).await;
        if let Err(e) = self.chain.disconnect().await {
            warn!("Failed to close the chain connection: {}", e);
        }
        outcome
    }

    async fn check(&self, query: &IdentityQuery) -> Result<PipelineOutcome, VerificationError> {
        let identity = resolve_identity(self.chain.as_ref(), query, self.options.strategy).await?;
        let endpoint_type = &self.options.endpoint_type;

        let endpoints = filter_endpoints(
            &identity.document.service,
            endpoint_type,
            self.options.match_mode,
        );
        info!(
            "Endpoints of type \"{}\" for the retrieved DID:\n{}",
            endpoint_type,
            to_pretty_json(&endpoints)
        );

        let Some(url) = select_collection_url(&endpoints) else {
            warn!(
                "The DID has no service endpoints of type \"{}\".",
                endpoint_type
            );
            return Ok(PipelineOutcome::NoEndpoint { did: identity.did });
        };

        let collection = self.fetcher.fetch(url).await?;
        info!(
            "Credential collection behind the endpoint:\n{}",
            to_pretty_json(&collection)
        );

        let credentials = self
            .verifier
            .verify_collection(&collection, &identity.did)
            .await?;
        info!("All retrieved credentials are valid! ✅");

        Ok(PipelineOutcome::AllValid {
            did: identity.did,
            credentials,
        })
    }
}
