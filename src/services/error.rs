// src/services/error.rs
//! Reasons a verification run is rejected.

use crate::blockchain::ChainError;
use crate::services::integrity::IntegrityError;
use crate::storage::collection_fetcher::FetchError;
use thiserror::Error;

/// Every condition that rejects a run. None of them is retried.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The web3 name or DID does not resolve.
    #[error("The identity \"{0}\" does not exist on the KILT blockchain")]
    IdentityNotFound(String),

    /// The DID resolved, but its document has been deleted.
    #[error("The DID {0} has already been deleted")]
    IdentityDeleted(String),

    /// The collection could not be retrieved or decoded.
    #[error("Failed to fetch the credential collection from {url}: {source}")]
    FetchFailure {
        url: String,
        #[source]
        source: FetchError,
    },

    /// No attestation is stored under the credential's root hash.
    #[error("Credential {root_hash} has no on-chain attestation")]
    AttestationNotFound { root_hash: String },

    #[error("Credential {root_hash} revoked")]
    CredentialRevoked { root_hash: String },

    #[error("Credential {root_hash} is invalid: {source}")]
    CredentialInvalid {
        root_hash: String,
        #[source]
        source: IntegrityError,
    },

    /// The credential is about someone other than the resolved DID.
    #[error("Credential {root_hash} refers to {actual}, expected subject {expected}")]
    SubjectMismatch {
        root_hash: String,
        expected: String,
        actual: String,
    },

    /// A chain round trip failed.
    #[error("Chain query failed: {0}")]
    Chain(#[from] ChainError),
}
