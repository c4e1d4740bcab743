// src/services/verifier.rs
//! Credential verification against on-chain attestation state.
//!
//! Each credential is checked in a fixed order: attestation present, not
//! revoked, integrity, attestation matches, subject. A collection is valid
//! only if every credential is; the checks run concurrently and the first
//! rejection is returned.

use crate::blockchain::ChainApi;
use crate::models::credential::{Credential, PublishedCredential};
use crate::models::did::is_same_subject;
use crate::services::error::VerificationError;
use crate::services::integrity::{CredentialVerifier, IntegrityError};
use futures::future::try_join_all;
use log::debug;
use std::sync::Arc;

/// Verifies credentials against the chain.
///
/// The Verifier provides:
/// - Shared access to the chain connection via `Arc<dyn ChainApi>`
/// - A pluggable integrity check via `Arc<dyn CredentialVerifier>`
#[derive(Clone)]
pub struct Verifier {
    chain: Arc<dyn ChainApi>,
    checker: Arc<dyn CredentialVerifier>,
}

impl Verifier {
    pub fn new(chain: Arc<dyn ChainApi>, checker: Arc<dyn CredentialVerifier>) -> Self {
        Self { chain, checker }
    }

    /// Verifies one credential.
    ///
    /// # Arguments
    /// * `credential` - The credential to check
    /// * `expected_subject` - DID the credential must be about
    ///
    /// # Errors
    /// - [`VerificationError::AttestationNotFound`] if nothing is attested under the root hash
    /// - [`VerificationError::CredentialRevoked`] if the attestation is revoked
    /// - [`VerificationError::CredentialInvalid`] if integrity fails or the attestation is for other content
    /// - [`VerificationError::SubjectMismatch`] if the claim owner is another subject
    pub async fn verify_credential(
        &self,
        credential: &Credential,
        expected_subject: &str,
    ) -> Result<(), VerificationError> {
        let root_hash = &credential.root_hash;
        let attestation = self.chain.attestation(root_hash).await?.ok_or_else(|| {
            VerificationError::AttestationNotFound {
                root_hash: root_hash.clone(),
            }
        })?;

        if attestation.revoked {
            return Err(VerificationError::CredentialRevoked {
                root_hash: root_hash.clone(),
            });
        }

        let invalid = |source: IntegrityError| VerificationError::CredentialInvalid {
            root_hash: root_hash.clone(),
            source,
        };
        self.checker.verify(credential).map_err(invalid)?;
        if !attestation.matches(credential) {
            return Err(invalid(IntegrityError::AttestationMismatch));
        }

        if !is_same_subject(credential.subject(), expected_subject) {
            return Err(VerificationError::SubjectMismatch {
                root_hash: root_hash.clone(),
                expected: expected_subject.to_string(),
                actual: credential.subject().to_string(),
            });
        }

        debug!("Credential {} verified", root_hash);
        Ok(())
    }

    /// Verifies every credential of a collection concurrently.
    ///
    /// Returns the number of verified credentials, or the first rejection.
    /// Checks still in flight when a rejection arrives are dropped.
    pub async fn verify_collection(
        &self,
        collection: &[PublishedCredential],
        expected_subject: &str,
    ) -> Result<usize, VerificationError> {
        try_join_all(
            collection
                .iter()
                .map(|entry| self.verify_credential(&entry.credential, expected_subject)),
        )
        .await?;
        Ok(collection.len())
    }
}
