// src/services/endpoint_selector.rs
//! Service endpoint selection.
//!
//! Filtering is a pure subset operation over the document's services: it
//! keeps the original order and filtering an already filtered list changes
//! nothing.

use crate::models::did::ServiceEndpoint;
use serde::{Deserialize, Serialize};

/// Service type advertising a published credential collection.
pub const KILT_PUBLISHED_CREDENTIAL_COLLECTION_V1_TYPE: &str =
    "KiltPublishedCredentialCollectionV1";

/// How a declared service type is compared with the wanted one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// A declared type equals the wanted type.
    #[default]
    Exact,
    /// A declared type contains the wanted type.
    Substring,
}

impl MatchMode {
    pub fn matches(self, declared: &str, wanted: &str) -> bool {
        match self {
            MatchMode::Exact => declared == wanted,
            MatchMode::Substring => declared.contains(wanted),
        }
    }
}

/// Keeps the endpoints declaring `endpoint_type`.
pub fn filter_endpoints<'a>(
    service: &'a [ServiceEndpoint],
    endpoint_type: &str,
    mode: MatchMode,
) -> Vec<&'a ServiceEndpoint> {
    service
        .iter()
        .filter(|endpoint| {
            endpoint
                .types
                .iter()
                .any(|declared| mode.matches(declared, endpoint_type))
        })
        .collect()
}

/// First URL of the first endpoint, if there is one.
pub fn select_collection_url<'a>(endpoints: &[&'a ServiceEndpoint]) -> Option<&'a str> {
    endpoints
        .first()
        .and_then(|endpoint| endpoint.urls.first())
        .map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(id: &str, types: &[&str], urls: &[&str]) -> ServiceEndpoint {
        ServiceEndpoint {
            id: id.to_string(),
            types: types.iter().map(|t| t.to_string()).collect(),
            urls: urls.iter().map(|u| u.to_string()).collect(),
        }
    }

    fn service() -> Vec<ServiceEndpoint> {
        vec![
            endpoint("#linkedin", &["LinkedDomains"], &["https://example.com"]),
            endpoint(
                "#collection",
                &["KiltPublishedCredentialCollectionV1"],
                &["ipfs://QmFirst", "ipfs://QmMirror"],
            ),
            endpoint(
                "#collection-v2",
                &["KiltPublishedCredentialCollectionV1Extended"],
                &["ipfs://QmSecond"],
            ),
        ]
    }

    #[test]
    fn test_exact_match_selects_first_url() {
        let service = service();
        let endpoints = filter_endpoints(
            &service,
            KILT_PUBLISHED_CREDENTIAL_COLLECTION_V1_TYPE,
            MatchMode::Exact,
        );
        assert_eq!(endpoints.len(), 1);
        assert_eq!(select_collection_url(&endpoints), Some("ipfs://QmFirst"));
    }

    #[test]
    fn test_substring_match_keeps_order() {
        let service = service();
        let endpoints = filter_endpoints(
            &service,
            KILT_PUBLISHED_CREDENTIAL_COLLECTION_V1_TYPE,
            MatchMode::Substring,
        );
        let ids: Vec<&str> = endpoints.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["#collection", "#collection-v2"]);
    }

    #[test]
    fn test_filter_is_idempotent_subset() {
        let service = service();
        for mode in [MatchMode::Exact, MatchMode::Substring] {
            let once: Vec<ServiceEndpoint> =
                filter_endpoints(&service, "Kilt", mode).into_iter().cloned().collect();
            let twice: Vec<ServiceEndpoint> =
                filter_endpoints(&once, "Kilt", mode).into_iter().cloned().collect();
            assert_eq!(once, twice);
            assert!(once.iter().all(|e| service.contains(e)));
        }
    }

    #[test]
    fn test_absent_type_yields_nothing() {
        let service = service();
        let endpoints = filter_endpoints(&service, "DIDCommMessaging", MatchMode::Substring);
        assert!(endpoints.is_empty());
        assert_eq!(select_collection_url(&endpoints), None);
    }

    #[test]
    fn test_endpoint_without_urls_yields_no_target() {
        let service = vec![endpoint("#empty", &["KiltPublishedCredentialCollectionV1"], &[])];
        let endpoints = filter_endpoints(
            &service,
            KILT_PUBLISHED_CREDENTIAL_COLLECTION_V1_TYPE,
            MatchMode::Exact,
        );
        assert_eq!(select_collection_url(&endpoints), None);
    }
}
