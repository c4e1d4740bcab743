// src/storage/collection_fetcher.rs
//! Credential collection retrieval.
//!
//! Collections usually live on IPFS. `ipfs://` URLs are rewritten onto an
//! HTTP gateway; everything else is fetched as is.
//!
//! # Failure handling
//! - A collection is addressed by content hash, so a failed fetch is final
//!   for the run and is never retried
//! - Timeouts come from the HTTP client configuration only

use crate::models::credential::CredentialCollection;
use crate::services::error::VerificationError;
use crate::utils::serialization::deserialize_slice;
use log::info;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Public gateway used for `ipfs://` URLs unless configured otherwise.
pub const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io";

const IPFS_SCHEME: &str = "ipfs://";

/// Why a collection could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(StatusCode),

    #[error("response is not a credential collection: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// HTTP client for published credential collections.
#[derive(Clone, Debug)]
pub struct CollectionFetcher {
    client: reqwest::Client,
    ipfs_gateway: Url,
}

impl CollectionFetcher {
    /// Creates a fetcher.
    ///
    /// # Arguments
    /// * `ipfs_gateway` - Base URL `ipfs://` paths are resolved against
    /// * `timeout` - Whole-request timeout, `None` to rely on the client default
    pub fn new(ipfs_gateway: &str, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut gateway = Url::parse(ipfs_gateway)?;
        if !gateway.path().ends_with('/') {
            let path = format!("{}/", gateway.path());
            gateway.set_path(&path);
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            ipfs_gateway: gateway,
        })
    }

    /// Maps an endpoint URL to the HTTP URL actually requested.
    pub fn resolve_url(&self, raw_url: &str) -> Result<Url, FetchError> {
        match raw_url.strip_prefix(IPFS_SCHEME) {
            Some(content_path) => Ok(self
                .ipfs_gateway
                .join(&format!("ipfs/{}", content_path.trim_start_matches('/')))?),
            None => Ok(Url::parse(raw_url)?),
        }
    }

    /// Fetches and decodes the collection behind `raw_url`.
    ///
    /// # Errors
    /// [`VerificationError::FetchFailure`] on an invalid URL, transport
    /// failure, timeout, non-success status or a body that is not a
    /// collection.
    pub async fn fetch(&self, raw_url: &str) -> Result<CredentialCollection, VerificationError> {
        self.fetch_collection(raw_url)
            .await
            .map_err(|source| VerificationError::FetchFailure {
                url: raw_url.to_string(),
                source,
            })
    }

    async fn fetch_collection(&self, raw_url: &str) -> Result<CredentialCollection, FetchError> {
        let url = self.resolve_url(raw_url)?;
        info!("Fetching credential collection from {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        Ok(deserialize_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection_body() -> String {
        json!([{
            "credential": {
                "claim": {
                    "cTypeHash": "0x01",
                    "contents": { "email": "john@example.com" },
                    "owner": "did:kilt:4nwPAmtsK5toZfBM9WvmAe4Fa3LyZ3X3JHt7EUFfrcPPAZAm"
                },
                "legitimations": [],
                "claimHashes": [],
                "claimNonceMap": {},
                "rootHash": "0x02",
                "delegationId": null
            }
        }])
        .to_string()
    }

    #[test]
    fn test_ipfs_urls_use_gateway() {
        let fetcher = CollectionFetcher::new("https://gateway.example/base", None).unwrap();
        assert_eq!(
            fetcher.resolve_url("ipfs://QmCollection/list.json").unwrap().as_str(),
            "https://gateway.example/base/ipfs/QmCollection/list.json"
        );
        assert_eq!(
            fetcher.resolve_url("https://example.com/c.json").unwrap().as_str(),
            "https://example.com/c.json"
        );
        assert!(matches!(
            fetcher.resolve_url("not a url"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_parses_collection() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/collection.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(collection_body())
            .create_async()
            .await;

        let fetcher = CollectionFetcher::new(DEFAULT_IPFS_GATEWAY, None).unwrap();
        let collection = fetcher
            .fetch(&format!("{}/collection.json", server.url()))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(collection.len(), 1);
        assert_eq!(collection[0].credential.root_hash, "0x02");
    }

    #[tokio::test]
    async fn test_fetch_through_ipfs_gateway() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/ipfs/QmCollection")
            .with_status(200)
            .with_body(collection_body())
            .create_async()
            .await;

        let fetcher = CollectionFetcher::new(&server.url(), None).unwrap();
        let collection = fetcher.fetch("ipfs://QmCollection").await.unwrap();

        mock.assert_async().await;
        assert_eq!(collection.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_body_is_fetch_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/collection.json")
            .with_status(200)
            .with_body("<html>gateway timeout</html>")
            .create_async()
            .await;

        let fetcher = CollectionFetcher::new(DEFAULT_IPFS_GATEWAY, None).unwrap();
        let result = fetcher
            .fetch(&format!("{}/collection.json", server.url()))
            .await;
        assert!(matches!(
            result,
            Err(VerificationError::FetchFailure {
                source: FetchError::Malformed(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_error_status_is_fetch_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/collection.json")
            .with_status(504)
            .create_async()
            .await;

        let fetcher = CollectionFetcher::new(DEFAULT_IPFS_GATEWAY, None).unwrap();
        let result = fetcher
            .fetch(&format!("{}/collection.json", server.url()))
            .await;
        assert!(matches!(
            result,
            Err(VerificationError::FetchFailure {
                source: FetchError::Status(StatusCode::GATEWAY_TIMEOUT),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_failure() {
        let fetcher =
            CollectionFetcher::new(DEFAULT_IPFS_GATEWAY, Some(Duration::from_secs(5))).unwrap();
        let result = fetcher.fetch("http://127.0.0.1:1/collection.json").await;
        assert!(matches!(
            result,
            Err(VerificationError::FetchFailure {
                source: FetchError::Transport(_),
                ..
            })
        ));
    }
}
