// src/settings.rs
//! Runtime settings.
//!
//! Layered with the `config` crate, later layers winning:
//! 1. built-in defaults
//! 2. `credential-check.toml` in the working directory, or the file given on
//!    the command line
//! 3. `CREDCHECK_*` environment variables, `__` separating nested keys
//!    (e.g. `CREDCHECK_RPC_METHODS__DID_QUERY`)

use crate::blockchain::kilt_client::{RpcMethods, DEFAULT_ENDPOINT};
use crate::services::endpoint_selector::{MatchMode, KILT_PUBLISHED_CREDENTIAL_COLLECTION_V1_TYPE};
use crate::services::identity_resolver::ResolutionStrategy;
use crate::services::pipeline::PipelineOptions;
use crate::storage::collection_fetcher::DEFAULT_IPFS_GATEWAY;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const ENV_PREFIX: &str = "CREDCHECK";
const DEFAULT_FILE: &str = "credential-check";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// WebSocket URL of the chain node
    pub endpoint_address: String,
    /// Service type of the collection endpoint
    pub endpoint_type: String,
    pub match_mode: MatchMode,
    pub resolution_strategy: ResolutionStrategy,
    /// Gateway `ipfs://` URLs are fetched through
    pub ipfs_gateway: String,
    /// Collection fetch timeout; unset leaves it to the HTTP client
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,
    pub rpc_methods: RpcMethods,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint_address: DEFAULT_ENDPOINT.to_string(),
            endpoint_type: KILT_PUBLISHED_CREDENTIAL_COLLECTION_V1_TYPE.to_string(),
            match_mode: MatchMode::default(),
            resolution_strategy: ResolutionStrategy::default(),
            ipfs_gateway: DEFAULT_IPFS_GATEWAY.to_string(),
            fetch_timeout_secs: None,
            rpc_methods: RpcMethods::default(),
        }
    }
}

impl Settings {
    /// Loads settings from defaults, a file and the environment.
    ///
    /// # Arguments
    /// * `file` - Settings file that must exist; `None` reads the optional default file
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_FILE).required(false),
        };

        Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(file_source)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            endpoint_type: self.endpoint_type.clone(),
            match_mode: self.match_mode,
            strategy: self.resolution_strategy,
        }
    }
}
