// src/main.rs

//! # Published Credential Checker - Main Entry Point
//!
//! Resolves a web3 name or DID, fetches the credential collection it
//! publishes and verifies every credential against the chain.
//!
//! ## Exit Status
//! - `0`: all credentials are valid, or the DID publishes no collection
//! - `1`: any failure; the reason is logged
//!
//! ## Environment Variables
//! - `RUST_LOG`: log filter (default: `info`)
//! - `CREDCHECK_*`: settings overrides, see [`credential_check::settings`]

use anyhow::Context;
use clap::Parser;
use credential_check::blockchain::kilt_client::KiltClient;
use credential_check::blockchain::ChainApi;
use credential_check::services::endpoint_selector::MatchMode;
use credential_check::services::identity_resolver::{IdentityQuery, ResolutionStrategy};
use credential_check::services::integrity::IntegrityVerifier;
use credential_check::services::pipeline::{Pipeline, PipelineOutcome};
use credential_check::settings::Settings;
use credential_check::storage::collection_fetcher::CollectionFetcher;
use dotenv::dotenv;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Verify the credentials a KILT identity publishes.
#[derive(Parser, Debug)]
#[command(name = "credential-check", version, about)]
struct Cli {
    /// Web3 name or DID to check
    #[arg(default_value = "john_doe")]
    identity: String,

    /// WebSocket URL of the chain node
    #[arg(long)]
    endpoint: Option<String>,

    /// How a web3 name is resolved
    #[arg(long, value_enum)]
    strategy: Option<ResolutionStrategy>,

    /// How service endpoint types are matched
    #[arg(long, value_enum)]
    match_mode: Option<MatchMode>,

    /// Settings file to load instead of ./credential-check.toml
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) {
        if let Some(endpoint) = &self.endpoint {
            settings.endpoint_address = endpoint.clone();
        }
        if let Some(strategy) = self.strategy {
            settings.resolution_strategy = strategy;
        }
        if let Some(match_mode) = self.match_mode {
            settings.match_mode = match_mode;
        }
    }
}

/// Main application entry point
///
/// # Run Sequence
/// 1. Load environment and settings
/// 2. Connect to the chain
/// 3. Run the verification pipeline, which always disconnects
/// 4. Log the outcome and map it to the exit status
#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let result = run(Cli::parse()).await;
    report(&result);
    ExitCode::from(exit_status(&result))
}

/// Exit status of a finished run: 0 unless it was rejected or never started.
fn exit_status(result: &anyhow::Result<PipelineOutcome>) -> u8 {
    match result {
        Ok(PipelineOutcome::AllValid { .. } | PipelineOutcome::NoEndpoint { .. }) => 0,
        Err(_) => 1,
    }
}

fn report(result: &anyhow::Result<PipelineOutcome>) {
    match result {
        Ok(PipelineOutcome::AllValid { did, credentials }) => {
            info!("{} credential(s) of {} verified", credentials, did)
        }
        Ok(PipelineOutcome::NoEndpoint { did }) => info!("Nothing to verify for {}", did),
        Err(e) => error!("{:#}", e),
    }
}

async fn run(cli: Cli) -> anyhow::Result<PipelineOutcome> {
    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    cli.apply(&mut settings);

    let fetcher = CollectionFetcher::new(&settings.ipfs_gateway, settings.fetch_timeout())
        .context("Failed to build the HTTP client")?;

    let chain: Arc<dyn ChainApi> = Arc::new(
        KiltClient::connect(&settings.endpoint_address, settings.rpc_methods.clone())
            .await
            .with_context(|| format!("Failed to connect to {}", settings.endpoint_address))?,
    );

    let pipeline = Pipeline::new(
        chain,
        fetcher,
        Arc::new(IntegrityVerifier),
        settings.pipeline_options(),
    );
    let query = IdentityQuery::from_input(&cli.identity);
    Ok(pipeline.run(&query).await?)
}
