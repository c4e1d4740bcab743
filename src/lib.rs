// src/lib.rs

//! # Published Credential Checker
//!
//! Verifies the credentials a KILT identity publishes about itself.
//!
//! ## Architecture Overview
//! 1. **Blockchain Layer**: [`blockchain::ChainApi`], implemented over WebSocket JSON-RPC by
//!    [`blockchain::kilt_client::KiltClient`]
//! 2. **Services Layer**: identity resolution, endpoint selection, credential
//!    verification and the [`services::pipeline::Pipeline`] tying them together
//! 3. **Storage Layer**: HTTP/IPFS retrieval of the credential collection
//! 4. **Models**: DIDs, documents, credentials and attestations

pub mod blockchain;    // Chain connection and queries
pub mod models;        // Data structures
pub mod services;      // Verification logic
pub mod settings;      // Layered configuration
pub mod storage;       // Collection retrieval
pub mod utils;         // Hashing and JSON helpers

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;     // Fixture builders
