// src/blockchain/error.rs
//! Errors surfaced by the chain connection.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Failure of a round trip to the chain endpoint.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The WebSocket could not be opened or failed mid-flight.
    #[error("WebSocket transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The node answered with JSON we could not map onto the expected type.
    #[error("Failed to decode RPC payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// A storage entry was not valid hex or did not SCALE decode.
    #[error("Malformed storage entry: {0}")]
    Storage(String),

    /// The connection was closed before a reply arrived.
    #[error("Connection to the chain endpoint is closed")]
    ConnectionClosed,
}
