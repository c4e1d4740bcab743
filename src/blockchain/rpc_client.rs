// src/blockchain/rpc_client.rs
//! WebSocket JSON-RPC 2.0 client.
//!
//! One background task owns the socket. Callers hand it serialized requests
//! over an `mpsc` channel together with a `oneshot` responder, and the task
//! routes each reply back by its JSON-RPC `id`. Concurrent requests therefore
//! share one connection and may complete in any order.

use super::error::ChainError;
use futures::{SinkExt, StreamExt};
use log::{debug, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WebSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Responder = oneshot::Sender<Result<Value, ChainError>>;

const COMMAND_BUFFER: usize = 32;

/// JSON-RPC 2.0 request
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// JSON-RPC 2.0 response. Subscription notifications carry no `id`.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

enum Command {
    Call {
        id: u64,
        payload: String,
        reply: Responder,
    },
    Close,
}

/// Handle to a live JSON-RPC connection.
pub struct RpcClient {
    commands: mpsc::Sender<Command>,
    next_id: AtomicU64,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RpcClient {
    /// Opens a WebSocket to `endpoint` and starts the connection task.
    ///
    /// # Errors
    /// Returns [`ChainError::Transport`] if the handshake fails.
    pub async fn connect(endpoint: &str) -> Result<Self, ChainError> {
        let (socket, _) = connect_async(endpoint).await?;
        debug!("WebSocket connected to {}", endpoint);

        let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
        let task = tokio::spawn(run_connection(socket, receiver));

        Ok(Self {
            commands,
            next_id: AtomicU64::new(1),
            task: Mutex::new(Some(task)),
        })
    }

    /// Sends one request and decodes its `result` into `T`.
    ///
    /// A `null` result decodes into `None` when `T` is an `Option`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = serde_json::to_string(&RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        })?;

        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Call { id, payload, reply })
            .await
            .map_err(|_| ChainError::ConnectionClosed)?;

        let value = response.await.map_err(|_| ChainError::ConnectionClosed)??;
        Ok(serde_json::from_value(value)?)
    }

    /// Closes the socket and waits for the connection task to finish.
    ///
    /// Requests still in flight fail with [`ChainError::ConnectionClosed`].
    /// Closing twice is a no-op.
    pub async fn close(&self) -> Result<(), ChainError> {
        let Some(task) = self.task.lock().await.take() else {
            return Ok(());
        };
        // The task may already be gone if the remote side hung up.
        let _ = self.commands.send(Command::Close).await;
        task.await.map_err(|_| ChainError::ConnectionClosed)
    }
}

async fn run_connection(mut socket: WebSocket, mut commands: mpsc::Receiver<Command>) {
    let mut pending: HashMap<u64, Responder> = HashMap::new();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Call { id, payload, reply }) => {
                    debug!("RPC request: {}", payload);
                    if let Err(e) = socket.send(Message::text(payload)).await {
                        let _ = reply.send(Err(ChainError::Transport(e)));
                        break;
                    }
                    pending.insert(id, reply);
                }
                Some(Command::Close) | None => {
                    if let Err(e) = socket.close(None).await {
                        debug!("WebSocket close handshake failed: {}", e);
                    }
                    break;
                }
            },
            frame = socket.next() => match frame {
                Some(Ok(Message::Text(text))) => dispatch_response(text.as_str(), &mut pending),
                Some(Ok(Message::Close(_))) | None => {
                    warn!("Chain endpoint closed the connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket read error: {}", e);
                    break;
                }
            }
        }
    }

    for (_, reply) in pending.drain() {
        let _ = reply.send(Err(ChainError::ConnectionClosed));
    }
}

fn dispatch_response(text: &str, pending: &mut HashMap<u64, Responder>) {
    debug!("RPC response: {}", text);
    let response = match serde_json::from_str::<RpcResponse>(text) {
        Ok(response) => response,
        Err(e) => {
            warn!("Ignoring malformed RPC frame: {}", e);
            return;
        }
    };

    let Some(reply) = response.id.and_then(|id| pending.remove(&id)) else {
        return;
    };
    let outcome = match response.error {
        Some(error) => Err(ChainError::Rpc {
            code: error.code,
            message: error.message,
        }),
        None => Ok(response.result.unwrap_or(Value::Null)),
    };
    let _ = reply.send(outcome);
}
