//! Request/response plumbing shared by the browser and page sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::SinkExt;
use futures::stream::SplitSink;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::trace;

use super::error::CdpError;
use super::protocol::{CdpRequest, CdpResponse};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type Reply = oneshot::Sender<Result<Value, CdpError>>;

/// How long a command may wait for its response.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Write half of the connection plus the table of unanswered commands.
/// Clones share the same connection.
#[derive(Clone)]
pub(crate) struct Transport {
    sink: Arc<tokio::sync::Mutex<WsSink>>,
    pending: Arc<Mutex<HashMap<u64, Reply>>>,
    next_id: Arc<AtomicU64>,
}

/// A decoded inbound message.
#[derive(Debug)]
pub(crate) enum Inbound {
    Reply {
        id: u64,
        result: Result<Value, CdpError>,
    },
    Event {
        session_id: String,
        event: CdpResponse,
    },
}

impl Inbound {
    /// Decode one text frame. `None` for frames that are neither a reply
    /// nor an event.
    pub(crate) fn decode(text: &str) -> Result<Option<Self>, CdpError> {
        let message: CdpResponse = serde_json::from_str(text)?;
        if let Some(id) = message.id {
            let result = match message.error {
                Some(error) => Err(CdpError::Protocol {
                    code: error.code,
                    message: error.message,
                }),
                None => Ok(message.result.unwrap_or(Value::Null)),
            };
            return Ok(Some(Inbound::Reply { id, result }));
        }
        if message.method.is_some() {
            return Ok(Some(Inbound::Event {
                session_id: message.session_id.clone().unwrap_or_default(),
                event: message,
            }));
        }
        Ok(None)
    }
}

impl Transport {
    pub(crate) fn new(sink: WsSink) -> Self {
        Self {
            sink: Arc::new(tokio::sync::Mutex::new(sink)),
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Send a command and wait for its reply. Page-level commands carry
    /// the session id of their target.
    pub(crate) async fn send(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(str::to_string),
        };
        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        if let Err(e) = self.sink.lock().await.send(Message::Text(json.into())).await {
            self.pending.lock().remove(&id);
            return Err(e.into());
        }

        match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("{} got no response", method)))
            }
        }
    }

    /// Hand a reply to the command waiting for it.
    pub(crate) fn resolve(&self, id: u64, result: Result<Value, CdpError>) {
        let waiter = self.pending.lock().remove(&id);
        match waiter {
            Some(tx) => {
                let _ = tx.send(result);
            }
            None => trace!(id, "Reply for a command nobody waits for"),
        }
    }

    /// Fail every unanswered command; the connection is gone.
    pub(crate) fn fail_all(&self) {
        for (_, tx) in self.pending.lock().drain() {
            let _ = tx.send(Err(CdpError::SessionClosed));
        }
    }
}
