//! Browser-level CDP connection.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::SplitStream;
use serde_json::{Value, json};
use tokio::sync::{RwLock, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace, warn};

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpResponse, PageInfo};
use super::session::PageSession;
use super::transport::{Inbound, Transport, WsStream};

type EventRoutes = Arc<RwLock<HashMap<String, mpsc::UnboundedSender<CdpResponse>>>>;

/// Connection to a browser started with `--remote-debugging-port`.
///
/// One WebSocket carries the commands of every attached page; replies are
/// matched by id and events are routed to their page by session id.
pub struct CdpClient {
    http_endpoint: String,
    browser_ws_url: String,
    transport: Transport,
    routes: EventRoutes,
    reader: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect through the DevTools HTTP endpoint, e.g. `http://localhost:9222`.
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http_endpoint = url::Url::parse(endpoint)?
            .as_str()
            .trim_end_matches('/')
            .to_string();

        let version: BrowserVersion = reqwest::get(format!("{}/json/version", http_endpoint))
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
            .json()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?;
        info!(
            browser = %version.browser,
            protocol = %version.protocol_version,
            "Connected to browser"
        );

        let browser_ws_url = version.web_socket_debugger_url;
        let (stream, _) = tokio_tungstenite::connect_async(&browser_ws_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("{}: {}", browser_ws_url, e)))?;
        let (sink, source) = stream.split();

        let transport = Transport::new(sink);
        let routes: EventRoutes = Arc::new(RwLock::new(HashMap::new()));
        let reader = tokio::spawn(read_loop(source, transport.clone(), routes.clone()));

        Ok(Self {
            http_endpoint,
            browser_ws_url,
            transport,
            routes,
            reader,
        })
    }

    pub fn browser_ws_url(&self) -> &str {
        &self.browser_ws_url
    }

    /// Browser-level command (no target session).
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport.send(method, params, None).await
    }

    /// Targets reported by `/json/list`.
    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        let pages = reqwest::get(format!("{}/json/list", self.http_endpoint))
            .await?
            .json()
            .await?;
        Ok(pages)
    }

    /// The first tab whose URL contains `url_contains`, or the first tab
    /// when no filter is given.
    pub async fn find_page(&self, url_contains: Option<&str>) -> Result<PageInfo, CdpError> {
        let pages = self.list_pages().await?;
        select_page(&pages, url_contains)
            .cloned()
            .ok_or_else(|| CdpError::PageNotFound(url_contains.unwrap_or("any tab").to_string()))
    }

    /// Attach to a tab and enable the domains the agent listens to.
    pub async fn attach_page(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({ "targetId": target_id, "flatten": true })),
            )
            .await?;
        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let (tx, rx) = mpsc::unbounded_channel();
        self.routes.write().await.insert(session_id.clone(), tx);

        let session = PageSession::new(
            target_id.to_string(),
            session_id,
            self.transport.clone(),
            rx,
        );
        session.enable_domains().await?;
        info!(target = target_id, "Attached to page");
        Ok(session)
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Read frames until the socket closes, then fail whatever still waits.
async fn read_loop(mut source: SplitStream<WsStream>, transport: Transport, routes: EventRoutes) {
    while let Some(frame) = source.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => {
                debug!("Browser closed the connection");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                warn!("WebSocket error: {}", e);
                break;
            }
        };
        trace!("CDP recv: {}", text);

        match Inbound::decode(&text) {
            Ok(Some(Inbound::Reply { id, result })) => transport.resolve(id, result),
            Ok(Some(Inbound::Event { session_id, event })) => {
                if let Some(route) = routes.read().await.get(&session_id) {
                    let _ = route.send(event);
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Undecodable CDP message: {}", e),
        }
    }

    transport.fail_all();
    routes.write().await.clear();
}

/// Pick the tab to attach to.
pub(crate) fn select_page<'a>(
    pages: &'a [PageInfo],
    url_contains: Option<&str>,
) -> Option<&'a PageInfo> {
    pages
        .iter()
        .filter(|p| p.is_page())
        .find(|p| url_contains.is_none_or(|needle| p.url.contains(needle)))
}
