//! Chrome DevTools Protocol (CDP) client.
//!
//! Connects to a running Chrome/Edge over WebSocket and attaches to the tab
//! hosting the document system.
//!
//! ## Usage
//!
//! 1. Start the browser with remote debugging:
//!    ```bash
//!    chrome --remote-debugging-port=9222
//!    ```
//!
//! 2. Attach:
//!    ```rust,ignore
//!    let client = CdpClient::connect("http://localhost:9222").await?;
//!    let page = client.find_page(Some("edoc")).await?;
//!    let session = client.attach_page(&page.id).await?;
//!    ```

mod client;
mod error;
mod protocol;
mod session;
mod transport;

pub use client::CdpClient;
pub use error::CdpError;
pub use protocol::*;
pub use session::PageSession;
