use crate::types::Result;
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket factory for creating WebSocket connections
pub struct WebSocketFactory;

impl WebSocketFactory {
    /// Open a WebSocket connection (plain or TLS, depending on the scheme)
    pub async fn create(url: &str) -> Result<WsStream> {
        let (ws_stream, response) = tokio_tungstenite::connect_async(url).await?;
        tracing::debug!("WebSocket handshake completed with status {}", response.status());
        Ok(ws_stream)
    }
}
