use super::SocketState;
use crate::channel::{ChannelDispatcher, Push, PushReply};
use crate::infrastructure::{HeartbeatManager, TaskManager};
use crate::messaging::MessageRouter;
use crate::types::{DabblebaseError, RealtimeMessage, Result};
use crate::websocket::{WebSocketFactory, WsStream};
use futures::SinkExt;
use futures::stream::{SplitSink, SplitStream, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, RwLock, oneshot};
use tokio_tungstenite::tungstenite::Message;

type WsWriter = SplitSink<WsStream, Message>;
type WsReader = SplitStream<WsStream>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closing,
    Closed,
}

/// One WebSocket plus the tasks that serve it (reader, heartbeat).
pub struct Socket {
    writer: AsyncMutex<Option<WsWriter>>,
    connection_state: RwLock<ConnectionState>,
    state: Arc<RwLock<SocketState>>,
    tasks: Mutex<TaskManager>,
}

impl Socket {
    /// Opens the WebSocket and starts its read and heartbeat tasks.
    ///
    /// Messages for the joined topic are handed to `dispatcher`.
    pub(crate) async fn connect(
        url: &str,
        heartbeat_interval: Duration,
        dispatcher: ChannelDispatcher,
    ) -> Result<Arc<Self>> {
        let ws_stream = WebSocketFactory::create(url).await?;
        let (write_half, read_half) = ws_stream.split();

        let socket = Arc::new(Self {
            writer: AsyncMutex::new(Some(write_half)),
            connection_state: RwLock::new(ConnectionState::Open),
            state: Arc::new(RwLock::new(SocketState::new())),
            tasks: Mutex::new(TaskManager::new()),
        });

        let router = MessageRouter::new(Arc::clone(&socket.state), dispatcher);
        let heartbeat = HeartbeatManager::new(Arc::downgrade(&socket), Arc::clone(&socket.state))
            .with_interval(heartbeat_interval);

        {
            let mut tasks = socket.lock_tasks();
            tasks.spawn(Self::read_loop(Arc::downgrade(&socket), read_half, router));
            tasks.spawn(heartbeat.run());
        }

        tracing::debug!("Socket open");
        Ok(socket)
    }

    async fn read_loop(socket: Weak<Socket>, mut read_half: WsReader, mut router: MessageRouter) {
        tracing::debug!("Starting read task");
        while let Some(msg_result) = read_half.next().await {
            match msg_result {
                Ok(Message::Text(text)) => {
                    tracing::debug!("Received text message: {}", text);
                    match serde_json::from_str::<RealtimeMessage>(&text) {
                        Ok(message) => router.route(message).await,
                        Err(e) => {
                            tracing::error!("Failed to parse message: {} - Raw: {}", e, text);
                        }
                    }
                }
                Ok(Message::Close(frame)) => {
                    if let Some(close_frame) = frame {
                        tracing::warn!(
                            "Server closed connection: code={:?}, reason='{}'",
                            close_frame.code,
                            close_frame.reason
                        );
                    } else {
                        tracing::warn!("Server closed connection without close frame");
                    }
                    break;
                }
                Ok(Message::Ping(data)) => {
                    tracing::debug!("Received ping ({} bytes)", data.len());
                }
                Ok(Message::Pong(data)) => {
                    tracing::debug!("Received pong ({} bytes)", data.len());
                }
                Ok(Message::Binary(data)) => {
                    tracing::warn!("Received unexpected binary message ({} bytes)", data.len());
                }
                Ok(Message::Frame(_)) => {
                    tracing::debug!("Received raw frame (internal)");
                }
                Err(e) => {
                    tracing::error!("WebSocket read error: {}", e);
                    break;
                }
            }
        }

        router.close().await;
        if let Some(socket) = socket.upgrade() {
            socket.mark_closed().await;
        }
        tracing::debug!("Read task finished");
    }

    pub async fn state(&self) -> ConnectionState {
        *self.connection_state.read().await
    }

    pub async fn is_connected(&self) -> bool {
        self.state().await == ConnectionState::Open
    }

    /// Generate next message reference
    pub async fn make_ref(&self) -> String {
        self.state.write().await.make_ref()
    }

    /// Sends a message through the WebSocket connection
    pub async fn send(&self, message: &RealtimeMessage) -> Result<()> {
        if !self.is_connected().await {
            return Err(DabblebaseError::NotConnected);
        }

        let json = serde_json::to_string(message)?;
        let mut writer = self.writer.lock().await;
        let ws = writer.as_mut().ok_or(DabblebaseError::NotConnected)?;
        ws.send(Message::Text(json.into())).await?;

        tracing::debug!("Pushed {} on {}", message.event, message.topic);
        Ok(())
    }

    /// Sends a message, assigning a ref if it has none. No reply is awaited.
    pub async fn push(&self, message: RealtimeMessage) -> Result<()> {
        let message = match message.r#ref {
            Some(_) => message,
            None => {
                let ref_id = self.make_ref().await;
                message.with_ref(ref_id)
            }
        };
        self.send(&message).await
    }

    /// Sends a message and registers a waiter for the `phx_reply` carrying
    /// the same ref. The waiter fails if the socket closes first.
    pub async fn request(&self, message: RealtimeMessage) -> Result<oneshot::Receiver<PushReply>> {
        let mut message = message;
        let ref_id = match &message.r#ref {
            Some(ref_id) => ref_id.clone(),
            None => {
                let ref_id = self.make_ref().await;
                message.r#ref = Some(ref_id.clone());
                ref_id
            }
        };

        let (push, reply_rx) = Push::new(message.event.clone(), ref_id.clone());
        self.state
            .write()
            .await
            .pending_pushes
            .insert(ref_id.clone(), push);

        if let Err(e) = self.send(&message).await {
            self.state.write().await.pending_pushes.remove(&ref_id);
            return Err(e);
        }

        Ok(reply_rx)
    }

    /// Closes the WebSocket and stops its tasks.
    ///
    /// Returns `true` only for the call that actually closed the socket.
    pub async fn close(&self) -> bool {
        {
            let mut connection_state = self.connection_state.write().await;
            if *connection_state != ConnectionState::Open {
                return false;
            }
            *connection_state = ConnectionState::Closing;
        }

        self.state.write().await.clear_pending();

        let writer = self.writer.lock().await.take();
        if let Some(mut ws) = writer
            && let Err(e) = ws.close().await
        {
            tracing::warn!("Error while closing WebSocket: {}", e);
        }

        *self.connection_state.write().await = ConnectionState::Closed;

        // Last step: the caller may be one of these tasks.
        self.lock_tasks().abort_all();
        tracing::debug!("Socket closed");
        true
    }

    /// Bookkeeping after the server closed the connection.
    async fn mark_closed(&self) {
        {
            let mut connection_state = self.connection_state.write().await;
            if *connection_state != ConnectionState::Open {
                return;
            }
            *connection_state = ConnectionState::Closed;
        }

        self.state.write().await.clear_pending();
        self.writer.lock().await.take();
        self.lock_tasks().abort_all();
    }

    fn lock_tasks(&self) -> MutexGuard<'_, TaskManager> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        self.tasks
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_all();
    }
}
