use super::dispatch::ChannelDispatcher;
use super::state::{ConnectionStatus, EventSink};
use crate::client::Socket;
use crate::messaging::{ChannelEvent, SystemEvent};
use crate::types::{DabblebaseError, RealtimeMessage, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use url::Url;

/// One joined topic on its own socket.
///
/// A connection is created by the [`RealtimeClient`](crate::RealtimeClient)
/// `connect_*` methods, which open the socket and wait for the join reply
/// before returning. It stays joined until [`disconnect()`](Self::disconnect)
/// is called or the server goes away; it never reconnects on its own.
///
/// Handles are cheap to clone and all refer to the same socket. When the last
/// handle is dropped the background tasks are aborted.
#[derive(Clone)]
pub struct ChannelConnection {
    topic: String,
    join_ref: String,
    socket: Arc<Socket>,
    status: Arc<RwLock<ConnectionStatus>>,
}

impl std::fmt::Debug for ChannelConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelConnection")
            .field("topic", &self.topic)
            .field("join_ref", &self.join_ref)
            .finish_non_exhaustive()
    }
}

impl ChannelConnection {
    /// Opens the socket, sends `phx_join` and waits for the reply.
    ///
    /// On a refused join, or a socket that closes before replying, the socket
    /// is closed again and [`DabblebaseError::JoinFailed`] is returned.
    pub(crate) async fn open(
        endpoint: &Url,
        topic: String,
        heartbeat_interval: Duration,
        sink: EventSink,
    ) -> Result<Self> {
        let status = Arc::new(RwLock::new(ConnectionStatus::Connecting));
        let dispatcher = ChannelDispatcher::new(topic.clone(), Arc::clone(&status), sink);

        tracing::info!(
            "Connecting to {}{} for channel {}",
            endpoint.origin().ascii_serialization(),
            endpoint.path(),
            topic
        );

        let socket = match Socket::connect(endpoint.as_str(), heartbeat_interval, dispatcher).await
        {
            Ok(socket) => socket,
            Err(e) => {
                *status.write().await = ConnectionStatus::JoinFailed;
                tracing::error!("Failed to open socket for channel {}: {}", topic, e);
                return Err(e);
            }
        };

        let join_ref = socket.make_ref().await;
        let join_message = RealtimeMessage::new(
            topic.clone(),
            ChannelEvent::System(SystemEvent::Join),
            serde_json::json!({}),
        )
        .with_ref(join_ref.clone())
        .with_join_ref(join_ref.clone());

        tracing::info!("Joining channel: {}", topic);

        let outcome = match socket.request(join_message).await {
            Ok(reply_rx) => match reply_rx.await {
                Ok(reply) if reply.is_ok() => Ok(()),
                Ok(reply) => Err(reply.reason()),
                Err(_) => Err("socket closed before join reply".to_string()),
            },
            Err(e) => Err(e.to_string()),
        };

        match outcome {
            Ok(()) => {
                {
                    // The server may already have closed the channel
                    let mut status = status.write().await;
                    if *status == ConnectionStatus::Connecting {
                        *status = ConnectionStatus::Joined;
                    }
                }
                tracing::info!("Joined channel: {}", topic);
                Ok(Self {
                    topic,
                    join_ref,
                    socket,
                    status,
                })
            }
            Err(reason) => {
                socket.close().await;
                *status.write().await = ConnectionStatus::JoinFailed;
                tracing::error!("Failed to join channel {}: {}", topic, reason);
                Err(DabblebaseError::JoinFailed { topic, reason })
            }
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Current lifecycle state. A joined channel whose socket has gone away
    /// reports `Closed`.
    pub async fn status(&self) -> ConnectionStatus {
        let status = *self.status.read().await;
        if status == ConnectionStatus::Joined && !self.socket.is_connected().await {
            return ConnectionStatus::Closed;
        }
        status
    }

    pub async fn is_joined(&self) -> bool {
        self.status().await == ConnectionStatus::Joined
    }

    /// Pushes an event on this topic without waiting for a reply.
    pub(crate) async fn push(&self, event: ChannelEvent, payload: serde_json::Value) -> Result<()> {
        if !self.is_joined().await {
            return Err(DabblebaseError::NotConnected);
        }

        let message = RealtimeMessage::new(self.topic.clone(), event, payload)
            .with_join_ref(self.join_ref.clone());
        self.socket.push(message).await
    }

    /// Leaves the channel, then closes the socket.
    ///
    /// Safe to call any number of times; only the first call does anything.
    pub async fn disconnect(&self) {
        {
            let mut status = self.status.write().await;
            if *status == ConnectionStatus::Disconnected {
                return;
            }
            *status = ConnectionStatus::Disconnected;
        }

        if self.socket.is_connected().await {
            let leave_message = RealtimeMessage::new(
                self.topic.clone(),
                ChannelEvent::System(SystemEvent::Leave),
                serde_json::json!({}),
            )
            .with_join_ref(self.join_ref.clone());

            if let Err(e) = self.socket.push(leave_message).await {
                tracing::warn!("Failed to leave channel {}: {}", self.topic, e);
            }
        }

        if self.socket.close().await {
            tracing::info!("Disconnected from channel: {}", self.topic);
        }
    }
}
