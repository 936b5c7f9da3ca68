use super::core::ChannelConnection;
use super::presence::{Presence, PresenceState};
use super::state::ConnectionStatus;
use crate::messaging::ChannelEvent;
use crate::types::Result;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Connection to the project's database-change feed.
#[derive(Debug, Clone)]
pub struct DbChangeConnection {
    inner: ChannelConnection,
}

impl DbChangeConnection {
    pub(crate) fn new(inner: ChannelConnection) -> Self {
        Self { inner }
    }

    pub fn topic(&self) -> &str {
        self.inner.topic()
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.inner.status().await
    }

    pub async fn disconnect(&self) {
        self.inner.disconnect().await
    }
}

/// Connection to one broadcast topic.
#[derive(Debug, Clone)]
pub struct BroadcastConnection {
    inner: ChannelConnection,
}

impl BroadcastConnection {
    pub(crate) fn new(inner: ChannelConnection) -> Self {
        Self { inner }
    }

    pub fn topic(&self) -> &str {
        self.inner.topic()
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.inner.status().await
    }

    /// Sends `payload` to every other subscriber of the topic.
    ///
    /// Fire and forget: no acknowledgment is awaited.
    ///
    /// # Errors
    ///
    /// Returns [`DabblebaseError::NotConnected`](crate::DabblebaseError::NotConnected)
    /// once the connection is no longer joined.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dabblebase_rs::{Dabblebase, DabblebaseConfig};
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = Dabblebase::new(DabblebaseConfig::new(
    ///     "https://dabblebase.example.com",
    ///     "my-project",
    ///     "project-token",
    /// ))?;
    ///
    /// let (room, mut messages) = client.realtime.connect_broadcast("lobby", None).await?;
    /// room.broadcast(json!({"text": "hello"})).await?;
    ///
    /// while let Some(message) = messages.recv().await {
    ///     println!("got {message}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn broadcast(&self, payload: Value) -> Result<()> {
        self.inner
            .push(ChannelEvent::Message, json!({ "payload": payload }))
            .await?;
        tracing::debug!("Sent broadcast on {}", self.inner.topic());
        Ok(())
    }

    pub async fn disconnect(&self) {
        self.inner.disconnect().await
    }
}

/// Connection to the project's presence topic.
#[derive(Debug, Clone)]
pub struct PresenceConnection {
    inner: ChannelConnection,
    presence: Arc<RwLock<Presence>>,
}

impl PresenceConnection {
    pub(crate) fn new(inner: ChannelConnection, presence: Arc<RwLock<Presence>>) -> Self {
        Self { inner, presence }
    }

    pub fn topic(&self) -> &str {
        self.inner.topic()
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.inner.status().await
    }

    /// Who is present right now, as far as this connection has seen.
    pub async fn state(&self) -> PresenceState {
        self.presence.read().await.state().clone()
    }

    /// Publishes this client's presence metadata. Calling it again replaces
    /// the previous metadata.
    pub async fn track(&self, meta: Value) -> Result<()> {
        let payload = json!({
            "type": "presence",
            "event": "track",
            "payload": meta,
        });

        self.inner.push(ChannelEvent::Presence, payload).await
    }

    /// Withdraws this client's presence.
    pub async fn untrack(&self) -> Result<()> {
        let payload = json!({
            "type": "presence",
            "event": "untrack",
        });

        self.inner.push(ChannelEvent::Presence, payload).await
    }

    pub async fn disconnect(&self) {
        self.inner.disconnect().await
    }
}
