use crate::channel::{
    BroadcastConnection, ChannelConnection, DbChange, DbChangeConnection, DbChangeFilter,
    EventSink, Presence, PresenceConnection, PresenceEvent,
};
use crate::context::ClientContext;
use crate::types::constants::{AUTH_TOKEN_COOKIE, EVENT_BUFFER_SIZE, VSN, socket_params, topics};
use crate::types::{DabblebaseError, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, mpsc};
use url::Url;

/// Opens realtime channel connections.
///
/// Every `connect_*` call opens its own WebSocket, joins one topic and only
/// returns once the server has answered the join. Events arrive on the
/// returned receiver; the receiver ends when the connection closes.
///
/// # Example
///
/// ```no_run
/// use dabblebase_rs::{Dabblebase, DabblebaseConfig, DbChangeFilter, DbOperation};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Dabblebase::new(DabblebaseConfig::new(
///     "https://dabblebase.example.com",
///     "my-project",
///     "project-token",
/// ))?;
///
/// let filter = DbChangeFilter::all().table("todos").operation(DbOperation::Insert);
/// let (conn, mut changes) = client
///     .realtime
///     .connect_db_changes_with_filter(filter, None)
///     .await?;
///
/// while let Some(change) = changes.recv().await {
///     println!("{} {:?}", change.table, change.new);
/// }
/// conn.disconnect().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RealtimeClient {
    endpoint: Url,
    project_id: String,
    project_token: String,
    heartbeat_interval: Duration,
    context: Arc<dyn ClientContext>,
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("project_id", &self.project_id)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .finish_non_exhaustive()
    }
}

impl RealtimeClient {
    pub fn new(
        endpoint: Url,
        project_id: impl Into<String>,
        project_token: impl Into<String>,
        heartbeat_interval: Duration,
        context: Arc<dyn ClientContext>,
    ) -> Self {
        Self {
            endpoint,
            project_id: project_id.into(),
            project_token: project_token.into(),
            heartbeat_interval,
            context,
        }
    }

    /// Subscribes to every change in the project's database.
    pub async fn connect_db_changes(
        &self,
        auth_token: Option<&str>,
    ) -> Result<(DbChangeConnection, mpsc::Receiver<DbChange>)> {
        self.connect_db_changes_with_filter(DbChangeFilter::all(), auth_token)
            .await
    }

    /// Subscribes to the database changes that match `filter`.
    pub async fn connect_db_changes_with_filter(
        &self,
        filter: DbChangeFilter,
        auth_token: Option<&str>,
    ) -> Result<(DbChangeConnection, mpsc::Receiver<DbChange>)> {
        let (sender, rx) = mpsc::channel(EVENT_BUFFER_SIZE);
        let topic = format!("{}:{}", topics::DB, self.project_id);

        let inner = self
            .open(topic, auth_token, EventSink::DbChanges { sender, filter })
            .await?;
        Ok((DbChangeConnection::new(inner), rx))
    }

    /// Joins the broadcast topic `channel_name`.
    ///
    /// The receiver yields the payload of every message broadcast on the
    /// topic.
    pub async fn connect_broadcast(
        &self,
        channel_name: &str,
        auth_token: Option<&str>,
    ) -> Result<(BroadcastConnection, mpsc::Receiver<Value>)> {
        if channel_name.is_empty() {
            return Err(DabblebaseError::MissingChannelName);
        }

        let (sender, rx) = mpsc::channel(EVENT_BUFFER_SIZE);
        let topic = format!("{}:{}:{}", topics::BROADCAST, self.project_id, channel_name);

        let inner = self
            .open(topic, auth_token, EventSink::Broadcast { sender })
            .await?;
        Ok((BroadcastConnection::new(inner), rx))
    }

    /// Joins the project's presence topic.
    pub async fn connect_presence(
        &self,
        auth_token: Option<&str>,
    ) -> Result<(PresenceConnection, mpsc::Receiver<PresenceEvent>)> {
        let (sender, rx) = mpsc::channel(EVENT_BUFFER_SIZE);
        let presence = Arc::new(RwLock::new(Presence::default()));
        let topic = format!("{}:{}", topics::PRESENCE, self.project_id);

        let sink = EventSink::Presence {
            sender,
            presence: Arc::clone(&presence),
        };
        let inner = self.open(topic, auth_token, sink).await?;
        Ok((PresenceConnection::new(inner, presence), rx))
    }

    /// Socket URL carrying the project token, the resolved auth token and the
    /// protocol version.
    pub fn socket_url(&self, auth_token: Option<&str>) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(socket_params::PROJECT_TOKEN, &self.project_token);
            if let Some(token) = self.resolve_auth_token(auth_token) {
                query.append_pair(socket_params::AUTH_TOKEN, &token);
            }
            query.append_pair(socket_params::VSN, VSN);
        }
        url
    }

    /// The explicit token, else the `auth-token` cookie in a client
    /// environment.
    fn resolve_auth_token(&self, auth_token: Option<&str>) -> Option<String> {
        if let Some(token) = auth_token.filter(|token| !token.is_empty()) {
            return Some(token.to_string());
        }
        if !self.context.is_client_environment() {
            return None;
        }
        self.context
            .get_cookie(AUTH_TOKEN_COOKIE)
            .filter(|token| !token.is_empty())
    }

    async fn open(
        &self,
        topic: String,
        auth_token: Option<&str>,
        sink: EventSink,
    ) -> Result<ChannelConnection> {
        let url = self.socket_url(auth_token);
        ChannelConnection::open(&url, topic, self.heartbeat_interval, sink).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{HeadlessContext, MemoryContext};

    fn client(context: Arc<dyn ClientContext>) -> RealtimeClient {
        RealtimeClient::new(
            Url::parse("ws://localhost:4000/socket/websocket").unwrap(),
            "p1",
            "tok",
            Duration::from_secs(25),
            context,
        )
    }

    #[test]
    fn test_socket_url_params() {
        let realtime = client(Arc::new(HeadlessContext));
        assert_eq!(
            realtime.socket_url(None).as_str(),
            "ws://localhost:4000/socket/websocket?project_token=tok&vsn=1.0.0"
        );
        assert_eq!(
            realtime.socket_url(Some("jwt")).as_str(),
            "ws://localhost:4000/socket/websocket?project_token=tok&auth_token=jwt&vsn=1.0.0"
        );
    }

    #[test]
    fn test_auth_token_falls_back_to_cookie() {
        let realtime = client(Arc::new(MemoryContext::from_cookie_header(
            "auth-token=from-cookie",
        )));
        assert_eq!(
            realtime.socket_url(None).as_str(),
            "ws://localhost:4000/socket/websocket?project_token=tok&auth_token=from-cookie&vsn=1.0.0"
        );
        assert!(
            realtime
                .socket_url(Some("explicit"))
                .as_str()
                .contains("auth_token=explicit")
        );

        let outside_client = client(Arc::new(
            MemoryContext::from_cookie_header("auth-token=from-cookie")
                .with_client_environment(false),
        ));
        assert!(!outside_client.socket_url(None).as_str().contains("auth_token"));
    }

    #[tokio::test]
    async fn test_broadcast_requires_channel_name() {
        let realtime = client(Arc::new(HeadlessContext));
        assert!(matches!(
            realtime.connect_broadcast("", None).await,
            Err(DabblebaseError::MissingChannelName)
        ));
    }
}
