use super::db_changes::DbChange;
use super::presence::{RawPresenceDiff, RawPresenceState};
use super::state::{ConnectionStatus, EventSink, PresenceEvent};
use crate::messaging::{ChannelEvent, SystemEvent};
use crate::types::RealtimeMessage;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};

/// Translates topic messages into the typed events of one channel kind.
pub(crate) struct ChannelDispatcher {
    topic: String,
    status: Arc<RwLock<ConnectionStatus>>,
    sink: Option<EventSink>,
}

impl ChannelDispatcher {
    pub(crate) fn new(
        topic: String,
        status: Arc<RwLock<ConnectionStatus>>,
        sink: EventSink,
    ) -> Self {
        Self {
            topic,
            status,
            sink: Some(sink),
        }
    }

    pub(crate) async fn dispatch(&mut self, message: RealtimeMessage) {
        if message.topic != self.topic {
            tracing::warn!(
                "Dropping message for unexpected topic {} on channel {}",
                message.topic,
                self.topic
            );
            return;
        }

        match &message.event {
            ChannelEvent::System(SystemEvent::Close) | ChannelEvent::System(SystemEvent::Error) => {
                tracing::warn!(
                    "Server ended channel {} with {}",
                    self.topic,
                    message.event
                );
                self.close().await;
                return;
            }
            _ => {}
        }

        let Some(sink) = &self.sink else {
            return;
        };

        match (sink, &message.event) {
            (EventSink::DbChanges { sender, filter }, ChannelEvent::DbChange) => {
                match serde_json::from_value::<DbChange>(message.payload) {
                    Ok(change) => {
                        if filter.matches(&change) {
                            deliver(sender, change, &self.topic).await;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse db change on {}: {}", self.topic, e);
                    }
                }
            }
            (EventSink::Broadcast { sender }, ChannelEvent::Message) => {
                deliver(sender, broadcast_body(message.payload), &self.topic).await;
            }
            (EventSink::Presence { sender, presence }, ChannelEvent::PresenceState) => {
                match serde_json::from_value::<RawPresenceState>(message.payload) {
                    Ok(raw_state) => {
                        let snapshot = presence.write().await.sync_state(raw_state).clone();
                        deliver(sender, PresenceEvent::State(snapshot), &self.topic).await;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse presence_state on {}: {}", self.topic, e);
                    }
                }
            }
            (EventSink::Presence { sender, presence }, ChannelEvent::PresenceDiff) => {
                match serde_json::from_value::<RawPresenceDiff>(message.payload) {
                    Ok(raw_diff) => {
                        let (changes, snapshot) = {
                            let mut presence = presence.write().await;
                            let changes = presence.sync_diff(raw_diff);
                            (changes, presence.state().clone())
                        };

                        for (key, metas) in changes.joins {
                            if let Some(meta) = metas.into_iter().next() {
                                deliver(sender, PresenceEvent::Join { key, meta }, &self.topic)
                                    .await;
                            }
                        }
                        for (key, metas) in changes.leaves {
                            if let Some(meta) = metas.into_iter().next() {
                                deliver(sender, PresenceEvent::Leave { key, meta }, &self.topic)
                                    .await;
                            }
                        }
                        deliver(sender, PresenceEvent::State(snapshot), &self.topic).await;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse presence_diff on {}: {}", self.topic, e);
                    }
                }
            }
            (_, event) => {
                tracing::debug!("Ignoring event {} on channel {}", event, self.topic);
            }
        }
    }

    /// Ends the event stream. A joined or joining channel becomes `Closed`.
    pub(crate) async fn close(&mut self) {
        self.sink = None;
        let mut status = self.status.write().await;
        if matches!(
            *status,
            ConnectionStatus::Joined | ConnectionStatus::Connecting
        ) {
            *status = ConnectionStatus::Closed;
        }
    }
}

/// Broadcast bodies are `{"payload": ...}`; anything else is passed through.
fn broadcast_body(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("payload") => {
            map.remove("payload").unwrap_or(Value::Null)
        }
        other => other,
    }
}

async fn deliver<T>(sender: &mpsc::Sender<T>, event: T, topic: &str) {
    if sender.send(event).await.is_err() {
        tracing::warn!(
            "Failed to deliver event on channel {}: receiver was dropped",
            topic
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::db_changes::{DbChangeFilter, DbOperation};
    use crate::channel::presence::Presence;
    use serde_json::json;

    fn message(topic: &str, event: &str, payload: Value) -> RealtimeMessage {
        RealtimeMessage::new(topic.to_string(), ChannelEvent::parse(event), payload)
    }

    fn joined() -> Arc<RwLock<ConnectionStatus>> {
        Arc::new(RwLock::new(ConnectionStatus::Joined))
    }

    fn presence_dispatcher() -> (ChannelDispatcher, mpsc::Receiver<PresenceEvent>) {
        let (sender, rx) = mpsc::channel(16);
        let dispatcher = ChannelDispatcher::new(
            "presence:p1".to_string(),
            joined(),
            EventSink::Presence {
                sender,
                presence: Arc::new(RwLock::new(Presence::default())),
            },
        );
        (dispatcher, rx)
    }

    #[tokio::test]
    async fn test_presence_diff_emits_join_then_state() {
        let (mut dispatcher, mut rx) = presence_dispatcher();

        dispatcher
            .dispatch(message(
                "presence:p1",
                "presence_diff",
                json!({"joins": {"u1": [{"online_at": "t1"}]}, "leaves": {}}),
            ))
            .await;

        match rx.recv().await.unwrap() {
            PresenceEvent::Join { key, meta } => {
                assert_eq!(key, "u1");
                assert_eq!(meta.get("online_at"), Some(&json!("t1")));
                assert_eq!(meta.presence_ref, None);
            }
            other => panic!("Expected join, got {:?}", other),
        }
        match rx.recv().await.unwrap() {
            PresenceEvent::State(state) => assert!(state.contains_key("u1")),
            other => panic!("Expected state, got {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_presence_diff_with_empty_metas_emits_only_state() {
        let (mut dispatcher, mut rx) = presence_dispatcher();

        dispatcher
            .dispatch(message(
                "presence:p1",
                "presence_diff",
                json!({"joins": {"u1": []}, "leaves": {"u2": []}}),
            ))
            .await;

        assert!(matches!(rx.recv().await.unwrap(), PresenceEvent::State(_)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_presence_leave_uses_first_meta() {
        let (mut dispatcher, mut rx) = presence_dispatcher();

        dispatcher
            .dispatch(message(
                "presence:p1",
                "presence_state",
                json!({"u1": {"metas": [{"phx_ref": "a", "n": 1}, {"phx_ref": "b", "n": 2}]}}),
            ))
            .await;
        assert!(matches!(rx.recv().await.unwrap(), PresenceEvent::State(_)));

        dispatcher
            .dispatch(message(
                "presence:p1",
                "presence_diff",
                json!({"leaves": {"u1": {"metas": [{"phx_ref": "b", "n": 2}, {"phx_ref": "a", "n": 1}]}}}),
            ))
            .await;

        match rx.recv().await.unwrap() {
            PresenceEvent::Leave { key, meta } => {
                assert_eq!(key, "u1");
                assert_eq!(meta.presence_ref.as_deref(), Some("b"));
            }
            other => panic!("Expected leave, got {:?}", other),
        }
        match rx.recv().await.unwrap() {
            PresenceEvent::State(state) => assert!(state.is_empty()),
            other => panic!("Expected state, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_db_change_filter_applied() {
        let (sender, mut rx) = mpsc::channel(16);
        let mut dispatcher = ChannelDispatcher::new(
            "db:p1".to_string(),
            joined(),
            EventSink::DbChanges {
                sender,
                filter: DbChangeFilter::all().table("todos"),
            },
        );

        for table in ["users", "todos"] {
            dispatcher
                .dispatch(message(
                    "db:p1",
                    "db_change",
                    json!({
                        "table": table,
                        "operation": "insert",
                        "new": {"id": 1},
                        "timestamp": "t"
                    }),
                ))
                .await;
        }

        let change = rx.recv().await.unwrap();
        assert_eq!(change.table, "todos");
        assert_eq!(change.operation, DbOperation::Insert);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_broadcast_unwraps_payload() {
        let (sender, mut rx) = mpsc::channel(16);
        let mut dispatcher = ChannelDispatcher::new(
            "broadcast:p1:room".to_string(),
            joined(),
            EventSink::Broadcast { sender },
        );

        dispatcher
            .dispatch(message(
                "broadcast:p1:room",
                "message",
                json!({"payload": {"text": "hi"}}),
            ))
            .await;
        dispatcher
            .dispatch(message("broadcast:p1:room", "message", json!("raw")))
            .await;

        assert_eq!(rx.recv().await.unwrap(), json!({"text": "hi"}));
        assert_eq!(rx.recv().await.unwrap(), json!("raw"));
    }

    #[tokio::test]
    async fn test_phx_close_ends_stream_and_marks_closed() {
        let status = joined();
        let (sender, mut rx) = mpsc::channel(16);
        let mut dispatcher = ChannelDispatcher::new(
            "broadcast:p1:room".to_string(),
            Arc::clone(&status),
            EventSink::Broadcast { sender },
        );

        dispatcher
            .dispatch(message("broadcast:p1:room", "phx_close", json!({})))
            .await;

        assert_eq!(*status.read().await, ConnectionStatus::Closed);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_other_topics_are_dropped() {
        let (sender, mut rx) = mpsc::channel(16);
        let mut dispatcher = ChannelDispatcher::new(
            "broadcast:p1:room".to_string(),
            joined(),
            EventSink::Broadcast { sender },
        );

        dispatcher
            .dispatch(message("broadcast:p1:other", "message", json!({"payload": 1})))
            .await;

        assert!(rx.try_recv().is_err());
    }
}
