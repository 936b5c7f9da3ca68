use super::{ChannelEvent, SystemEvent};
use crate::channel::{ChannelDispatcher, PushReply};
use crate::client::SocketState;
use crate::types::constants::PHOENIX_TOPIC;
use crate::types::message::RealtimeMessage;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Routes incoming messages to appropriate handlers
pub struct MessageRouter {
    state: Arc<RwLock<SocketState>>,
    dispatcher: ChannelDispatcher,
}

impl MessageRouter {
    pub(crate) fn new(state: Arc<RwLock<SocketState>>, dispatcher: ChannelDispatcher) -> Self {
        Self { state, dispatcher }
    }

    /// Routes a message to the appropriate handler(s)
    pub async fn route(&mut self, message: RealtimeMessage) {
        if self.is_heartbeat_message(&message) {
            self.handle_heartbeat_ack(&message).await;
            return;
        }

        // Replies are consumed here, never forwarded to the channel
        if message.event == ChannelEvent::System(SystemEvent::Reply) {
            self.handle_push_reply(&message).await;
            return;
        }

        tracing::debug!(
            "Routing message: topic={}, event={}",
            message.topic,
            message.event
        );
        self.dispatcher.dispatch(message).await;
    }

    /// Ends the channel's event stream
    pub async fn close(&mut self) {
        self.dispatcher.close().await;
    }

    /// Checks if a message is a heartbeat acknowledgment
    fn is_heartbeat_message(&self, message: &RealtimeMessage) -> bool {
        message.topic == PHOENIX_TOPIC
            && matches!(
                message.event,
                ChannelEvent::System(SystemEvent::Reply | SystemEvent::Heartbeat)
            )
    }

    /// Handles heartbeat acknowledgment by clearing pending ref
    async fn handle_heartbeat_ack(&self, message: &RealtimeMessage) {
        let Some(msg_ref) = &message.r#ref else {
            return;
        };

        let mut state = self.state.write().await;
        if state.pending_heartbeat_ref.as_ref() == Some(msg_ref) {
            state.pending_heartbeat_ref = None;
            tracing::debug!("Received heartbeat ack for ref {}", msg_ref);
        }
    }

    /// Handles push reply by matching ref to pending push
    async fn handle_push_reply(&self, message: &RealtimeMessage) {
        let Some(ref_id) = &message.r#ref else {
            return;
        };

        let Some(push) = self.state.write().await.pending_pushes.remove(ref_id) else {
            tracing::debug!("No pending push for reply ref {}", ref_id);
            return;
        };

        let status = message
            .payload
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| {
                tracing::debug!("Push reply missing 'status' field, defaulting to 'error'");
                "error"
            })
            .to_string();

        let response = message
            .payload
            .get("response")
            .cloned()
            .unwrap_or(serde_json::Value::Null);

        tracing::debug!(
            "Handled push reply for ref {} with status {}",
            ref_id,
            status
        );
        push.resolve(PushReply { status, response });
    }
}
