use crate::client::{Socket, SocketState};
use crate::messaging::{ChannelEvent, SystemEvent};
use crate::types::constants::{HEARTBEAT_INTERVAL, PHOENIX_TOPIC};
use crate::types::message::RealtimeMessage;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time;

/// Keeps one socket alive and closes it when a heartbeat goes unanswered.
pub struct HeartbeatManager {
    interval: Duration,
    socket: Weak<Socket>,
    state: Arc<RwLock<SocketState>>,
}

impl HeartbeatManager {
    pub fn new(socket: Weak<Socket>, state: Arc<RwLock<SocketState>>) -> Self {
        Self {
            interval: Duration::from_millis(HEARTBEAT_INTERVAL),
            socket,
            state,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Heartbeat loop; ends when the socket is closed or dropped
    pub async fn run(self) {
        let mut interval_timer = time::interval(self.interval);
        interval_timer.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
        // The first tick completes immediately.
        interval_timer.tick().await;

        loop {
            interval_timer.tick().await;

            let Some(socket) = self.socket.upgrade() else {
                break;
            };

            if !socket.is_connected().await {
                break;
            }

            // Timeout detection: previous heartbeat never acknowledged
            if self.state.read().await.pending_heartbeat_ref.is_some() {
                tracing::warn!("Heartbeat timeout, closing connection");
                socket.close().await;
                break;
            }

            let heartbeat_ref = {
                let mut state = self.state.write().await;
                let heartbeat_ref = state.make_ref();
                state.pending_heartbeat_ref = Some(heartbeat_ref.clone());
                heartbeat_ref
            };

            let heartbeat_msg = RealtimeMessage::new(
                PHOENIX_TOPIC.to_string(),
                ChannelEvent::System(SystemEvent::Heartbeat),
                serde_json::json!({}),
            )
            .with_ref(heartbeat_ref.clone());

            match socket.send(&heartbeat_msg).await {
                Ok(()) => {
                    tracing::debug!("Sent heartbeat with ref {}", heartbeat_ref);
                }
                Err(e) => {
                    self.state.write().await.pending_heartbeat_ref = None;
                    tracing::error!("Failed to send heartbeat: {}", e);
                }
            }
        }
    }
}
