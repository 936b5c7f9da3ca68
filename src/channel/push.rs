use crate::messaging::ChannelEvent;
use serde_json::Value;
use tokio::sync::oneshot;

/// Server reply to a push, matched by `ref`.
#[derive(Debug, Clone, PartialEq)]
pub struct PushReply {
    pub status: String,
    pub response: Value,
}

impl PushReply {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    /// Human-readable failure reason: `response.reason` when the server
    /// gives one, the status otherwise.
    pub fn reason(&self) -> String {
        self.response
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.status.clone())
    }
}

/// A push awaiting its reply
#[derive(Debug)]
pub struct Push {
    pub event: ChannelEvent,
    pub ref_id: String,
    reply_tx: oneshot::Sender<PushReply>,
}

impl Push {
    pub fn new(event: ChannelEvent, ref_id: String) -> (Self, oneshot::Receiver<PushReply>) {
        let (reply_tx, reply_rx) = oneshot::channel();
        (
            Self {
                event,
                ref_id,
                reply_tx,
            },
            reply_rx,
        )
    }

    pub fn resolve(self, reply: PushReply) {
        if self.reply_tx.send(reply).is_err() {
            tracing::debug!(
                "Reply for {} (ref {}) arrived after the waiter went away",
                self.event,
                self.ref_id
            );
        }
    }
}
