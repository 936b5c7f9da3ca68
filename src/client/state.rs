use crate::channel::Push;
use std::collections::HashMap;

/// Mutable protocol state shared by one socket, its router and heartbeat
pub struct SocketState {
    /// Current ref counter for message IDs
    pub ref_counter: u64,

    /// Pending heartbeat ref (if any)
    pub pending_heartbeat_ref: Option<String>,

    /// Pushes waiting for a `phx_reply`, keyed by ref
    pub pending_pushes: HashMap<String, Push>,
}

impl SocketState {
    pub fn new() -> Self {
        Self {
            ref_counter: 0,
            pending_heartbeat_ref: None,
            pending_pushes: HashMap::new(),
        }
    }

    /// Generate next message reference
    pub fn make_ref(&mut self) -> String {
        self.ref_counter += 1;
        self.ref_counter.to_string()
    }

    /// Drops every waiter; their receivers resolve with an error.
    pub fn clear_pending(&mut self) {
        if !self.pending_pushes.is_empty() {
            tracing::debug!(
                "Dropping {} pending pushes on socket close",
                self.pending_pushes.len()
            );
        }
        self.pending_pushes.clear();
        self.pending_heartbeat_ref = None;
    }
}

impl Default for SocketState {
    fn default() -> Self {
        Self::new()
    }
}
