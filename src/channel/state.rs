use super::db_changes::{DbChange, DbChangeFilter};
use super::presence::{Presence, PresenceMeta, PresenceState};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};

/// Lifecycle of one channel connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Explicitly disconnected (terminal)
    Disconnected,
    /// Socket opening or join in flight
    Connecting,
    /// Join acknowledged by the server
    Joined,
    /// The join was refused or the socket closed before the reply
    JoinFailed,
    /// Server closed the channel or the socket while joined
    Closed,
}

/// Typed presence events, in the order they are produced for a diff:
/// joins, leaves, then the resulting state.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceEvent {
    /// Full snapshot of who is present
    State(PresenceState),
    /// A user joined; carries their first metadata entry
    Join { key: String, meta: PresenceMeta },
    /// A user left; carries their first metadata entry
    Leave { key: String, meta: PresenceMeta },
}

/// Where translated events go, one variant per channel kind
pub(crate) enum EventSink {
    DbChanges {
        sender: mpsc::Sender<DbChange>,
        filter: DbChangeFilter,
    },
    Broadcast {
        sender: mpsc::Sender<Value>,
    },
    Presence {
        sender: mpsc::Sender<PresenceEvent>,
        presence: Arc<RwLock<Presence>>,
    },
}
