// Module declarations
mod core;
mod db_changes;
mod dispatch;
mod handles;
mod presence;
pub mod push;
mod state;

// Public API exports
pub use self::core::ChannelConnection;
pub use db_changes::{DbChange, DbChangeFilter, DbOperation, Record};
pub(crate) use dispatch::ChannelDispatcher;
pub use handles::{BroadcastConnection, DbChangeConnection, PresenceConnection};
pub use presence::{
    Presence, PresenceChanges, PresenceMeta, PresenceState, RawPresenceDiff, RawPresenceState,
};
pub use push::{Push, PushReply};
pub(crate) use state::EventSink;
pub use state::{ConnectionStatus, PresenceEvent};
