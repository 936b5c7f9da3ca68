use crate::types::constants::{channel_events, phoenix_events};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Type-safe channel events
///
/// On the wire every event is a plain string; [`ChannelEvent::parse`] and
/// [`ChannelEvent::as_str`] are the only mapping between the two.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelEvent {
    /// Row change on a project table
    DbChange,

    /// Broadcast message between subscribers of a topic
    Message,

    /// Presence track/untrack pushes
    Presence,

    /// Full presence snapshot
    PresenceState,

    /// Incremental presence joins/leaves
    PresenceDiff,

    /// System events (phx_*)
    System(SystemEvent),

    /// Any other event
    Custom(String),
}

impl ChannelEvent {
    /// Parse a string into a ChannelEvent
    pub fn parse(s: &str) -> Self {
        match s {
            channel_events::DB_CHANGE | channel_events::POSTGRES_CHANGES => Self::DbChange,
            channel_events::MESSAGE => Self::Message,
            channel_events::PRESENCE => Self::Presence,
            channel_events::PRESENCE_STATE => Self::PresenceState,
            channel_events::PRESENCE_DIFF => Self::PresenceDiff,
            _ => match SystemEvent::parse(s) {
                Some(system) => Self::System(system),
                None => Self::Custom(s.to_string()),
            },
        }
    }

    /// Convert event to string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::DbChange => channel_events::DB_CHANGE,
            Self::Message => channel_events::MESSAGE,
            Self::Presence => channel_events::PRESENCE,
            Self::PresenceState => channel_events::PRESENCE_STATE,
            Self::PresenceDiff => channel_events::PRESENCE_DIFF,
            Self::System(sys) => sys.as_str(),
            Self::Custom(s) => s,
        }
    }
}

impl From<&str> for ChannelEvent {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for ChannelEvent {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl std::fmt::Display for ChannelEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ChannelEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChannelEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Phoenix system events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemEvent {
    /// Join channel
    Join,

    /// Leave channel
    Leave,

    /// Reply to a message
    Reply,

    /// Close channel
    Close,

    /// Error event
    Error,

    /// Heartbeat
    Heartbeat,
}

impl SystemEvent {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            phoenix_events::JOIN => Some(Self::Join),
            phoenix_events::LEAVE => Some(Self::Leave),
            phoenix_events::REPLY => Some(Self::Reply),
            phoenix_events::CLOSE => Some(Self::Close),
            phoenix_events::ERROR => Some(Self::Error),
            phoenix_events::HEARTBEAT => Some(Self::Heartbeat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Join => phoenix_events::JOIN,
            Self::Leave => phoenix_events::LEAVE,
            Self::Reply => phoenix_events::REPLY,
            Self::Close => phoenix_events::CLOSE,
            Self::Error => phoenix_events::ERROR,
            Self::Heartbeat => phoenix_events::HEARTBEAT,
        }
    }
}
