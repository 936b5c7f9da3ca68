/// Phoenix protocol event strings (magic strings layer)
pub mod phoenix_events {
    pub const CLOSE: &str = "phx_close";
    pub const ERROR: &str = "phx_error";
    pub const JOIN: &str = "phx_join";
    pub const REPLY: &str = "phx_reply";
    pub const LEAVE: &str = "phx_leave";
    pub const HEARTBEAT: &str = "heartbeat";
}

/// Phoenix protocol topics
pub const PHOENIX_TOPIC: &str = "phoenix";

/// Channel event strings (magic strings layer)
pub mod channel_events {
    pub const DB_CHANGE: &str = "db_change";
    pub const POSTGRES_CHANGES: &str = "postgres_changes";
    pub const MESSAGE: &str = "message";
    pub const PRESENCE: &str = "presence";
    pub const PRESENCE_STATE: &str = "presence_state";
    pub const PRESENCE_DIFF: &str = "presence_diff";
}

/// Topic prefixes, scoped by project id
pub mod topics {
    pub const DB: &str = "db";
    pub const BROADCAST: &str = "broadcast";
    pub const PRESENCE: &str = "presence";
}

/// Socket connection parameters
pub mod socket_params {
    pub const PROJECT_TOKEN: &str = "project_token";
    pub const AUTH_TOKEN: &str = "auth_token";
    pub const VSN: &str = "vsn";
}

/// Protocol version
pub const VSN: &str = "1.0.0";

/// Path appended to the backend URL when no realtime endpoint is configured
pub const DEFAULT_SOCKET_PATH: &str = "/socket/websocket";

/// Cookie holding the signed-in user's token
pub const AUTH_TOKEN_COOKIE: &str = "auth-token";

/// Header carrying the project token on storage requests
pub const PROJECT_TOKEN_HEADER: &str = "X-Project-Token";

/// Default heartbeat interval (milliseconds)
pub const HEARTBEAT_INTERVAL: u64 = 25000;

/// Capacity of each connection's event queue
pub const EVENT_BUFFER_SIZE: usize = 100;
