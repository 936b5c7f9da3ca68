use thiserror::Error;

/// Errors that can occur when using the Dabblebase client.
#[derive(Error, Debug)]
pub enum DabblebaseError {
    /// Invalid or incomplete client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A storage path was required but empty
    #[error("A non-empty path is required")]
    MissingPath,

    /// A storage path contained a `.` or `..` segment
    #[error("Invalid path '{0}': '.' and '..' segments are not allowed")]
    InvalidPath(String),

    /// An upload was attempted without file content
    #[error("A file is required")]
    MissingFile,

    /// A sign-in was attempted without an auth provider
    #[error("An auth provider is required")]
    MissingProvider,

    /// A broadcast connection was requested without a channel name
    #[error("A channel name is required")]
    MissingChannelName,

    /// No token was supplied for verification
    #[error("No auth token supplied")]
    MissingToken,

    /// Token verification was attempted without a configured verify key
    #[error("No verify key configured")]
    MissingVerifyKey,

    /// The configured verify key is not a usable RSA public key
    #[error("Invalid verify key: {0}")]
    InvalidVerifyKey(String),

    /// The token signature or claims did not validate
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// The operation needs a browser-like host (cookies, navigation)
    #[error("Not running in a client environment")]
    NotClientEnvironment,

    /// Backend answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// HTTP transport error
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// WebSocket protocol error (connection failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// The server refused the channel join, or the socket closed first
    #[error("Failed to join '{topic}': {reason}")]
    JoinFailed { topic: String, reason: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Attempted operation while not connected to the server
    #[error("Not connected")]
    NotConnected,
}

/// Convenience type alias for `Result<T, DabblebaseError>`.
pub type Result<T> = std::result::Result<T, DabblebaseError>;
