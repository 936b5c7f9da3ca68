//! # Dabblebase Rust
//!
//! A Rust client for Dabblebase: sign-in redirects and token verification,
//! file storage, and realtime channels (database changes, broadcast and
//! presence) over the Phoenix Channels WebSocket protocol.
//!
//! ## Example
//!
//! ```no_run
//! use dabblebase_rs::{Dabblebase, DabblebaseConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Dabblebase::new(DabblebaseConfig::new(
//!         "https://dabblebase.example.com",
//!         "my-project",
//!         "project-token",
//!     ))?;
//!
//!     let (room, mut messages) = client.realtime.connect_broadcast("lobby", None).await?;
//!     room.broadcast(json!({"text": "hi"})).await?;
//!
//!     if let Some(message) = messages.recv().await {
//!         println!("{message}");
//!     }
//!     room.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod channel;
pub mod client;
pub mod config;
pub mod context;
pub mod infrastructure;
pub mod messaging;
pub mod storage;
pub mod types;
pub mod websocket;

pub use auth::{AuthClient, Subject};
pub use channel::{
    BroadcastConnection, ConnectionStatus, DbChange, DbChangeConnection, DbChangeFilter,
    DbOperation, PresenceConnection, PresenceEvent, PresenceMeta, PresenceState,
};
pub use client::{Dabblebase, DabblebaseBuilder, RealtimeClient};
pub use config::DabblebaseConfig;
pub use context::{ClientContext, HeadlessContext, MemoryContext};
pub use messaging::{ChannelEvent, SystemEvent};
pub use storage::{StorageClient, StorageObject, UploadFile};
pub use types::{DabblebaseError, RealtimeMessage, Result};
