// Module declarations
mod builder;
mod connection;
mod core;
mod realtime;
mod state;

// Public API exports
pub use self::core::Dabblebase;
pub use builder::DabblebaseBuilder;
pub use connection::{ConnectionState, Socket};
pub use realtime::RealtimeClient;
pub use state::SocketState;
