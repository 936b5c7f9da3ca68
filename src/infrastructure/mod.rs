// Infrastructure module - Background services and HTTP helpers
pub mod heartbeat;
pub mod http;
pub mod task_manager;

pub use heartbeat::HeartbeatManager;
pub use http::{ensure_success, http_to_ws_endpoint, project_url};
pub use task_manager::TaskManager;
