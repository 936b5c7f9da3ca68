use super::{DabblebaseBuilder, RealtimeClient};
use crate::auth::AuthClient;
use crate::config::DabblebaseConfig;
use crate::context::ClientContext;
use crate::storage::StorageClient;
use crate::types::Result;
use std::sync::Arc;

/// The main entry point: auth, storage and realtime for one project.
///
/// # Example
///
/// ```no_run
/// use dabblebase_rs::{Dabblebase, DabblebaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Dabblebase::new(DabblebaseConfig::new(
///     "https://dabblebase.example.com",
///     "my-project",
///     "project-token",
/// ))?;
///
/// for file in client.storage.list().await? {
///     println!("{} ({} bytes)", file.path, file.size);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Dabblebase {
    pub auth: AuthClient,
    pub storage: StorageClient,
    pub realtime: RealtimeClient,
}

impl Dabblebase {
    /// Builds the clients for code running outside a browser-like host.
    ///
    /// # Errors
    ///
    /// Returns [`DabblebaseError::Config`](crate::DabblebaseError::Config) if
    /// a required field is empty or a URL does not parse.
    pub fn new(config: DabblebaseConfig) -> Result<Self> {
        DabblebaseBuilder::new(config).build()
    }

    /// Builds the clients on top of the given host environment.
    pub fn with_context(config: DabblebaseConfig, context: Arc<dyn ClientContext>) -> Result<Self> {
        DabblebaseBuilder::new(config).context(context).build()
    }

    pub fn builder(config: DabblebaseConfig) -> DabblebaseBuilder {
        DabblebaseBuilder::new(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DabblebaseError;
    use crate::context::MemoryContext;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = DabblebaseConfig::new("", "p1", "tok");
        assert!(matches!(
            Dabblebase::new(config),
            Err(DabblebaseError::Config(_))
        ));
    }

    #[test]
    fn test_clients_share_context() {
        let context = Arc::new(MemoryContext::new());
        let client = Dabblebase::with_context(
            DabblebaseConfig::new("https://db.example.com", "p1", "tok"),
            context.clone(),
        )
        .unwrap();

        client.auth.store_token("abc");
        assert_eq!(
            client.realtime.socket_url(None).query(),
            Some("project_token=tok&auth_token=abc&vsn=1.0.0")
        );
        assert_eq!(
            client.storage.get_url("a.txt").unwrap().as_str(),
            "https://db.example.com/api/project/p1/storage/view/a.txt?token=tok"
        );
    }
}
