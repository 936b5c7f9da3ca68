use super::{Dabblebase, RealtimeClient};
use crate::auth::AuthClient;
use crate::config::DabblebaseConfig;
use crate::context::{ClientContext, HeadlessContext};
use crate::storage::StorageClient;
use crate::types::Result;
use std::sync::Arc;

/// Builder for [`Dabblebase`] that validates the configuration and wires the
/// three clients to one context and one HTTP client.
pub struct DabblebaseBuilder {
    config: DabblebaseConfig,
    context: Option<Arc<dyn ClientContext>>,
    http: Option<reqwest::Client>,
}

impl DabblebaseBuilder {
    pub fn new(config: DabblebaseConfig) -> Self {
        Self {
            config,
            context: None,
            http: None,
        }
    }

    /// Host environment for cookies and navigation. Defaults to
    /// [`HeadlessContext`].
    pub fn context(mut self, context: Arc<dyn ClientContext>) -> Self {
        self.context = Some(context);
        self
    }

    /// HTTP client for storage requests.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Result<Dabblebase> {
        let config = self.config;
        config.validate()?;

        let base_url = config.base_url()?;
        let endpoint = config.realtime_endpoint()?;
        let context = self
            .context
            .unwrap_or_else(|| Arc::new(HeadlessContext) as Arc<dyn ClientContext>);
        let http = self.http.unwrap_or_default();

        let auth = AuthClient::new(
            base_url.clone(),
            config.project_id.clone(),
            config.verify_key.clone(),
            Arc::clone(&context),
        );
        let storage = StorageClient::new(
            http,
            base_url,
            config.project_id.clone(),
            config.project_token.clone(),
        );
        let realtime = RealtimeClient::new(
            endpoint,
            config.project_id.clone(),
            config.project_token.clone(),
            config.heartbeat(),
            context,
        );

        tracing::debug!("Built client for project {}", config.project_id);
        Ok(Dabblebase {
            auth,
            storage,
            realtime,
        })
    }
}
