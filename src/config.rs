use crate::infrastructure::http_to_ws_endpoint;
use crate::types::constants::HEARTBEAT_INTERVAL;
use crate::types::{DabblebaseError, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Settings shared by the auth, storage and realtime clients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DabblebaseConfig {
    /// Backend base URL, e.g. `https://dabblebase.example.com`
    pub dabblebase_url: String,
    pub project_id: String,
    pub project_token: String,
    /// Base64 body of the RS256 public key used by `AuthClient::verify`
    #[serde(default)]
    pub verify_key: Option<String>,
    /// WebSocket endpoint; derived from `dabblebase_url` when unset
    #[serde(default)]
    pub realtime_url: Option<String>,
    /// Heartbeat interval in milliseconds
    #[serde(default)]
    pub heartbeat_interval: Option<u64>,
}

impl DabblebaseConfig {
    pub fn new(
        dabblebase_url: impl Into<String>,
        project_id: impl Into<String>,
        project_token: impl Into<String>,
    ) -> Self {
        Self {
            dabblebase_url: dabblebase_url.into(),
            project_id: project_id.into(),
            project_token: project_token.into(),
            ..Default::default()
        }
    }

    pub fn with_verify_key(mut self, verify_key: impl Into<String>) -> Self {
        self.verify_key = Some(verify_key.into());
        self
    }

    pub fn with_realtime_url(mut self, realtime_url: impl Into<String>) -> Self {
        self.realtime_url = Some(realtime_url.into());
        self
    }

    pub fn with_heartbeat_interval(mut self, interval_ms: u64) -> Self {
        self.heartbeat_interval = Some(interval_ms);
        self
    }

    /// Reads `DABBLEBASE_URL`, `DABBLEBASE_PROJECT_ID`,
    /// `DABBLEBASE_PROJECT_TOKEN` and the optional `DABBLEBASE_VERIFY_KEY`
    /// and `DABBLEBASE_REALTIME_URL`.
    pub fn from_env() -> Result<Self> {
        fn required(name: &str) -> Result<String> {
            std::env::var(name).map_err(|_| DabblebaseError::Config(format!("{name} is not set")))
        }

        let config = Self {
            dabblebase_url: required("DABBLEBASE_URL")?,
            project_id: required("DABBLEBASE_PROJECT_ID")?,
            project_token: required("DABBLEBASE_PROJECT_TOKEN")?,
            verify_key: std::env::var("DABBLEBASE_VERIFY_KEY").ok(),
            realtime_url: std::env::var("DABBLEBASE_REALTIME_URL").ok(),
            heartbeat_interval: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects empty required fields and unparsable URLs.
    pub fn validate(&self) -> Result<()> {
        if self.dabblebase_url.is_empty() {
            return Err(DabblebaseError::Config(
                "dabblebase_url is required".to_string(),
            ));
        }
        if self.project_id.is_empty() {
            return Err(DabblebaseError::Config("project_id is required".to_string()));
        }
        if self.project_token.is_empty() {
            return Err(DabblebaseError::Config(
                "project_token is required".to_string(),
            ));
        }
        if self.heartbeat_interval == Some(0) {
            return Err(DabblebaseError::Config(
                "heartbeat_interval must be positive".to_string(),
            ));
        }

        self.base_url()?;
        self.realtime_endpoint()?;
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.dabblebase_url).map_err(|e| {
            DabblebaseError::Config(format!("Invalid dabblebase_url '{}': {e}", self.dabblebase_url))
        })
    }

    /// The configured realtime URL, or the backend URL switched to ws/wss
    /// with the default socket path.
    pub fn realtime_endpoint(&self) -> Result<Url> {
        match &self.realtime_url {
            Some(realtime_url) => Url::parse(realtime_url).map_err(|e| {
                DabblebaseError::Config(format!("Invalid realtime_url '{realtime_url}': {e}"))
            }),
            None => http_to_ws_endpoint(&self.base_url()?),
        }
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval.unwrap_or(HEARTBEAT_INTERVAL))
    }
}
