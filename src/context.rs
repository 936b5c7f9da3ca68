//! Host environment seen by the clients: cookies, the current page and
//! navigation.
//!
//! A browser-like embedder implements [`ClientContext`] on top of the real
//! host. Servers and CLIs use [`HeadlessContext`]; tests use
//! [`MemoryContext`].

use crate::types::{DabblebaseError, Result};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// Access to the host environment.
pub trait ClientContext: Send + Sync {
    fn get_cookie(&self, name: &str) -> Option<String>;

    fn set_cookie(&self, name: &str, value: &str);

    fn remove_cookie(&self, name: &str);

    /// Whether cookies and navigation are backed by a real client (a browser
    /// page or something standing in for one).
    fn is_client_environment(&self) -> bool;

    /// Address of the page the user is on, if there is one.
    fn current_url(&self) -> Option<String>;

    /// Sends the user to `url`.
    fn navigate(&self, url: &str) -> Result<()>;
}

/// Context for code running without a client: no cookies, no navigation.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessContext;

impl ClientContext for HeadlessContext {
    fn get_cookie(&self, _name: &str) -> Option<String> {
        None
    }

    fn set_cookie(&self, name: &str, _value: &str) {
        tracing::debug!("Ignoring cookie '{}' in headless context", name);
    }

    fn remove_cookie(&self, _name: &str) {}

    fn is_client_environment(&self) -> bool {
        false
    }

    fn current_url(&self) -> Option<String> {
        None
    }

    fn navigate(&self, _url: &str) -> Result<()> {
        Err(DabblebaseError::NotClientEnvironment)
    }
}

/// In-memory cookie jar with a recorded navigation history.
#[derive(Debug)]
pub struct MemoryContext {
    cookies: RwLock<BTreeMap<String, String>>,
    navigations: RwLock<Vec<String>>,
    client_environment: bool,
    current_url: Option<String>,
}

impl Default for MemoryContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContext {
    /// An empty jar that acts as a client environment.
    pub fn new() -> Self {
        Self {
            cookies: RwLock::new(BTreeMap::new()),
            navigations: RwLock::new(Vec::new()),
            client_environment: true,
            current_url: None,
        }
    }

    /// Seeds the jar from a `Cookie` request header (`a=1; b=2`).
    /// Malformed pairs are skipped.
    pub fn from_cookie_header(header: &str) -> Self {
        let context = Self::new();
        {
            let mut cookies = context
                .cookies
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            for parsed in cookie::Cookie::split_parse(header) {
                match parsed {
                    Ok(cookie) => {
                        cookies.insert(cookie.name().to_string(), cookie.value().to_string());
                    }
                    Err(e) => tracing::debug!("Skipping malformed cookie: {}", e),
                }
            }
        }
        context
    }

    pub fn with_client_environment(mut self, client_environment: bool) -> Self {
        self.client_environment = client_environment;
        self
    }

    pub fn with_current_url(mut self, url: impl Into<String>) -> Self {
        self.current_url = Some(url.into());
        self
    }

    /// The jar rendered as a `Cookie` header value, or `None` when empty.
    pub fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookies.read().unwrap_or_else(PoisonError::into_inner);
        if cookies.is_empty() {
            return None;
        }

        let header = cookies
            .iter()
            .map(|(name, value)| cookie::Cookie::new(name.as_str(), value.as_str()).to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Some(header)
    }

    /// Every URL passed to `navigate`, oldest first.
    pub fn navigations(&self) -> Vec<String> {
        self.navigations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ClientContext for MemoryContext {
    fn get_cookie(&self, name: &str) -> Option<String> {
        self.cookies
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn set_cookie(&self, name: &str, value: &str) {
        self.cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
    }

    fn remove_cookie(&self, name: &str) {
        self.cookies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }

    fn is_client_environment(&self) -> bool {
        self.client_environment
    }

    fn current_url(&self) -> Option<String> {
        self.current_url.clone()
    }

    fn navigate(&self, url: &str) -> Result<()> {
        if !self.client_environment {
            return Err(DabblebaseError::NotClientEnvironment);
        }

        tracing::debug!("Navigating to {}", url);
        self.navigations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        Ok(())
    }
}
