use super::subject::{Claims, Subject};
use crate::context::ClientContext;
use crate::infrastructure::project_url;
use crate::types::constants::AUTH_TOKEN_COOKIE;
use crate::types::{DabblebaseError, Result};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use url::Url;

const PEM_HEADER: &str = "-----BEGIN PUBLIC KEY-----";
const PEM_FOOTER: &str = "-----END PUBLIC KEY-----";
const PEM_LINE_WIDTH: usize = 64;

/// Sign-in redirects, the `auth-token` cookie and local token verification.
///
/// Sign-in and sign-out are backend-hosted pages: the client only builds
/// their URLs and, in a client environment, navigates there.
#[derive(Clone)]
pub struct AuthClient {
    base_url: Url,
    project_id: String,
    verify_key: Option<String>,
    context: Arc<dyn ClientContext>,
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("base_url", &self.base_url.as_str())
            .field("project_id", &self.project_id)
            .field("verify_key", &self.verify_key.is_some())
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    pub fn new(
        base_url: Url,
        project_id: impl Into<String>,
        verify_key: Option<String>,
        context: Arc<dyn ClientContext>,
    ) -> Self {
        Self {
            base_url,
            project_id: project_id.into(),
            verify_key,
            context,
        }
    }

    /// `{base}/api/project/{id}/auth/{provider}?continue_to=...`
    ///
    /// `continue_to` falls back to the context's current URL and is left out
    /// when neither is known.
    pub fn sign_in_url(&self, provider: &str, continue_to: Option<&str>) -> Result<Url> {
        if provider.is_empty() {
            return Err(DabblebaseError::MissingProvider);
        }
        self.auth_url(provider, continue_to)
    }

    /// `{base}/api/project/{id}/auth/logout?continue_to=...`
    pub fn sign_out_url(&self, continue_to: Option<&str>) -> Result<Url> {
        self.auth_url("logout", continue_to)
    }

    /// Navigates to the provider's sign-in page.
    pub fn sign_in(&self, provider: &str, continue_to: Option<&str>) -> Result<()> {
        self.require_client_environment()?;
        let url = self.sign_in_url(provider, continue_to)?;
        tracing::info!("Signing in with provider {}", provider);
        self.context.navigate(url.as_str())
    }

    /// Drops the stored token and navigates to the sign-out page.
    pub fn sign_out(&self, continue_to: Option<&str>) -> Result<()> {
        self.require_client_environment()?;
        let url = self.sign_out_url(continue_to)?;
        self.context.remove_cookie(AUTH_TOKEN_COOKIE);
        tracing::info!("Signing out");
        self.context.navigate(url.as_str())
    }

    /// The signed-in user's token, read from the `auth-token` cookie.
    pub fn token(&self) -> Option<String> {
        if !self.context.is_client_environment() {
            return None;
        }
        self.context
            .get_cookie(AUTH_TOKEN_COOKIE)
            .filter(|token| !token.is_empty())
    }

    /// Stores `token` in the `auth-token` cookie.
    pub fn store_token(&self, token: &str) {
        self.context.set_cookie(AUTH_TOKEN_COOKIE, token);
    }

    /// Checks the token's RS256 signature against the configured verify key
    /// and returns who it was issued to.
    ///
    /// # Errors
    ///
    /// - [`DabblebaseError::MissingToken`] for `None` or an empty token
    /// - [`DabblebaseError::MissingVerifyKey`] when no key is configured
    /// - [`DabblebaseError::InvalidVerifyKey`] when the key does not parse
    /// - [`DabblebaseError::InvalidToken`] for a bad signature, an expired
    ///   token or missing `sub`
    pub fn verify(&self, token: Option<&str>) -> Result<Subject> {
        let token = match token {
            Some(token) if !token.is_empty() => token,
            _ => return Err(DabblebaseError::MissingToken),
        };

        let key = self.decoding_key()?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.required_spec_claims.clear();
        validation.validate_aud = false;

        let data = jsonwebtoken::decode::<Claims>(token, &key, &validation).map_err(|e| {
            tracing::debug!("Token verification failed: {}", e);
            DabblebaseError::InvalidToken(e)
        })?;

        Ok(data.claims.into())
    }

    /// Verifies the token stored in the `auth-token` cookie.
    pub fn verify_current(&self) -> Result<Subject> {
        self.verify(self.token().as_deref())
    }

    fn decoding_key(&self) -> Result<DecodingKey> {
        let verify_key = self
            .verify_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(DabblebaseError::MissingVerifyKey)?;

        DecodingKey::from_rsa_pem(to_pem(verify_key).as_bytes())
            .map_err(|e| DabblebaseError::InvalidVerifyKey(e.to_string()))
    }

    fn auth_url(&self, route: &str, continue_to: Option<&str>) -> Result<Url> {
        let mut url = project_url(&self.base_url, &self.project_id, ["auth", route])?;

        let continue_to = continue_to
            .map(str::to_string)
            .or_else(|| self.context.current_url());
        if let Some(continue_to) = continue_to {
            url.query_pairs_mut()
                .append_pair("continue_to", &continue_to);
        }
        Ok(url)
    }

    fn require_client_environment(&self) -> Result<()> {
        if self.context.is_client_environment() {
            Ok(())
        } else {
            Err(DabblebaseError::NotClientEnvironment)
        }
    }
}

/// Wraps a bare base64 key body in PEM armor. Keys that are already PEM are
/// passed through.
fn to_pem(key: &str) -> String {
    let key = key.trim();
    if key.starts_with("-----BEGIN") {
        return key.to_string();
    }

    let body: String = key.split_whitespace().collect();
    let mut pem = String::with_capacity(body.len() + 64);
    pem.push_str(PEM_HEADER);
    pem.push('\n');
    for line in body.as_bytes().chunks(PEM_LINE_WIDTH) {
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str(PEM_FOOTER);
    pem.push('\n');
    pem
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{HeadlessContext, MemoryContext};

    fn client(context: Arc<dyn ClientContext>) -> AuthClient {
        AuthClient::new(
            Url::parse("https://db.example.com").unwrap(),
            "p1",
            None,
            context,
        )
    }

    #[test]
    fn test_sign_in_url() {
        let auth = client(Arc::new(HeadlessContext));
        let url = auth
            .sign_in_url("github", Some("https://app.example.com/home?x=1"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://db.example.com/api/project/p1/auth/github?continue_to=https%3A%2F%2Fapp.example.com%2Fhome%3Fx%3D1"
        );

        assert!(matches!(
            auth.sign_in_url("", None),
            Err(DabblebaseError::MissingProvider)
        ));
    }

    #[test]
    fn test_continue_to_defaults_to_current_url() {
        let auth = client(Arc::new(
            MemoryContext::new().with_current_url("https://app.example.com/page"),
        ));
        let url = auth.sign_out_url(None).unwrap();
        assert_eq!(
            url.as_str(),
            "https://db.example.com/api/project/p1/auth/logout?continue_to=https%3A%2F%2Fapp.example.com%2Fpage"
        );

        let auth = client(Arc::new(HeadlessContext));
        assert_eq!(
            auth.sign_out_url(None).unwrap().as_str(),
            "https://db.example.com/api/project/p1/auth/logout"
        );
    }

    #[test]
    fn test_sign_in_requires_client_environment() {
        let auth = client(Arc::new(HeadlessContext));
        assert!(matches!(
            auth.sign_in("github", None),
            Err(DabblebaseError::NotClientEnvironment)
        ));
    }

    #[test]
    fn test_sign_out_clears_token_and_navigates() {
        let context = Arc::new(MemoryContext::from_cookie_header("auth-token=abc"));
        let auth = client(context.clone());
        assert_eq!(auth.token().as_deref(), Some("abc"));

        auth.sign_out(Some("https://app.example.com")).unwrap();

        assert_eq!(auth.token(), None);
        assert_eq!(
            context.navigations(),
            vec!["https://db.example.com/api/project/p1/auth/logout?continue_to=https%3A%2F%2Fapp.example.com"]
        );
    }

    #[test]
    fn test_verify_missing_token_and_key() {
        let auth = client(Arc::new(HeadlessContext));
        assert!(matches!(auth.verify(None), Err(DabblebaseError::MissingToken)));
        assert!(matches!(auth.verify(Some("")), Err(DabblebaseError::MissingToken)));
        assert!(matches!(
            auth.verify(Some("a.b.c")),
            Err(DabblebaseError::MissingVerifyKey)
        ));
    }

    #[test]
    fn test_verify_rejects_unparsable_key() {
        let auth = AuthClient::new(
            Url::parse("https://db.example.com").unwrap(),
            "p1",
            Some("not-a-key".to_string()),
            Arc::new(HeadlessContext),
        );
        assert!(matches!(
            auth.verify(Some("a.b.c")),
            Err(DabblebaseError::InvalidVerifyKey(_))
        ));
    }

    #[test]
    fn test_to_pem_wraps_lines() {
        let body = "A".repeat(100);
        let pem = to_pem(&body);
        let lines: Vec<&str> = pem.lines().collect();
        assert_eq!(lines[0], PEM_HEADER);
        assert_eq!(lines[1].len(), 64);
        assert_eq!(lines[2].len(), 36);
        assert_eq!(lines[3], PEM_FOOTER);

        let armored = format!("{PEM_HEADER}\nABC\n{PEM_FOOTER}");
        assert_eq!(to_pem(&armored), armored);
    }
}
