use serde::{Deserialize, Serialize};

/// Identity proven by a verified auth token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// The token's `sub` claim
    pub id: String,
}

/// Claims read from an auth token. Only `sub` is needed; `exp` is checked by
/// the validator when present.
#[derive(Debug, Deserialize)]
pub(crate) struct Claims {
    pub sub: String,
}

impl From<Claims> for Subject {
    fn from(claims: Claims) -> Self {
        Self { id: claims.sub }
    }
}
