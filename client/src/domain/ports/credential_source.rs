//! Port supplying credentials for gateway requests.
//!
//! Identity stays implicit: gateways attach whatever the source hands out and
//! the backend scopes every call to that user.

/// Source of the bearer token attached to outbound requests.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialSource: Send + Sync {
    /// Current bearer token, or `None` when signed out.
    fn bearer_token(&self) -> Option<String>;
}

/// Credential source holding a fixed token.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    /// Source that always hands out `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Source for signed-out sessions.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl CredentialSource for StaticCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}
