//! Explicit credential context for outbound calls.

/// Bearer credential attached to catalog and ledger requests.
///
/// Session issuance is out of scope; the calling context obtains a token and
/// hands it in at construction time rather than clients reading ambient
/// storage mid-flow.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    token: Option<String>,
}

impl AuthContext {
    /// Creates a context carrying a bearer token.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Creates a context with no credential (public endpoints).
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Returns the `Authorization` header value, if a token is present.
    pub fn authorization_header(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }
}
