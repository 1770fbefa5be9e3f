use std::fmt;
use serde::{Deserialize, Serialize};

/// One persisted OAuth token pair, keyed by the platform user id it belongs to.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

// Tokens never end up in logs.
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("user_id", &self.user_id)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// A fresh access/refresh pair, as returned by the token endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the new access token in seconds, if the endpoint said.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenPair { <redacted> }")
    }
}

/// What the identity service tells us about a token pair it accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatedIdentity {
    pub user_id: String,
    pub login: String,
    pub client_id: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Seconds until the access token expires, when the upstream reports it.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_tokens() {
        let rec = CredentialRecord {
            user_id: "1337".into(),
            access_token: "secret-access".into(),
            refresh_token: "secret-refresh".into(),
        };
        let out = format!("{rec:?}");
        assert!(out.contains("1337"));
        assert!(!out.contains("secret-access"));
        assert!(!out.contains("secret-refresh"));
    }
}
