// File: chirpbot-core/src/platforms/twitch/auth.rs

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use chirpbot_common::models::{TokenPair, ValidatedIdentity};
use crate::Error;
use crate::platforms::{IdentityValidator, TokenRefresher};

pub const VALIDATE_URL: &str = "https://id.twitch.tv/oauth2/validate";
pub const TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

#[derive(Deserialize)]
struct TwitchTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// For /validate
#[derive(Debug, Deserialize)]
pub(crate) struct TwitchValidateResponse {
    client_id: String,
    login: String,
    user_id: String,
    #[serde(default)]
    scopes: Vec<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl From<TwitchValidateResponse> for ValidatedIdentity {
    fn from(v: TwitchValidateResponse) -> Self {
        ValidatedIdentity {
            user_id: v.user_id,
            login: v.login,
            client_id: v.client_id,
            scopes: v.scopes,
            expires_in: v.expires_in,
        }
    }
}

/// Talks to `id.twitch.tv`: validates token pairs and trades refresh tokens.
pub struct TwitchAuthenticator {
    pub client_id: String,
    pub client_secret: Option<String>,
    http: ReqwestClient,
    validate_url: String,
    token_url: String,
}

impl TwitchAuthenticator {
    pub fn new(client_id: String, client_secret: Option<String>) -> Self {
        Self {
            client_id,
            client_secret,
            http: ReqwestClient::new(),
            validate_url: VALIDATE_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
        }
    }

    /// Point the authenticator at other endpoints (local mock servers).
    pub fn with_endpoints(mut self, validate_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.validate_url = validate_url.into();
        self.token_url = token_url.into();
        self
    }
}

#[async_trait]
impl IdentityValidator for TwitchAuthenticator {
    async fn validate(&self, access_token: &str, _refresh_token: &str) -> Result<ValidatedIdentity, Error> {
        let response = self
            .http
            .get(&self.validate_url)
            .header("Authorization", format!("OAuth {}", access_token))
            .send()
            .await
            .map_err(|e| Error::Validation(format!("Error calling /validate: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Validation("token rejected by /validate (401)".into()));
        }
        if !status.is_success() {
            return Err(Error::Validation(format!("Failed to validate token: HTTP {status}")));
        }

        let validate: TwitchValidateResponse = response
            .json()
            .await
            .map_err(|e| Error::Validation(format!("Error parsing /validate response: {e}")))?;

        if validate.client_id != self.client_id {
            warn!(
                "token for login={} was issued to client_id={}, not ours",
                validate.login, validate.client_id
            );
        }

        debug!("/validate returned login={} user_id={}", validate.login, validate.user_id);
        Ok(validate.into())
    }
}

#[async_trait]
impl TokenRefresher for TwitchAuthenticator {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, Error> {
        let params = [
            ("client_id", self.client_id.clone()),
            ("client_secret", self.client_secret.clone().unwrap_or_default()),
            ("refresh_token", refresh_token.to_string()),
            ("grant_type", "refresh_token".to_string()),
        ];

        let resp = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::Validation(format!("HTTP error refreshing token: {e}")))?
            .error_for_status()
            .map_err(|e| Error::Validation(format!("Twitch token endpoint error: {e}")))?
            .json::<TwitchTokenResponse>()
            .await
            .map_err(|e| Error::Validation(format!("Parse error on token JSON: {e}")))?;

        Ok(TokenPair {
            access_token: resp.access_token,
            // Twitch may omit the refresh token when it did not rotate it.
            refresh_token: resp.refresh_token.unwrap_or_else(|| refresh_token.to_string()),
            expires_in: resp.expires_in,
        })
    }
}
