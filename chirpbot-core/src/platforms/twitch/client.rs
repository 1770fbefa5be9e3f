// File: chirpbot-core/src/platforms/twitch/client.rs

use std::sync::Arc;
use reqwest::Client as ReqwestClient;

use crate::Error;
use crate::platforms::twitch::session::TwitchSession;

pub const HELIX_BASE_URL: &str = "https://api.twitch.tv/helix";

/// A small wrapper client for calling Helix endpoints as the bot user.
///
/// Tokens are never cached here; every request pulls the current access token
/// for `bot_user_id` from the session so a refresh takes effect immediately.
#[derive(Clone)]
pub struct TwitchHelixClient {
    http: ReqwestClient,
    client_id: String,
    bot_user_id: String,
    session: Arc<TwitchSession>,
    base_url: String,
}

impl TwitchHelixClient {
    pub fn new(client_id: &str, bot_user_id: &str, session: Arc<TwitchSession>) -> Self {
        Self {
            http: ReqwestClient::new(),
            client_id: client_id.to_string(),
            bot_user_id: bot_user_id.to_string(),
            session,
            base_url: HELIX_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn bot_user_id(&self) -> &str {
        &self.bot_user_id
    }

    pub(crate) fn http_client(&self) -> &ReqwestClient {
        &self.http
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// The bot's current access token, or `Error::Platform` if it never registered.
    pub(crate) fn bearer_token(&self) -> Result<String, Error> {
        self.session.access_token_for(&self.bot_user_id).ok_or_else(|| {
            Error::Platform(format!("no token registered for bot user_id={}", self.bot_user_id))
        })
    }
}
