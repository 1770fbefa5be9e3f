// File: chirpbot-core/src/platforms/twitch/session.rs

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::Error;
use crate::platforms::SessionManager;

/// The live token table the Helix client and the EventSub runtime draw from.
/// Keyed by Twitch user id; registering a user again replaces its token.
/// Refresh tokens stay in the credential store.
#[derive(Default)]
pub struct TwitchSession {
    access_tokens: DashMap<String, String>,
}

impl TwitchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn access_token_for(&self, user_id: &str) -> Option<String> {
        self.access_tokens.get(user_id).map(|t| t.value().clone())
    }
}

#[async_trait]
impl SessionManager for TwitchSession {
    async fn register_credential(
        &self,
        user_id: &str,
        access_token: &str,
        _refresh_token: &str,
    ) -> Result<(), Error> {
        let replaced = self
            .access_tokens
            .insert(user_id.to_string(), access_token.to_string())
            .is_some();
        debug!("session: registered token for user_id={} (replaced={})", user_id, replaced);
        Ok(())
    }
}
