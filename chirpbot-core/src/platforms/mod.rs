// File: src/platforms/mod.rs
//
// Seams between the core and the streaming platform. The core only talks to
// these traits; `twitch` and `twitch_eventsub` hold the concrete adapters.

use async_trait::async_trait;
use chirpbot_common::models::{TokenPair, ValidatedIdentity};
use crate::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Subscribed,
    Reconnecting,
}

/// Checks a token pair against the platform's identity service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityValidator: Send + Sync {
    async fn validate(&self, access_token: &str, refresh_token: &str) -> Result<ValidatedIdentity, Error>;
}

/// The live session that issues authenticated requests on behalf of users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionManager: Send + Sync {
    async fn register_credential(
        &self,
        user_id: &str,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<(), Error>;
}

/// Trades a refresh token for a new access/refresh pair.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, Error>;
}

/// Outgoing chat.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_chat_message(
        &self,
        broadcaster_id: &str,
        text: &str,
        reply_to_message_id: Option<&str>,
    ) -> Result<(), Error>;
}

pub mod twitch;
pub mod twitch_eventsub;
