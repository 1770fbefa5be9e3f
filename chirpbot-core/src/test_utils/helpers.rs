// File: chirpbot-core/src/test_utils/helpers.rs

use chirpbot_common::models::ValidatedIdentity;

use crate::db::Database;
use crate::platforms::twitch_eventsub::events::{ChannelChatMessage, ChatBadge, ChatMessageBody};
use crate::Error;

pub const TEST_BROADCASTER_ID: &str = "1001";
pub const TEST_CHATTER_ID: &str = "2002";
pub const TEST_BOT_ID: &str = "3003";

/// A `channel.chat.message` from `viewer` in `streamer`'s channel, carrying
/// the given badge set ids.
pub fn sample_chat_message(text: &str, badges: &[&str]) -> ChannelChatMessage {
    chat_message_from(TEST_CHATTER_ID, "viewer", text, badges)
}

pub fn chat_message_from(
    chatter_user_id: &str,
    chatter_name: &str,
    text: &str,
    badges: &[&str],
) -> ChannelChatMessage {
    ChannelChatMessage {
        broadcaster_user_id: TEST_BROADCASTER_ID.to_string(),
        broadcaster_user_login: "streamer".to_string(),
        broadcaster_user_name: "Streamer".to_string(),
        chatter_user_id: chatter_user_id.to_string(),
        chatter_user_login: chatter_name.to_lowercase(),
        chatter_user_name: chatter_name.to_string(),
        message_id: format!("msg-{}", text.len()),
        message: ChatMessageBody {
            text: text.to_string(),
            fragments: Vec::new(),
        },
        color: String::new(),
        badges: badges
            .iter()
            .map(|set_id| ChatBadge {
                set_id: set_id.to_string(),
                id: "1".to_string(),
                info: String::new(),
            })
            .collect(),
        message_type: "text".to_string(),
    }
}

pub fn identity_for(user_id: &str) -> ValidatedIdentity {
    ValidatedIdentity {
        user_id: user_id.to_string(),
        login: format!("user{user_id}"),
        client_id: "test-client".to_string(),
        scopes: vec!["user:read:chat".to_string(), "user:write:chat".to_string()],
        expires_in: Some(14_400),
    }
}

/// A fresh in-memory database.
pub async fn memory_db() -> Result<Database, Error> {
    Database::in_memory().await
}
