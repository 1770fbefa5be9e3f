// File: chirpbot-core/src/platforms/twitch_eventsub/events/chat.rs

use serde::Deserialize;

/// "channel.chat.message" event
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelChatMessage {
    pub broadcaster_user_id: String,
    pub broadcaster_user_login: String,
    pub broadcaster_user_name: String,
    pub chatter_user_id: String,
    pub chatter_user_login: String,
    pub chatter_user_name: String,
    pub message_id: String,
    pub message: ChatMessageBody,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub badges: Vec<ChatBadge>,
    #[serde(default)]
    pub message_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessageBody {
    pub text: String,
    #[serde(default)]
    pub fragments: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatBadge {
    pub set_id: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub info: String,
}

impl ChannelChatMessage {
    pub fn text(&self) -> &str {
        &self.message.text
    }

    pub fn has_badge(&self, set_id: &str) -> bool {
        self.badges.iter().any(|b| b.set_id == set_id)
    }

    /// `@name`, the way chat renders a mention.
    pub fn chatter_mention(&self) -> String {
        format!("@{}", self.chatter_user_name)
    }
}
