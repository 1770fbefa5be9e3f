// File: chirpbot-core/src/platforms/twitch_eventsub/subscriptions.rs

use serde_json::{json, Value};

/// The push-event feeds this bot listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKind {
    ChatMessage,
    StreamOnline,
}

impl SubscriptionKind {
    pub fn event_type(&self) -> &'static str {
        match self {
            SubscriptionKind::ChatMessage => "channel.chat.message",
            SubscriptionKind::StreamOnline => "stream.online",
        }
    }

    pub fn version(&self) -> &'static str {
        "1"
    }
}

/// One feed, scoped to a broadcaster (and, for chat, the reading user).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionDescriptor {
    pub kind: SubscriptionKind,
    pub broadcaster_user_id: String,
    pub user_id: Option<String>,
}

impl SubscriptionDescriptor {
    /// Chat in `broadcaster_user_id`'s channel, read as `bot_user_id`.
    pub fn chat_message(broadcaster_user_id: &str, bot_user_id: &str) -> Self {
        Self {
            kind: SubscriptionKind::ChatMessage,
            broadcaster_user_id: broadcaster_user_id.to_string(),
            user_id: Some(bot_user_id.to_string()),
        }
    }

    pub fn stream_online(broadcaster_user_id: &str) -> Self {
        Self {
            kind: SubscriptionKind::StreamOnline,
            broadcaster_user_id: broadcaster_user_id.to_string(),
            user_id: None,
        }
    }

    /// The `condition` object Helix expects for this subscription type.
    pub fn condition(&self) -> Value {
        match &self.user_id {
            Some(user_id) => json!({
                "broadcaster_user_id": self.broadcaster_user_id,
                "user_id": user_id
            }),
            None => json!({ "broadcaster_user_id": self.broadcaster_user_id }),
        }
    }
}

/// The default feed set: owner's chat read as the bot, and owner going live.
pub fn default_subscriptions(owner_id: &str, bot_id: &str) -> Vec<SubscriptionDescriptor> {
    vec![
        SubscriptionDescriptor::chat_message(owner_id, bot_id),
        SubscriptionDescriptor::stream_online(owner_id),
    ]
}
