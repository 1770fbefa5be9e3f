// File: chirpbot-core/src/platforms/twitch_eventsub/events/mod.rs

pub mod base;
pub mod chat;
pub mod stream_online;

pub use base::{EventSubNotificationEnvelope, SubscriptionData};
pub use chat::{ChannelChatMessage, ChatBadge, ChatMessageBody};
pub use stream_online::StreamOnline;

use tracing::warn;
use crate::eventbus::BotEvent;

/// Helper function to parse from JSON into a known event type. Returns None if unknown
/// or malformed.
pub fn parse_twitch_notification(
    sub_type: &str,
    event_json: &serde_json::Value,
) -> Option<BotEvent> {
    let parsed = match sub_type {
        "channel.chat.message" => serde_json::from_value::<ChannelChatMessage>(event_json.clone())
            .map(BotEvent::ChatMessage),
        "stream.online" => serde_json::from_value::<StreamOnline>(event_json.clone())
            .map(BotEvent::StreamOnline),
        _ => return None,
    };

    match parsed {
        Ok(evt) => Some(evt),
        Err(e) => {
            warn!("could not parse {} notification: {}", sub_type, e);
            None
        }
    }
}
