// File: chirpbot-core/src/platforms/twitch_eventsub/mod.rs

pub mod events;
pub mod runtime;
pub mod subscriptions;

pub use runtime::TwitchEventSubPlatform;
pub use subscriptions::{SubscriptionDescriptor, SubscriptionKind};
