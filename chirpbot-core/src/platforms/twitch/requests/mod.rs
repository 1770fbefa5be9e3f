// File: chirpbot-core/src/platforms/twitch/requests/mod.rs

pub mod chat;
pub mod eventsub;
