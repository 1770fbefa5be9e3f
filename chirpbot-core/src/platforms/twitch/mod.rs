// File: chirpbot-core/src/platforms/twitch/mod.rs

pub mod auth;
pub mod client;
pub mod requests;
pub mod session;

pub use auth::TwitchAuthenticator;
pub use client::TwitchHelixClient;
pub use session::TwitchSession;
