//! chirpbot-server/src/config.rs
//!
//! Command-line flags plus the Twitch application settings read from the
//! environment (a `.env` file is loaded first if present).

use clap::Parser;

use chirpbot_core::Error;
use chirpbot_core::services::builtin_commands::DEFAULT_SOCIALS_LINK;

#[derive(Parser, Debug, Clone)]
#[command(name = "chirpbot")]
#[command(author, version, about = "chirpbot - Twitch chat bot with persistent custom commands")]
pub struct Args {
    /// SQLite file holding OAuth token pairs.
    #[arg(long, default_value = "tokens.db")]
    pub tokens_db: String,

    /// SQLite file holding dynamic command responses.
    #[arg(long, default_value = "responses.db")]
    pub responses_db: String,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// What `!socials` answers with.
    #[arg(long, default_value = DEFAULT_SOCIALS_LINK)]
    pub socials_link: String,

    /// Seconds between credential expiry checks.
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
    pub refresh_interval_secs: u64,

    /// Refresh a token once it expires within this many seconds.
    #[arg(long, default_value_t = 600)]
    pub refresh_margin_secs: u64,
}

pub const ENV_CLIENT_ID: &str = "TWITCH_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "TWITCH_CLIENT_SECRET";
pub const ENV_BOT_ID: &str = "TWITCH_BOT_ID";
pub const ENV_OWNER_ID: &str = "TWITCH_OWNER_ID";
pub const ENV_ACCESS_TOKEN: &str = "TWITCH_ACCESS_TOKEN";
pub const ENV_REFRESH_TOKEN: &str = "TWITCH_REFRESH_TOKEN";

#[derive(Clone)]
pub struct TwitchConfig {
    pub client_id: String,
    pub client_secret: String,
    pub bot_id: String,
    pub owner_id: String,
    /// First-run token pair; persisted like any other once validated.
    pub seed_tokens: Option<(String, String)>,
}

impl std::fmt::Debug for TwitchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitchConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("bot_id", &self.bot_id)
            .field("owner_id", &self.owner_id)
            .field("seed_tokens", &self.seed_tokens.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl TwitchConfig {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| Error::Config(format!("{key} must be set")))
        };

        let seed_tokens = match (get(ENV_ACCESS_TOKEN), get(ENV_REFRESH_TOKEN)) {
            (Some(access), Some(refresh)) => Some((access, refresh)),
            (None, None) => None,
            _ => {
                return Err(Error::Config(format!(
                    "{ENV_ACCESS_TOKEN} and {ENV_REFRESH_TOKEN} must be set together"
                )));
            }
        };

        Ok(Self {
            client_id: require(ENV_CLIENT_ID)?,
            client_secret: require(ENV_CLIENT_SECRET)?,
            bot_id: require(ENV_BOT_ID)?,
            owner_id: require(ENV_OWNER_ID)?,
            seed_tokens,
        })
    }
}
