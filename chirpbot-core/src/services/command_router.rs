// File: chirpbot-core/src/services/command_router.rs

use std::sync::Arc;
use tracing::{debug, warn};

use crate::Error;
use crate::platforms::twitch_eventsub::events::ChannelChatMessage;
use crate::services::builtin_commands::{
    self, BuiltinCommand, ADD_COMMAND_FAILED, ADD_COMMAND_USAGE, DEFAULT_SOCIALS_LINK,
};
use crate::services::response_store::ResponseStore;

pub const COMMAND_PREFIX: char = '!';

/// `!name rest of line` split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation<'a> {
    pub command_name: &'a str,
    pub remainder: &'a str,
}

/// Returns `None` for anything that is not a command.
pub fn parse_invocation(text: &str) -> Option<Invocation<'_>> {
    let body = text.trim_start().strip_prefix(COMMAND_PREFIX)?;
    let (command_name, remainder) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body.trim_end(), ""),
    };
    if command_name.is_empty() {
        return None;
    }
    Some(Invocation { command_name, remainder })
}

/// What the bot says back, and which message (if any) it threads under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub text: String,
    pub reply_to: Option<String>,
}

impl CommandReply {
    fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), reply_to: None }
    }

    fn threaded(text: impl Into<String>, msg: &ChannelChatMessage) -> Self {
        Self { text: text.into(), reply_to: Some(msg.message_id.clone()) }
    }
}

#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Treated as elevated regardless of badges.
    pub owner_user_id: Option<String>,
    pub socials_link: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            owner_user_id: None,
            socials_link: DEFAULT_SOCIALS_LINK.to_string(),
        }
    }
}

/// Resolves chat lines to built-ins first, then dynamic responses.
pub struct CommandRouter {
    store: Arc<ResponseStore>,
    config: RouterConfig,
}

impl CommandRouter {
    pub fn new(store: Arc<ResponseStore>, config: RouterConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<ResponseStore> {
        &self.store
    }

    /// Broadcaster, moderator, or the configured owner.
    pub fn is_elevated(&self, msg: &ChannelChatMessage) -> bool {
        msg.chatter_user_id == msg.broadcaster_user_id
            || msg.has_badge("broadcaster")
            || msg.has_badge("moderator")
            || self.config.owner_user_id.as_deref() == Some(msg.chatter_user_id.as_str())
    }

    /// `Ok(None)` means stay silent.
    pub async fn route(&self, msg: &ChannelChatMessage) -> Result<Option<CommandReply>, Error> {
        let Some(inv) = parse_invocation(msg.text()) else {
            return Ok(None);
        };

        let Some(builtin) = builtin_commands::lookup_builtin(inv.command_name) else {
            return Ok(self.store.get_response(inv.command_name).map(CommandReply::plain));
        };

        debug!("builtin !{} from {}", inv.command_name, msg.chatter_user_login);
        match builtin {
            BuiltinCommand::Greet => Ok(Some(CommandReply::threaded(
                builtin_commands::handle_greet(msg),
                msg,
            ))),
            BuiltinCommand::Socials => Ok(Some(CommandReply::plain(
                builtin_commands::handle_socials(&self.config.socials_link),
            ))),
            BuiltinCommand::AddCommand => Ok(Some(self.add_command(msg, inv.remainder).await)),
        }
    }

    async fn add_command(&self, msg: &ChannelChatMessage, args: &str) -> CommandReply {
        let result = if self.is_elevated(msg) {
            builtin_commands::handle_add_command(&self.store, args).await
        } else {
            Err(Error::Authorization(format!(
                "{} may not add commands",
                msg.chatter_user_login
            )))
        };

        match result {
            Ok(text) => CommandReply::threaded(text, msg),
            Err(Error::Authorization(reason)) => {
                debug!("denied !addcommand: {}", reason);
                CommandReply::threaded(
                    format!("Sorry {}, only moderators can add commands.", msg.chatter_mention()),
                    msg,
                )
            }
            Err(Error::Validation(reason)) => {
                debug!("rejected !addcommand '{}': {}", args, reason);
                CommandReply::threaded(ADD_COMMAND_USAGE, msg)
            }
            Err(e) => {
                warn!("Failed to add command '{}': {}", args, e);
                CommandReply::threaded(ADD_COMMAND_FAILED, msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{chat_message_from, sample_chat_message, FlakyResponseRepository, TEST_BROADCASTER_ID};

    fn router() -> (CommandRouter, Arc<FlakyResponseRepository>) {
        let repo = Arc::new(FlakyResponseRepository::new());
        let store = Arc::new(ResponseStore::new(repo.clone()));
        let config = RouterConfig { owner_user_id: Some("42".into()), ..RouterConfig::default() };
        (CommandRouter::new(store, config), repo)
    }

    #[test]
    fn parse_splits_name_and_trimmed_remainder() {
        assert_eq!(
            parse_invocation("!addcommand lurk  see you later  "),
            Some(Invocation { command_name: "addcommand", remainder: "lurk  see you later" })
        );
        assert_eq!(
            parse_invocation("!hi"),
            Some(Invocation { command_name: "hi", remainder: "" })
        );
        assert_eq!(parse_invocation("hello there"), None);
        assert_eq!(parse_invocation("!"), None);
        assert_eq!(parse_invocation("! hi"), None);
    }

    #[test]
    fn elevation_rules() {
        let (router, _) = router();
        assert!(router.is_elevated(&sample_chat_message("!x", &["moderator"])));
        assert!(router.is_elevated(&sample_chat_message("!x", &["broadcaster"])));
        assert!(router.is_elevated(&chat_message_from(TEST_BROADCASTER_ID, "Streamer", "!x", &[])));
        assert!(router.is_elevated(&chat_message_from("42", "Owner", "!x", &[])));
        assert!(!router.is_elevated(&sample_chat_message("!x", &["vip", "subscriber"])));
    }

    #[tokio::test]
    async fn greet_aliases_thread_under_the_invocation() -> Result<(), Error> {
        let (router, _) = router();
        for alias in ["!hi", "!hello", "!howdy", "!hey"] {
            let msg = sample_chat_message(alias, &[]);
            let reply = router.route(&msg).await?.expect("greet replies");
            assert_eq!(reply.text, "Hello @viewer!");
            assert_eq!(reply.reply_to.as_deref(), Some(msg.message_id.as_str()));
        }
        Ok(())
    }

    #[tokio::test]
    async fn socials_uses_configured_link() -> Result<(), Error> {
        let (router, _) = router();
        let reply = router.route(&sample_chat_message("!socials", &[])).await?;
        assert_eq!(reply.map(|r| r.text).as_deref(), Some(DEFAULT_SOCIALS_LINK));
        Ok(())
    }

    #[tokio::test]
    async fn builtins_shadow_dynamic_commands() -> Result<(), Error> {
        let (router, _) = router();
        router.store().set_response("hi", "shadowed").await?;

        let reply = router.route(&sample_chat_message("!hi", &[])).await?.expect("reply");
        assert_eq!(reply.text, "Hello @viewer!");
        Ok(())
    }

    #[tokio::test]
    async fn unknown_command_is_silent() -> Result<(), Error> {
        let (router, _) = router();
        assert_eq!(router.route(&sample_chat_message("!nonexistent", &[])).await?, None);
        assert_eq!(router.route(&sample_chat_message("just chatting", &[])).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn storage_failure_on_add_reports_failure() -> Result<(), Error> {
        let (router, repo) = router();
        repo.fail_writes(true);

        let reply = router
            .route(&sample_chat_message("!addcommand foo bar", &["moderator"]))
            .await?
            .expect("reply");
        assert_eq!(reply.text, ADD_COMMAND_FAILED);
        assert_eq!(router.store().get_response("foo"), None);
        Ok(())
    }
}
