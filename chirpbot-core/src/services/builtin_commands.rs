// File: chirpbot-core/src/services/builtin_commands.rs
//! Built-in chat commands. These always shadow a dynamic command of the same
//! name; `lookup_builtin` is the single name -> handler table.

use crate::Error;
use crate::platforms::twitch_eventsub::events::ChannelChatMessage;
use crate::services::response_store::ResponseStore;

pub const DEFAULT_SOCIALS_LINK: &str = "https://bsky.app/profile/tcurls.net";

pub const ADD_COMMAND_USAGE: &str = "Usage: !addcommand <name> <response>";
pub const ADD_COMMAND_FAILED: &str = "Failed to add command! :(";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinCommand {
    Greet,
    Socials,
    AddCommand,
}

const BUILTIN_TABLE: &[(&str, BuiltinCommand)] = &[
    ("hi", BuiltinCommand::Greet),
    ("hello", BuiltinCommand::Greet),
    ("howdy", BuiltinCommand::Greet),
    ("hey", BuiltinCommand::Greet),
    ("socials", BuiltinCommand::Socials),
    ("addcommand", BuiltinCommand::AddCommand),
];

pub fn lookup_builtin(command_name: &str) -> Option<BuiltinCommand> {
    BUILTIN_TABLE
        .iter()
        .find(|(name, _)| *name == command_name)
        .map(|(_, cmd)| *cmd)
}

pub fn handle_greet(msg: &ChannelChatMessage) -> String {
    format!("Hello {}!", msg.chatter_mention())
}

pub fn handle_socials(socials_link: &str) -> String {
    socials_link.to_string()
}

/// `!addcommand <name> <response...>`; the caller has already checked the
/// invoker's tier.
pub async fn handle_add_command(store: &ResponseStore, args: &str) -> Result<String, Error> {
    let (name, response) = match args.trim().split_once(char::is_whitespace) {
        Some((name, response)) => (name, response.trim()),
        None => return Err(Error::Validation("missing command response".into())),
    };

    store.set_response(name, response).await?;
    Ok(format!("Added command !{name}"))
}
