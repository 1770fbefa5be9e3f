// File: src/services/mod.rs

pub mod bot_context;
pub mod builtin_commands;
pub mod command_router;
pub mod event_dispatcher;
pub mod response_store;

pub use bot_context::BotContext;
pub use builtin_commands::BuiltinCommand;
pub use command_router::{parse_invocation, CommandReply, CommandRouter, Invocation, RouterConfig};
pub use event_dispatcher::EventDispatcher;
pub use response_store::ResponseStore;
