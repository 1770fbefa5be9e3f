// File: chirpbot-common/src/models/mod.rs
pub mod command;
pub mod credential;

pub use command::DynamicCommand;
pub use credential::{CredentialRecord, TokenPair, ValidatedIdentity};
