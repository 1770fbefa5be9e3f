use serde::{Deserialize, Serialize};

/// A user-defined chat command (e.g. `!lurk`) answered with fixed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicCommand {
    pub command_name: String,
    pub response_text: String,
}

impl DynamicCommand {
    pub fn new(command_name: impl Into<String>, response_text: impl Into<String>) -> Self {
        Self {
            command_name: command_name.into(),
            response_text: response_text.into(),
        }
    }
}
